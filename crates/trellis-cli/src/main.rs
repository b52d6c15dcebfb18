//! Trellis CLI - Command line interface for the knowledge graph engine

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{call, completions, graph, io, node, rel};
use config::Settings;
use output::OutputFormat;
use trellis_service::GraphService;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(author, version, about = "Knowledge graph engine with traversal, path finding and vector search")]
pub struct Cli {
    /// Data directory holding the persisted graph
    #[arg(short, long, global = true, env = "TRELLIS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file (default: platform config directory)
    #[arg(short, long, global = true, env = "TRELLIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::default_config_path)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage nodes
    Node(node::NodeArgs),
    /// Manage relationships
    Rel(rel::RelArgs),
    /// Breadth-first traversal from a node
    Traverse(graph::TraverseArgs),
    /// Find paths between two nodes
    Path(graph::PathArgs),
    /// Rank nodes by vector similarity
    Search(graph::SearchArgs),
    /// Show node and relationship counts
    Stats,
    /// Export the graph to a file
    Export(io::ExportArgs),
    /// Import a graph file
    Import(io::ImportArgs),
    /// Run a raw JSON request against the service
    Call(call::CallArgs),
    /// Manage CLI configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context wrapping a file-persisted graph service
pub struct AppContext {
    pub service: GraphService,
    pub format: OutputFormat,
}

impl AppContext {
    /// Load settings, open the data directory and initialize the service
    pub async fn open(cli: &Cli) -> anyhow::Result<Self> {
        let settings = Settings::load(&cli.config_path())?;
        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| settings.data_dir.clone())
            .unwrap_or_else(config::default_data_dir);
        tokio::fs::create_dir_all(&data_dir).await?;

        let service_config = settings.service_config(&data_dir);
        tracing::debug!("Using graph at {:?}", service_config.persist_file_path);

        let service = GraphService::new(service_config);
        service.initialize().await?;

        Ok(Self {
            service,
            format: cli.format,
        })
    }

    /// Write the graph back to disk
    pub async fn close(self) -> anyhow::Result<()> {
        self.service.shutdown().await?;
        Ok(())
    }
}

async fn run(cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Node(args) => node::run(args, ctx).await,
        Commands::Rel(args) => rel::run(args, ctx).await,
        Commands::Traverse(args) => graph::run_traverse(args, ctx).await,
        Commands::Path(args) => graph::run_path(args, ctx).await,
        Commands::Search(args) => graph::run_search(args, ctx).await,
        Commands::Stats => graph::run_stats(ctx).await,
        Commands::Export(args) => io::run_export(args, ctx).await,
        Commands::Import(args) => io::run_import(args, ctx).await,
        Commands::Call(args) => call::run(args, ctx).await,
        Commands::Config(_) | Commands::Completions(_) => Ok(()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting trellis CLI");

    // These never touch the graph
    match &cli.command {
        Commands::Config(args) => return commands::config::run(args, &cli.config_path()),
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let ctx = AppContext::open(&cli).await?;
    let result = run(&cli, &ctx).await;
    ctx.close().await?;
    result
}
