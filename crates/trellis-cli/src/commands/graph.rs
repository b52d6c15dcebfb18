//! Traversal, path, similarity and stats commands

use clap::{Args, Subcommand};

use super::DirectionArg;
use crate::output::{emit, node_line, path_line, relationship_line};
use crate::AppContext;
use trellis_core::{GraphPath, PathQuery, TraversalQuery, VectorQuery};

#[derive(Args)]
pub struct TraverseArgs {
    /// Start node id
    pub start: String,

    #[arg(long, value_enum, default_value = "both")]
    pub direction: DirectionArg,

    /// Maximum hops from the start node
    #[arg(long, default_value = "3")]
    pub depth: u32,

    /// Maximum nodes to return
    #[arg(short = 'n', long, default_value = "100")]
    pub limit: usize,

    /// Only follow these relationship types (repeatable)
    #[arg(long = "rel-type")]
    pub rel_types: Vec<String>,

    /// Only collect these node types (repeatable)
    #[arg(long = "node-type")]
    pub node_types: Vec<String>,
}

#[derive(Args)]
pub struct PathArgs {
    #[command(subcommand)]
    pub command: PathCommands,
}

#[derive(Args)]
pub struct PathOptions {
    /// Start node id
    pub from: String,

    /// End node id
    pub to: String,

    /// Maximum path length
    #[arg(long)]
    pub depth: Option<u32>,

    #[arg(long, value_enum, default_value = "both")]
    pub direction: DirectionArg,

    /// Only follow these relationship types (repeatable)
    #[arg(long = "rel-type")]
    pub rel_types: Vec<String>,
}

impl PathOptions {
    fn query(&self) -> PathQuery {
        let mut query = PathQuery::new(&self.from, &self.to)
            .with_direction(self.direction.into())
            .filter_relationship_types(self.rel_types.clone());
        if let Some(depth) = self.depth {
            query = query.with_depth(depth);
        }
        query
    }
}

#[derive(Subcommand)]
pub enum PathCommands {
    /// Shortest path by hop count
    Shortest(PathOptions),
    /// Every simple path up to the depth bound, shortest first
    All(PathOptions),
}

#[derive(Args)]
pub struct SearchArgs {
    /// Query embedding, comma separated
    #[arg(long, required = true, value_delimiter = ',', allow_negative_numbers = true)]
    pub vector: Vec<f32>,

    /// Only rank these node types (repeatable)
    #[arg(short = 't', long = "type")]
    pub node_types: Vec<String>,

    /// Drop results below this similarity
    #[arg(long, allow_negative_numbers = true)]
    pub min_similarity: Option<f32>,

    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,
}

pub async fn run_traverse(args: &TraverseArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let query = TraversalQuery::new(&args.start)
        .with_direction(args.direction.into())
        .with_depth(args.depth)
        .with_limit(args.limit)
        .filter_relationship_types(args.rel_types.clone())
        .filter_node_types(args.node_types.clone());

    let result = ctx.service.traverse_graph(&query).await?;
    tracing::info!(
        "Traversal visited {} nodes, examined {} edges",
        result.stats.nodes_visited,
        result.stats.edges_examined
    );

    emit(ctx.format, &result, |result| {
        println!(
            "Reached {} nodes (max depth {}):",
            result.nodes.len(),
            result.stats.max_depth_reached
        );
        for node in &result.nodes {
            println!("  {}", node_line(node));
        }
        if !result.relationships.is_empty() {
            println!("Relationships:");
            for rel in &result.relationships {
                println!("  {}", relationship_line(rel));
            }
        }
    })
}

fn print_paths(paths: &[GraphPath]) {
    if paths.is_empty() {
        println!("No path found");
    }
    for path in paths {
        println!("{}", path_line(path));
    }
}

pub async fn run_path(args: &PathArgs, ctx: &AppContext) -> anyhow::Result<()> {
    match &args.command {
        PathCommands::Shortest(opts) => {
            let path = ctx.service.find_shortest_path(&opts.query()).await?;
            emit(ctx.format, &path, |path| print_paths(path.as_slice()))
        }
        PathCommands::All(opts) => {
            let paths = ctx.service.find_all_paths(&opts.query()).await?;
            emit(ctx.format, &paths, |paths| print_paths(paths))
        }
    }
}

pub async fn run_search(args: &SearchArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let mut query = VectorQuery::new(args.vector.clone()).with_limit(args.limit);
    query.node_types = args.node_types.clone();
    query.min_similarity = args.min_similarity;

    let hits = ctx.service.vector_search(&query).await?;
    emit(ctx.format, &hits, |hits| {
        if hits.is_empty() {
            println!("No matches");
        }
        for hit in hits {
            println!("{:.4}  {}", hit.similarity, node_line(&hit.node));
        }
    })
}

pub async fn run_stats(ctx: &AppContext) -> anyhow::Result<()> {
    let stats = ctx.service.get_graph_stats().await?;
    emit(ctx.format, &stats, |stats| {
        println!("Nodes: {}", stats.node_count);
        for (node_type, count) in &stats.node_types {
            println!("  {}: {}", node_type, count);
        }
        println!("Relationships: {}", stats.relationship_count);
        for (rel_type, count) in &stats.relationship_types {
            println!("  {}: {}", rel_type, count);
        }
    })
}
