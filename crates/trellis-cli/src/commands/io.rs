//! Import/Export commands

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};

use crate::output::emit;
use crate::AppContext;
use trellis_storage::{ExportFormat, MergeStrategy};

/// File format on the command line
#[derive(Clone, Copy, ValueEnum)]
pub enum FileFormat {
    Json,
    /// Directory with nodes.csv and relationships.csv
    Csv,
    #[value(name = "graphml")]
    GraphMl,
}

impl From<FileFormat> for ExportFormat {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Json => ExportFormat::Json,
            FileFormat::Csv => ExportFormat::Csv,
            FileFormat::GraphMl => ExportFormat::GraphMl,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Clear the graph first
    Replace,
    /// Imported records overwrite existing ids
    Merge,
    /// Existing ids are kept
    SkipDuplicates,
}

impl From<StrategyArg> for MergeStrategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Replace => MergeStrategy::Replace,
            StrategyArg::Merge => MergeStrategy::Merge,
            StrategyArg::SkipDuplicates => MergeStrategy::SkipDuplicates,
        }
    }
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file, or directory for CSV
    pub output: PathBuf,

    /// Format (inferred from the extension when omitted)
    #[arg(id = "file_format", long = "as", value_name = "FORMAT", value_enum)]
    pub format: Option<FileFormat>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Input file, or directory for CSV
    pub input: PathBuf,

    /// Format (inferred from the extension when omitted)
    #[arg(id = "file_format", long = "as", value_name = "FORMAT", value_enum)]
    pub format: Option<FileFormat>,

    #[arg(long, value_enum, default_value = "merge")]
    pub strategy: StrategyArg,
}

fn resolve_format(path: &Path, explicit: Option<FileFormat>) -> anyhow::Result<ExportFormat> {
    if let Some(format) = explicit {
        return Ok(format.into());
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext
            .parse()
            .map_err(|_| anyhow::anyhow!("Cannot infer format from '.{}'; pass --as", ext)),
        None if path.is_dir() => Ok(ExportFormat::Csv),
        None => anyhow::bail!("Cannot infer format of {}; pass --as", path.display()),
    }
}

pub async fn run_export(args: &ExportArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let format = resolve_format(&args.output, args.format)?;
    let summary = ctx.service.export_graph(format, &args.output).await?;

    emit(ctx.format, &summary, |s| {
        println!(
            "Exported {} nodes and {} relationships to {} ({})",
            s.node_count,
            s.relationship_count,
            s.path.display(),
            s.format
        )
    })
}

pub async fn run_import(args: &ImportArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let format = resolve_format(&args.input, args.format)?;
    let report = ctx
        .service
        .import_graph(format, &args.input, args.strategy.into())
        .await?;

    emit(ctx.format, &report, |r| {
        println!(
            "Imported {} nodes ({} skipped) and {} relationships ({} skipped, {} dangling)",
            r.nodes_imported,
            r.nodes_skipped,
            r.relationships_imported,
            r.relationships_skipped,
            r.relationships_dropped
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_inference() {
        assert_eq!(
            resolve_format(Path::new("out.json"), None).unwrap(),
            ExportFormat::Json
        );
        assert_eq!(
            resolve_format(Path::new("out.GRAPHML"), None).unwrap(),
            ExportFormat::GraphMl
        );
        assert_eq!(
            resolve_format(Path::new("out.json"), Some(FileFormat::Csv)).unwrap(),
            ExportFormat::Csv
        );
        assert!(resolve_format(Path::new("out.txt"), None).is_err());

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_format(dir.path(), None).unwrap(), ExportFormat::Csv);
        assert!(resolve_format(&dir.path().join("missing"), None).is_err());
    }
}
