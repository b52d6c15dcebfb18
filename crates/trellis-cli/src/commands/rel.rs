//! Relationship commands

use clap::{Args, Subcommand};

use super::{order_by, parse_property, properties, DirectionArg};
use crate::output::{emit, print_relationship_details, relationship_line};
use crate::AppContext;
use trellis_core::{NewRelationship, PropertyValue, Relationship, RelationshipPatch, RelationshipQuery};

#[derive(Args)]
pub struct RelArgs {
    #[command(subcommand)]
    pub command: RelCommands,
}

#[derive(Subcommand)]
pub enum RelCommands {
    /// Create a relationship between two existing nodes
    Create {
        /// Source node id
        source: String,
        /// Target node id
        target: String,
        /// Relationship type (e.g. BELONGS_TO)
        #[arg(short = 't', long = "type")]
        rel_type: String,
        #[arg(short, long, default_value = "")]
        label: String,
        /// Property as KEY=VALUE (repeatable)
        #[arg(short, long = "prop", value_parser = parse_property)]
        props: Vec<(String, PropertyValue)>,
    },
    /// Show a relationship
    Get {
        /// Relationship id
        id: String,
    },
    /// Update a relationship; given properties replace the existing set
    Update {
        /// Relationship id
        id: String,
        #[arg(short = 't', long = "type")]
        rel_type: Option<String>,
        #[arg(short, long)]
        label: Option<String>,
        /// New source node id
        #[arg(long)]
        source: Option<String>,
        /// New target node id
        #[arg(long)]
        target: Option<String>,
        /// Property as KEY=VALUE (repeatable)
        #[arg(short, long = "prop", value_parser = parse_property)]
        props: Vec<(String, PropertyValue)>,
    },
    /// Delete a relationship
    Delete {
        /// Relationship id
        id: String,
    },
    /// List relationships
    List {
        /// Filter by type (repeatable)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,
        /// Filter by source node id (repeatable)
        #[arg(long = "source")]
        sources: Vec<String>,
        /// Filter by target node id (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,
        /// Filter by property KEY=VALUE (repeatable)
        #[arg(short, long = "prop", value_parser = parse_property)]
        props: Vec<(String, PropertyValue)>,
        /// Sort by a field or property key
        #[arg(long)]
        order_by: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        #[arg(long)]
        offset: Option<usize>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Relationships touching a node
    Of {
        /// Node id
        node_id: String,
        #[arg(long, value_enum, default_value = "both")]
        direction: DirectionArg,
    },
}

fn print_list(rels: &[Relationship]) {
    if rels.is_empty() {
        println!("No relationships found");
    }
    for rel in rels {
        println!("{}", relationship_line(rel));
    }
}

pub async fn run(args: &RelArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let service = &ctx.service;

    match &args.command {
        RelCommands::Create {
            source,
            target,
            rel_type,
            label,
            props,
        } => {
            let mut input = NewRelationship::new(source, target, rel_type).with_label(label);
            input.properties = properties(props);

            let rel = service.create_relationship(input).await?;
            tracing::info!("Created relationship {}", rel.id);
            emit(ctx.format, &rel, |r| {
                println!("Created relationship {}", relationship_line(r))
            })?;
        }
        RelCommands::Get { id } => match service.get_relationship(id).await? {
            Some(rel) => emit(ctx.format, &rel, print_relationship_details)?,
            None => anyhow::bail!("Relationship '{}' not found", id),
        },
        RelCommands::Update {
            id,
            rel_type,
            label,
            source,
            target,
            props,
        } => {
            let patch = RelationshipPatch {
                rel_type: rel_type.clone(),
                label: label.clone(),
                source_node_id: source.clone(),
                target_node_id: target.clone(),
                properties: (!props.is_empty()).then(|| properties(props)),
            };

            match service.update_relationship(id, patch).await? {
                Some(rel) => emit(ctx.format, &rel, |r| {
                    println!("Updated relationship {}", relationship_line(r))
                })?,
                None => anyhow::bail!("Relationship '{}' not found", id),
            }
        }
        RelCommands::Delete { id } => {
            if !service.delete_relationship(id).await? {
                anyhow::bail!("Relationship '{}' not found", id);
            }
            emit(ctx.format, &serde_json::json!({ "deleted": id }), |_| {
                println!("Deleted relationship {}", id)
            })?;
        }
        RelCommands::List {
            types,
            sources,
            targets,
            props,
            order_by: field,
            desc,
            offset,
            limit,
        } => {
            let query = RelationshipQuery {
                relationship_types: types.clone(),
                source_node_ids: sources.clone(),
                target_node_ids: targets.clone(),
                properties: properties(props),
                order_by: order_by(field.as_ref(), *desc),
                offset: *offset,
                limit: *limit,
            };

            let rels = service.query_relationships(&query).await?;
            emit(ctx.format, &rels, |rels| print_list(rels))?;
        }
        RelCommands::Of { node_id, direction } => {
            let rels = service
                .node_relationships(node_id, (*direction).into())
                .await?;
            emit(ctx.format, &rels, |rels| print_list(rels))?;
        }
    }

    Ok(())
}
