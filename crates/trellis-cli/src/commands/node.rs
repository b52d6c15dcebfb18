//! Node commands

use clap::{Args, Subcommand};

use super::{order_by, parse_property, properties};
use crate::output::{emit, node_line, print_node_details};
use crate::AppContext;
use trellis_core::{NewNode, NodePatch, NodeQuery, PropertyValue};

#[derive(Args)]
pub struct NodeArgs {
    #[command(subcommand)]
    pub command: NodeCommands,
}

#[derive(Subcommand)]
pub enum NodeCommands {
    /// Create a node
    Create {
        /// Node type (e.g. TOPIC)
        #[arg(short = 't', long = "type")]
        node_type: String,
        /// Display label
        #[arg(short, long, default_value = "")]
        label: String,
        /// Property as KEY=VALUE (repeatable)
        #[arg(short, long = "prop", value_parser = parse_property)]
        props: Vec<(String, PropertyValue)>,
        /// Embedding, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        vector: Vec<f32>,
    },
    /// Show a node
    Get {
        /// Node id
        id: String,
    },
    /// Update a node; given properties replace the existing set
    Update {
        /// Node id
        id: String,
        #[arg(short = 't', long = "type")]
        node_type: Option<String>,
        #[arg(short, long)]
        label: Option<String>,
        /// Property as KEY=VALUE (repeatable)
        #[arg(short, long = "prop", value_parser = parse_property)]
        props: Vec<(String, PropertyValue)>,
        /// Embedding, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        vector: Vec<f32>,
    },
    /// Delete a node and its relationships
    Delete {
        /// Node id
        id: String,
    },
    /// List nodes
    List {
        /// Filter by type (repeatable)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,
        /// Filter by label (repeatable)
        #[arg(short, long = "label")]
        labels: Vec<String>,
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
}

pub async fn run(args: &NodeArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let service = &ctx.service;

    match &args.command {
        NodeCommands::Create {
            node_type,
            label,
            props,
            vector,
        } => {
            let mut input = NewNode::new(node_type, label);
            input.properties = properties(props);
            if !vector.is_empty() {
                input.vector = Some(vector.clone());
            }

            let node = service.create_node(input).await?;
            tracing::info!("Created node {}", node.id);
            emit(ctx.format, &node, |n| println!("Created node {}", node_line(n)))?;
        }
        NodeCommands::Get { id } => match service.get_node(id).await? {
            Some(node) => emit(ctx.format, &node, print_node_details)?,
            None => anyhow::bail!("Node '{}' not found", id),
        },
        NodeCommands::Update {
            id,
            node_type,
            label,
            props,
            vector,
        } => {
            let patch = NodePatch {
                node_type: node_type.clone(),
                label: label.clone(),
                properties: (!props.is_empty()).then(|| properties(props)),
                vector: (!vector.is_empty()).then(|| vector.clone()),
            };

            match service.update_node(id, patch).await? {
                Some(node) => emit(ctx.format, &node, |n| println!("Updated node {}", node_line(n)))?,
                None => anyhow::bail!("Node '{}' not found", id),
            }
        }
        NodeCommands::Delete { id } => {
            if !service.delete_node(id).await? {
                anyhow::bail!("Node '{}' not found", id);
            }
            emit(ctx.format, &serde_json::json!({ "deleted": id }), |_| {
                println!("Deleted node {}", id)
            })?;
        }
        NodeCommands::List {
            types,
            labels,
            props,
            order_by: field,
            desc,
            offset,
            limit,
        } => {
            let query = NodeQuery {
                node_types: types.clone(),
                labels: labels.clone(),
                properties: properties(props),
                order_by: order_by(field.as_ref(), *desc),
                offset: *offset,
                limit: *limit,
            };

            let nodes = service.query_nodes(&query).await?;
            emit(ctx.format, &nodes, |nodes| {
                if nodes.is_empty() {
                    println!("No nodes found");
                }
                for node in nodes {
                    println!("{}", node_line(node));
                }
            })?;
        }
    }

    Ok(())
}
