//! Output formatting utilities

use clap::ValueEnum;
use serde::Serialize;
use trellis_core::{GraphPath, Node, PropertyValue, Relationship};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `data` as pretty JSON, or hand it to `text` for human output
pub fn emit<T: Serialize>(format: OutputFormat, data: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => text(data),
    }
    Ok(())
}

pub fn node_line(node: &Node) -> String {
    format!("{}  {} ({})", node.id, node.label, node.node_type.as_str())
}

pub fn relationship_line(rel: &Relationship) -> String {
    format!(
        "{}  {} -[{}]-> {}",
        rel.id, rel.source_node_id, rel.rel_type, rel.target_node_id
    )
}

pub fn path_line(path: &GraphPath) -> String {
    let labels: Vec<&str> = path.nodes.iter().map(|n| n.label.as_str()).collect();
    format!("[{}] {}", path.length, labels.join(" -> "))
}

pub fn print_node_details(node: &Node) {
    println!("Node: {}", node.id);
    println!("  Type: {}", node.node_type.as_str());
    println!("  Label: {}", node.label);
    println!("  Created: {}", node.created_at);
    println!("  Updated: {}", node.updated_at);
    if let Some(vector) = &node.vector {
        println!("  Vector: {} dimensions", vector.len());
    }
    print_properties(node.properties.iter());
}

pub fn print_relationship_details(rel: &Relationship) {
    println!("Relationship: {}", rel.id);
    println!("  Type: {}", rel.rel_type);
    if !rel.label.is_empty() {
        println!("  Label: {}", rel.label);
    }
    println!("  Source: {}", rel.source_node_id);
    println!("  Target: {}", rel.target_node_id);
    println!("  Created: {}", rel.created_at);
    println!("  Updated: {}", rel.updated_at);
    print_properties(rel.properties.iter());
}

fn print_properties<'a>(properties: impl ExactSizeIterator<Item = (&'a String, &'a PropertyValue)>) {
    if properties.len() == 0 {
        return;
    }
    println!("  Properties:");
    for (key, value) in properties {
        println!("    {} = {}", key, value.render());
    }
}
