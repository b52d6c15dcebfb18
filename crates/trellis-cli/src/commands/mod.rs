//! CLI command implementations

pub mod call;
pub mod completions;
pub mod config;
pub mod graph;
pub mod io;
pub mod node;
pub mod rel;

use clap::ValueEnum;
use trellis_core::property::parse_loose;
use trellis_core::{Direction, OrderBy, Properties, PropertyValue};

/// Parse a `KEY=VALUE` property. Values that parse as JSON keep their
/// JSON type; anything else is a string.
pub fn parse_property(raw: &str) -> Result<(String, PropertyValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("property key cannot be empty".to_string());
    }
    Ok((key.to_string(), parse_loose(value)))
}

pub fn properties(pairs: &[(String, PropertyValue)]) -> Properties {
    pairs.iter().cloned().collect()
}

pub fn order_by(field: Option<&String>, desc: bool) -> Option<OrderBy> {
    field.map(|f| if desc { OrderBy::desc(f) } else { OrderBy::asc(f) })
}

/// Traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DirectionArg {
    Outgoing,
    Incoming,
    #[default]
    Both,
}

impl From<DirectionArg> for Direction {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Outgoing => Direction::Outgoing,
            DirectionArg::Incoming => Direction::Incoming,
            DirectionArg::Both => Direction::Both,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_property() {
        assert_eq!(
            parse_property("year=2015").unwrap(),
            ("year".to_string(), PropertyValue::Integer(2015))
        );
        assert_eq!(
            parse_property("name=a=b").unwrap(),
            ("name".to_string(), PropertyValue::from("a=b"))
        );
        assert!(parse_property("novalue").is_err());
        assert!(parse_property("=1").is_err());
    }
}
