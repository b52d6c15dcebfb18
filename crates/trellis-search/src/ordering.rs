//! Sort keys and the comparison rules used by `orderBy`

use chrono::{DateTime, SecondsFormat, Utc};
use std::cmp::Ordering;
use trellis_core::{OrderBy, PropertyValue, SortDirection};

/// A value extracted from a node or relationship for ordering
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey<'a> {
    /// Built-in string field (id, type, label, endpoint id)
    Text(&'a str),
    /// Built-in timestamp field
    Time(DateTime<Utc>),
    /// Property value
    Value(&'a PropertyValue),
}

impl SortKey<'_> {
    /// Text used when the two sides have no common native ordering
    fn render(&self) -> String {
        match self {
            Self::Text(s) => s.to_string(),
            Self::Time(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Self::Value(v) => v.render(),
        }
    }
}

/// Native comparison for matching kinds, rendered text otherwise
pub fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    use SortKey::{Text, Time, Value};

    match (a, b) {
        (Text(x), Text(y)) => x.cmp(y),
        (Time(x), Time(y)) => x.cmp(y),
        (Value(x), Value(y)) => compare_values(x, y),
        (Text(x), Value(PropertyValue::String(y))) => (*x).cmp(y.as_str()),
        (Value(PropertyValue::String(x)), Text(y)) => x.as_str().cmp(y),
        _ => a.render().cmp(&b.render()),
    }
}

/// Numbers numerically (integers and floats mix), strings lexicographically,
/// booleans `false < true`; anything else by rendered text
pub fn compare_values(a: &PropertyValue, b: &PropertyValue) -> Ordering {
    match (a, b) {
        (PropertyValue::String(x), PropertyValue::String(y)) => x.cmp(y),
        (PropertyValue::Bool(x), PropertyValue::Bool(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.render().cmp(&b.render()),
        },
    }
}

/// Stable sort by the key `key` extracts. Items without a key always sort
/// after items with one, for both directions.
///
/// The text fallback for mixed kinds is not transitive (`9 < 10`,
/// `10 < "9"`, `"9" == 9`), so this runs a merge sort that accepts any
/// comparator instead of `slice::sort_by`, which may panic on one.
pub fn sort_by_key<T, F>(items: &mut Vec<T>, order: &OrderBy, key: F)
where
    F: for<'x> Fn(&'x T) -> Option<SortKey<'x>>,
{
    let compare = |a: &T, b: &T| match (key(a), key(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ordering = compare_keys(&x, &y);
            match order.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    };
    *items = merge_sort(std::mem::take(items), &compare);
}

fn merge_sort<T>(mut items: Vec<T>, compare: &impl Fn(&T, &T) -> Ordering) -> Vec<T> {
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare);
    let right = merge_sort(right, compare);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        // Ties take the left run
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) == Ordering::Less,
            _ => break,
        };
        if take_right {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    merged
}
