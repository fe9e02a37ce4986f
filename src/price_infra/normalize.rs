//! Numeric normalization shared by every adapter.
//!
//! Upstreams disagree on shape: some send `"price": "64012.5"`, some send
//! numbers, some nest the value inside arrays keyed by a pair name, and the
//! Argentine providers use a decimal comma. Everything funnels through
//! [`extract_price`] so all sources are held to the same strictness.

use serde_json::Value;
use crate::types::Price;

/// A dotted path into a JSON document: `result.list.0.lastPrice`.
/// `*` selects the first child of an object or array.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
    First,
}

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    Segment::First
                } else if let Ok(idx) = s.parse::<usize>() {
                    Segment::Index(idx)
                } else {
                    Segment::Key(s.to_string())
                }
            })
            .collect();
        FieldPath { segments }
    }

    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Key(k), Value::Object(map)) => map.get(k)?,
                // Numeric keys are legal object keys too.
                (Segment::Index(i), Value::Object(map)) => map.get(&i.to_string())?,
                (Segment::Index(i), Value::Array(items)) => items.get(*i)?,
                (Segment::First, Value::Object(map)) => map.values().next()?,
                (Segment::First, Value::Array(items)) => items.first()?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Try each path in order and coerce the first non-null hit.
pub fn extract_price(body: &Value, paths: &[FieldPath]) -> Result<Price, String> {
    let raw = paths
        .iter()
        .filter_map(|p| p.resolve(body))
        .find(|v| !v.is_null())
        .ok_or_else(|| "no recognised price field".to_string())?;

    coerce_to_price(raw).ok_or_else(|| format!("unusable price value {}", raw))
}

/// Best-effort numeric coercion: numbers, numeric strings (either decimal
/// separator), or the first element of an array. Anything non-finite or
/// non-positive is rejected.
pub fn coerce_to_price(raw: &Value) -> Option<Price> {
    match raw {
        Value::Number(n) => n.as_f64().and_then(Price::new),
        Value::String(s) => parse_decimal(s).and_then(Price::new),
        Value::Array(items) => items.first().and_then(coerce_to_price),
        _ => None,
    }
}

fn parse_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let normalized = match (s.rfind(','), s.rfind('.')) {
        // The later separator is the decimal one; the other groups thousands.
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => {
            if s.matches(',').count() > 1 {
                s.replace(',', "")
            } else {
                s.replace(',', ".")
            }
        }
        _ => s.to_string(),
    };

    let value: f64 = normalized.parse().ok()?;
    value.is_finite().then_some(value)
}
