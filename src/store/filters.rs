//! Filter Language
//!
//! Structured conditions passed along with every listing call, plus the
//! evaluator the in-memory store uses to apply them.
//!
//! Accepted JSON shapes:
//! - `{"field": value}` (equality) or `{"field": ["op", value]}`
//! - `[[field, op, value], ...]` or `[[doctype, field, op, value], ...]`

use crate::error::SearchError;

use anyhow::Result;
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    NotEq,
    Like,
    NotLike,
    In,
    NotIn,
    Gt,
    Lt,
    Ge,
    Le,
    /// `"set"` / `"not set"`.
    Is,
}

impl FilterOp {
    pub fn parse(op: &str) -> Option<Self> {
        let op = match op.trim().to_lowercase().as_str() {
            "=" => FilterOp::Eq,
            "!=" | "<>" => FilterOp::NotEq,
            "like" => FilterOp::Like,
            "not like" => FilterOp::NotLike,
            "in" => FilterOp::In,
            "not in" => FilterOp::NotIn,
            ">" => FilterOp::Gt,
            "<" => FilterOp::Lt,
            ">=" => FilterOp::Ge,
            "<=" => FilterOp::Le,
            "is" => FilterOp::Is,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::NotEq => "!=",
            FilterOp::Like => "like",
            FilterOp::NotLike => "not like",
            FilterOp::In => "in",
            FilterOp::NotIn => "not in",
            FilterOp::Gt => ">",
            FilterOp::Lt => "<",
            FilterOp::Ge => ">=",
            FilterOp::Le => "<=",
            FilterOp::Is => "is",
        }
    }
}

/// One `field op value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// `field like %term%`.
    pub fn contains(field: &str, term: &str) -> Self {
        Self::new(field, FilterOp::Like, Value::String(format!("%{}%", term)))
    }

    fn from_array(items: &[Value]) -> Result<Self, SearchError> {
        let (field, op, value) = match items {
            [field, op, value] => (field, op, value),
            [_doctype, field, op, value] => (field, op, value),
            _ => {
                return Err(SearchError::InvalidFilters(format!(
                    "expected [field, op, value], got {} element(s)",
                    items.len()
                )));
            }
        };

        let field = field
            .as_str()
            .ok_or_else(|| SearchError::InvalidFilters("filter field must be a string".into()))?;
        let op_str = op
            .as_str()
            .ok_or_else(|| SearchError::InvalidFilters("filter operator must be a string".into()))?;
        let op = FilterOp::parse(op_str)
            .ok_or_else(|| SearchError::InvalidFilters(format!("unknown operator '{}'", op_str)))?;

        Ok(Self::new(field, op, value.clone()))
    }
}

/// Conjunction of clauses, in the order they were given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters(pub Vec<FilterClause>);

impl Filters {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, clause: FilterClause) -> Self {
        self.0.push(clause);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.0
    }

    /// Reads filters from their JSON form. `null` means no filters.
    pub fn from_value(value: &Value) -> Result<Self, SearchError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => {
                let clauses = map
                    .iter()
                    .map(|(field, condition)| match condition {
                        Value::Array(items)
                            if items.len() == 2
                                && items[0].as_str().and_then(FilterOp::parse).is_some() =>
                        {
                            let op = items[0].as_str().and_then(FilterOp::parse).unwrap_or(FilterOp::Eq);
                            FilterClause::new(field.clone(), op, items[1].clone())
                        }
                        other => FilterClause::new(field.clone(), FilterOp::Eq, other.clone()),
                    })
                    .collect();
                Ok(Self(clauses))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Array(parts) => FilterClause::from_array(parts),
                    _ => Err(SearchError::InvalidFilters(
                        "list filters must contain arrays".into(),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self),
            other => Err(SearchError::InvalidFilters(format!(
                "unsupported filters value: {}",
                other
            ))),
        }
    }
}

/// Clauses prepared for repeated evaluation against many records.
pub struct CompiledFilters {
    clauses: Vec<CompiledClause>,
}

struct CompiledClause {
    clause: FilterClause,
    pattern: Option<Regex>,
}

impl CompiledFilters {
    pub fn new(clauses: &[FilterClause]) -> Result<Self> {
        let clauses = clauses
            .iter()
            .map(|clause| {
                let pattern = match clause.op {
                    FilterOp::Like | FilterOp::NotLike => {
                        let text = as_text(&clause.value).unwrap_or_default();
                        Some(like_to_regex(&text)?)
                    }
                    _ => None,
                };
                Ok(CompiledClause {
                    clause: clause.clone(),
                    pattern,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { clauses })
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches_all(&self, record: &Map<String, Value>) -> bool {
        self.clauses.iter().all(|c| c.matches(record))
    }

    pub fn matches_any(&self, record: &Map<String, Value>) -> bool {
        self.clauses.iter().any(|c| c.matches(record))
    }
}

impl CompiledClause {
    fn matches(&self, record: &Map<String, Value>) -> bool {
        let actual = record.get(&self.clause.field).unwrap_or(&Value::Null);
        let expected = &self.clause.value;

        match self.clause.op {
            FilterOp::Eq => loose_eq(actual, expected),
            FilterOp::NotEq => !loose_eq(actual, expected),
            FilterOp::Like => self.like(actual),
            FilterOp::NotLike => !actual.is_null() && !self.like(actual),
            FilterOp::In => candidates(expected).iter().any(|v| loose_eq(actual, v)),
            FilterOp::NotIn => !candidates(expected).iter().any(|v| loose_eq(actual, v)),
            FilterOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
            FilterOp::Lt => compare(actual, expected) == Some(Ordering::Less),
            FilterOp::Ge => matches!(
                compare(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Le => matches!(
                compare(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Is => {
                let is_set = as_text(actual).is_some_and(|s| !s.is_empty());
                match expected.as_str().map(str::trim) {
                    Some("set") => is_set,
                    Some("not set") => !is_set,
                    _ => false,
                }
            }
        }
    }

    fn like(&self, actual: &Value) -> bool {
        match (&self.pattern, as_text(actual)) {
            (Some(re), Some(text)) => re.is_match(&text),
            _ => false,
        }
    }
}

/// Translates a SQL `LIKE` pattern (`%`, `_`) into an anchored,
/// case-insensitive regex.
fn like_to_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::from("(?is)^");
    for ch in pattern.chars() {
        match ch {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Ok(Regex::new(&re)?)
}

fn candidates(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => s
            .split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .collect(),
        other => vec![other.clone()],
    }
}

/// Text form of a scalar; `None` for null.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        other => Some(other.to_string()),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Equality the way a loosely typed store compares: checkboxes equal 0/1,
/// numeric strings equal numbers, a missing value equals the empty string.
fn loose_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(_) | Value::Bool(_), _) | (_, Value::Number(_) | Value::Bool(_)) => {
            match (as_number(actual), as_number(expected)) {
                (Some(a), Some(b)) => a == b,
                _ => actual == expected,
            }
        }
        _ => actual == expected,
    }
}

fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    if let (Value::String(a), Value::String(b)) = (actual, expected) {
        return Some(a.cmp(b));
    }
    let a = as_number(actual)?;
    let b = as_number(expected)?;
    a.partial_cmp(&b)
}
