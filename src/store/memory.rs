use super::filters::CompiledFilters;
use super::protocol::{KEY_FIELD, ListQuery, RecordStore, ResultRecord};

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

/// Record store held entirely in memory.
///
/// One table per record type; rows keep insertion order, which is the
/// store-native order returned when a listing does not ask for sorting.
pub struct MemoryRecordStore {
    tables: DashMap<String, Vec<ResultRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
        }
    }

    /// Makes `doctype` known to the store even before it holds records.
    pub fn register_doctype(&self, doctype: &str) {
        self.tables.entry(doctype.to_string()).or_default();
    }

    /// Inserts the record, replacing any existing row with the same key.
    pub fn upsert(&self, doctype: &str, record: ResultRecord) -> Result<()> {
        let key = record
            .name()
            .ok_or_else(|| anyhow::anyhow!("Record for {} has no '{}' field", doctype, KEY_FIELD))?
            .to_string();

        let mut table = self.tables.entry(doctype.to_string()).or_default();
        match table.iter().position(|row| row.name() == Some(key.as_str())) {
            Some(idx) => table[idx] = record,
            None => table.push(record),
        }

        tracing::debug!("Stored {} '{}'", doctype, key);
        Ok(())
    }

    pub fn get(&self, doctype: &str, name: &str) -> Option<ResultRecord> {
        self.tables
            .get(doctype)?
            .iter()
            .find(|row| row.name() == Some(name))
            .cloned()
    }

    pub fn doctype_count(&self) -> usize {
        self.tables.len()
    }

    pub fn record_count(&self) -> usize {
        self.tables.iter().map(|entry| entry.value().len()).sum()
    }

    /// Loads `{doctype: [record, ...]}` from a JSON document.
    pub fn load_value(&self, fixtures: HashMap<String, Vec<ResultRecord>>) -> Result<usize> {
        let mut loaded = 0usize;
        for (doctype, records) in fixtures {
            self.register_doctype(&doctype);
            for record in records {
                self.upsert(&doctype, record)?;
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    pub fn load_fixtures(&self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures file '{}'", path.display()))?;
        let fixtures: HashMap<String, Vec<ResultRecord>> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid fixtures file '{}'", path.display()))?;

        let loaded = self.load_value(fixtures)?;
        tracing::info!("Loaded {} fixture records from {}", loaded, path.display());
        Ok(loaded)
    }

    fn select(&self, doctype: &str, query: &ListQuery, apply_or: bool) -> Result<Vec<ResultRecord>> {
        let Some(table) = self.tables.get(doctype) else {
            return Ok(Vec::new());
        };

        let filters = CompiledFilters::new(query.filters.clauses())?;
        let or_filters = if apply_or {
            CompiledFilters::new(&query.or_filters)?
        } else {
            CompiledFilters::new(&[])?
        };

        let mut rows: Vec<&ResultRecord> = table
            .iter()
            .filter(|row| filters.matches_all(&row.0))
            .filter(|row| or_filters.is_empty() || or_filters.matches_any(&row.0))
            .collect();

        if let Some(order_by) = &query.order_by {
            let (field, descending) = parse_order_by(order_by);
            rows.sort_by(|a, b| {
                let ord = sort_cmp(a.get(field), b.get(field));
                if descending { ord.reverse() } else { ord }
            });
        }

        let page_length = query.page_length.unwrap_or(usize::MAX);
        let records = rows
            .into_iter()
            .skip(query.start)
            .take(page_length)
            .map(|row| project(row, &query.fields))
            .collect();

        Ok(records)
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn exists(&self, doctype: &str) -> Result<bool> {
        Ok(self.tables.contains_key(doctype))
    }

    async fn list_all(&self, doctype: &str, query: &ListQuery) -> Result<Vec<ResultRecord>> {
        self.select(doctype, query, false)
    }

    async fn list_filtered(&self, doctype: &str, query: &ListQuery) -> Result<Vec<ResultRecord>> {
        self.select(doctype, query, true)
    }
}

fn parse_order_by(order_by: &str) -> (&str, bool) {
    let mut parts = order_by.split_whitespace();
    let field = parts.next().unwrap_or(KEY_FIELD);
    let descending = parts
        .next()
        .is_some_and(|dir| dir.eq_ignore_ascii_case("desc"));
    (field, descending)
}

fn sort_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

/// Keeps the requested fields, honouring `"source as alias"`.
fn project(row: &ResultRecord, fields: &[String]) -> ResultRecord {
    if fields.is_empty() {
        let mut out = Map::new();
        out.insert(
            KEY_FIELD.to_string(),
            row.get(KEY_FIELD).cloned().unwrap_or(Value::Null),
        );
        return ResultRecord(out);
    }

    let mut out = Map::new();
    for spec in fields {
        let (source, alias) = split_alias(spec);
        let value = row.get(source).cloned().unwrap_or(Value::Null);
        out.insert(alias.to_string(), value);
    }
    ResultRecord(out)
}

fn split_alias(spec: &str) -> (&str, &str) {
    let lower = spec.to_ascii_lowercase();
    match lower.find(" as ") {
        Some(idx) => (spec[..idx].trim(), spec[idx + 4..].trim()),
        None => (spec.trim(), spec.trim()),
    }
}
