//! Test doubles for code that talks to a `RecordStore`.

use super::memory::MemoryRecordStore;
use super::protocol::{ListQuery, RecordStore, ResultRecord};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Which listing method a recorded call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    ListAll,
    ListFiltered,
}

/// Wraps a `MemoryRecordStore` and records every call made through it.
pub struct CountingStore {
    pub inner: MemoryRecordStore,
    exists_calls: AtomicUsize,
    calls: Mutex<Vec<(CallKind, String, ListQuery)>>,
}

impl CountingStore {
    pub fn new(inner: MemoryRecordStore) -> Self {
        Self {
            inner,
            exists_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(CallKind, String, ListQuery)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, kind: CallKind, doctype: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(k, d, _)| *k == kind && d == doctype)
            .count()
    }

    pub fn listing_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    fn record(&self, kind: CallKind, doctype: &str, query: &ListQuery) {
        self.calls
            .lock()
            .unwrap()
            .push((kind, doctype.to_string(), query.clone()));
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn exists(&self, doctype: &str) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(doctype).await
    }

    async fn list_all(&self, doctype: &str, query: &ListQuery) -> Result<Vec<ResultRecord>> {
        self.record(CallKind::ListAll, doctype, query);
        self.inner.list_all(doctype, query).await
    }

    async fn list_filtered(&self, doctype: &str, query: &ListQuery) -> Result<Vec<ResultRecord>> {
        self.record(CallKind::ListFiltered, doctype, query);
        self.inner.list_filtered(doctype, query).await
    }
}

/// A store whose every call fails, for error propagation tests.
pub struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn exists(&self, _doctype: &str) -> Result<bool> {
        Ok(true)
    }

    async fn list_all(&self, _doctype: &str, _query: &ListQuery) -> Result<Vec<ResultRecord>> {
        Err(anyhow::anyhow!("connection reset"))
    }

    async fn list_filtered(&self, _doctype: &str, _query: &ListQuery) -> Result<Vec<ResultRecord>> {
        Err(anyhow::anyhow!("connection reset"))
    }
}

/// Builds a record from a JSON object literal.
pub fn record(value: Value) -> ResultRecord {
    serde_json::from_value(value).expect("test record must be a JSON object")
}
