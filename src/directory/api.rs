//!
//! Mock directory API
//! ------------------
//! In-memory CRUD collections behaving like a remote REST resource: every
//! call sleeps for a configurable latency window and may fail with an
//! injected `simulated_server` error at a configurable rate (~5% by
//! default). Filters are exact-match, relaxed to case-insensitive substring
//! match for string fields. Lookup misses surface as `not_found`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AppError, AppResult};

use super::model::Resource;

/// Latency and failure knobs. Tests run with [`DirectoryProfile::instant`].
#[derive(Debug, Clone, Copy)]
pub struct DirectoryProfile {
    pub base_latency_ms: u64,
    pub jitter_ms: u64,
    /// Probability in [0, 1] that a call fails with `simulated_server`.
    pub failure_rate: f64,
}

impl Default for DirectoryProfile {
    fn default() -> Self {
        Self { base_latency_ms: 300, jitter_ms: 500, failure_rate: 0.05 }
    }
}

impl DirectoryProfile {
    /// Deterministic: no latency, no injected failures.
    pub fn instant() -> Self {
        Self { base_latency_ms: 0, jitter_ms: 0, failure_rate: 0.0 }
    }

    /// Every call fails; used to test error paths.
    pub fn always_failing() -> Self {
        Self { base_latency_ms: 0, jitter_ms: 0, failure_rate: 1.0 }
    }
}

fn rand_u64() -> u64 {
    let mut buf = [0u8; 8];
    let _ = getrandom::getrandom(&mut buf);
    u64::from_le_bytes(buf)
}

struct Inner {
    profile: DirectoryProfile,
    collections: RwLock<HashMap<Resource, Vec<Value>>>,
}

/// Cheap-clone handle over the shared collections.
#[derive(Clone)]
pub struct Directory {
    inner: Arc<Inner>,
}

impl Directory {
    pub fn new(profile: DirectoryProfile) -> Self {
        let mut collections = HashMap::new();
        for r in Resource::ALL {
            collections.insert(r, Vec::new());
        }
        Self { inner: Arc::new(Inner { profile, collections: RwLock::new(collections) }) }
    }

    /// Directly load rows into a collection, bypassing latency and failure
    /// simulation. Seeding and test setup only.
    pub fn load(&self, resource: Resource, rows: Vec<Value>) {
        let mut cols = self.inner.collections.write();
        cols.entry(resource).or_default().extend(rows);
    }

    pub fn len(&self, resource: Resource) -> usize {
        self.inner.collections.read().get(&resource).map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, resource: Resource) -> bool {
        self.len(resource) == 0
    }

    /// One latency + failure roll, shared by every operation.
    async fn simulate(&self, op: &str, resource: Resource) -> AppResult<()> {
        let p = &self.inner.profile;
        let mut delay = p.base_latency_ms;
        if p.jitter_ms > 0 {
            delay += rand_u64() % (p.jitter_ms + 1);
        }
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if p.failure_rate > 0.0 {
            let roll = (rand_u64() as f64) / (u64::MAX as f64);
            if roll < p.failure_rate {
                debug!("injected failure on {} {}", op, resource);
                return Err(AppError::simulated(format!(
                    "simulated server error during {} {}",
                    op, resource
                )));
            }
        }
        Ok(())
    }

    pub async fn get_all(
        &self,
        resource: Resource,
        filters: &Map<String, Value>,
    ) -> AppResult<Vec<Value>> {
        self.simulate("get_all", resource).await?;
        let cols = self.inner.collections.read();
        let rows = cols.get(&resource).map(|v| v.as_slice()).unwrap_or(&[]);
        Ok(rows.iter().filter(|r| matches(r, filters)).cloned().collect())
    }

    pub async fn get_by_id(&self, resource: Resource, id: &str) -> AppResult<Value> {
        self.simulate("get_by_id", resource).await?;
        let cols = self.inner.collections.read();
        cols.get(&resource)
            .and_then(|rows| rows.iter().find(|r| record_id(r) == Some(id)))
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("{} {} not found", resource, id)))
    }

    /// Insert a record, assigning a fresh id when the item carries none.
    pub async fn create(&self, resource: Resource, item: Value) -> AppResult<Value> {
        self.simulate("create", resource).await?;
        let mut item = match item {
            Value::Object(map) => map,
            other => {
                return Err(AppError::internal(format!(
                    "directory records must be JSON objects, got {}",
                    other
                )))
            }
        };
        if record_id(&Value::Object(item.clone())).is_none() {
            item.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        let record = Value::Object(item);
        let mut cols = self.inner.collections.write();
        cols.entry(resource).or_default().push(record.clone());
        debug!("created {} record {:?}", resource, record_id(&record));
        Ok(record)
    }

    /// Shallow-merge `patch` fields over the existing record.
    pub async fn update(&self, resource: Resource, id: &str, patch: Value) -> AppResult<Value> {
        self.simulate("update", resource).await?;
        let Value::Object(patch) = patch else {
            return Err(AppError::internal("update patch must be a JSON object"));
        };
        let mut cols = self.inner.collections.write();
        let rows = cols
            .get_mut(&resource)
            .ok_or_else(|| AppError::not_found(format!("{} {} not found", resource, id)))?;
        let Some(record) = rows.iter_mut().find(|r| record_id(r) == Some(id)) else {
            return Err(AppError::not_found(format!("{} {} not found", resource, id)));
        };
        if let Value::Object(fields) = record {
            for (k, v) in patch {
                // The id is the record's identity, not a patchable field
                if k != "id" {
                    fields.insert(k, v);
                }
            }
        }
        Ok(record.clone())
    }

    /// Remove and return the record.
    pub async fn delete(&self, resource: Resource, id: &str) -> AppResult<Value> {
        self.simulate("delete", resource).await?;
        let mut cols = self.inner.collections.write();
        let rows = cols
            .get_mut(&resource)
            .ok_or_else(|| AppError::not_found(format!("{} {} not found", resource, id)))?;
        let Some(pos) = rows.iter().position(|r| record_id(r) == Some(id)) else {
            return Err(AppError::not_found(format!("{} {} not found", resource, id)));
        };
        Ok(rows.remove(pos))
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(|v| v.as_str())
}

/// Exact match, or case-insensitive substring match when both sides are
/// strings. A filter key absent from the record never matches.
fn matches(record: &Value, filters: &Map<String, Value>) -> bool {
    for (key, want) in filters {
        let Some(have) = record.get(key) else {
            return false;
        };
        if have == want {
            continue;
        }
        match (have, want) {
            (Value::String(have), Value::String(want)) => {
                if !have.to_lowercase().contains(&want.to_lowercase()) {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}
