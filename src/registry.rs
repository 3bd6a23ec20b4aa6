use crate::{
    errors::RegistryError,
    models::{UrlRecord, UrlStats},
};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Length of every generated short code.
pub const SHORT_CODE_LEN: usize = 8;

/// How many fresh identifiers `register` draws before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 32;

/// Queries shorter than this never match anything.
pub const MIN_SEARCH_LEN: usize = 3;

type IdSource = Box<dyn Fn() -> Uuid + Send + Sync>;

/// Owns the short_code -> record mapping.
///
/// A single mutex guards the whole map and every operation holds it for its
/// full duration, so the collision check in `register` and the
/// read-increment-write in `record_visit` are each one atomic step. Records
/// are kept in insertion order so `list` and `search` are deterministic.
pub struct CodeRegistry {
    inner: Mutex<Records>,
    next_id: IdSource,
}

#[derive(Default)]
struct Records {
    order: Vec<String>,
    by_code: HashMap<String, UrlRecord>,
}

impl Records {
    fn iter(&self) -> impl Iterator<Item = &UrlRecord> {
        self.order.iter().filter_map(|code| self.by_code.get(code))
    }
}

impl CodeRegistry {
    pub fn new() -> Self {
        Self::with_id_source(Uuid::new_v4)
    }

    /// Build a registry that draws identifiers from `source` instead of
    /// random v4 UUIDs.
    pub fn with_id_source(source: impl Fn() -> Uuid + Send + Sync + 'static) -> Self {
        Self {
            inner: Mutex::new(Records::default()),
            next_id: Box::new(source),
        }
    }

    /// Store `original_url` under a fresh short code.
    ///
    /// The caller is expected to have validated the URL already.
    pub fn register(&self, original_url: &str) -> Result<UrlRecord, RegistryError> {
        let mut records = self.inner.lock();

        for _ in 0..MAX_CODE_ATTEMPTS {
            let id = (self.next_id)();
            let short_code = short_code_for(&id);
            if records.by_code.contains_key(&short_code) {
                tracing::debug!("Short code '{}' already taken, drawing again", short_code);
                continue;
            }

            let record = UrlRecord {
                id,
                original_url: original_url.to_owned(),
                short_code: short_code.clone(),
                created_at: Utc::now(),
                visits: 0,
                last_visited: None,
            };
            records.order.push(short_code.clone());
            records.by_code.insert(short_code, record.clone());
            return Ok(record);
        }

        Err(RegistryError::CodeSpaceExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// Exact-match lookup. Never touches the visit counter.
    pub fn resolve(&self, code: &str) -> Result<UrlRecord, RegistryError> {
        self.inner
            .lock()
            .by_code
            .get(code)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(code.to_owned()))
    }

    /// Count one visit. Returns `false` if the code is not registered.
    pub fn record_visit(&self, code: &str) -> bool {
        let mut records = self.inner.lock();
        match records.by_code.get_mut(code) {
            Some(record) => {
                record.visits += 1;
                record.last_visited = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    /// Every live record, oldest first.
    pub fn list(&self) -> Vec<UrlRecord> {
        self.inner.lock().iter().cloned().collect()
    }

    /// Records whose original URL contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<UrlRecord> {
        if query.chars().count() < MIN_SEARCH_LEN {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        self.inner
            .lock()
            .iter()
            .filter(|record| record.original_url.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Delete a record. Returns whether anything was removed.
    pub fn remove(&self, code: &str) -> bool {
        let mut records = self.inner.lock();
        if records.by_code.remove(code).is_none() {
            return false;
        }
        records.order.retain(|c| c != code);
        true
    }

    pub fn statistics(&self, code: &str) -> Result<UrlStats, RegistryError> {
        self.inner
            .lock()
            .by_code
            .get(code)
            .map(UrlStats::from)
            .ok_or_else(|| RegistryError::NotFound(code.to_owned()))
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.inner.lock().by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().by_code.is_empty()
    }
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The public code is the first eight characters of the identifier.
fn short_code_for(id: &Uuid) -> String {
    id.simple().to_string()[..SHORT_CODE_LEN].to_owned()
}
