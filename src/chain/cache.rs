//! Owned, time-bounded cache of invoice lookups.
//!
//! The cache is an explicit value owned by whoever performs lookups and is
//! passed by reference. Entries expire after a fixed TTL and can be dropped
//! manually; there is no process-wide instance.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::chain::contract::InvoiceRegistry;
use crate::chain::types::{ChainResult, InvoiceRecord};
use crate::observability::metrics;

#[derive(Debug, Clone)]
struct CachedInvoice {
    record: InvoiceRecord,
    fetched_at: Instant,
}

/// TTL cache keyed by human identifier.
#[derive(Debug)]
pub struct InvoiceCache {
    entries: DashMap<String, CachedInvoice>,
    ttl: Duration,
}

impl InvoiceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Cached record for `code` if it has not expired.
    pub fn get(&self, code: &str) -> Option<InvoiceRecord> {
        let entry = self.entries.get(code)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.record.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, code: &str, record: InvoiceRecord) {
        self.entries.insert(
            code.to_string(),
            CachedInvoice {
                record,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop a single entry so the next lookup goes to the ledger.
    pub fn invalidate(&self, code: &str) {
        self.entries.remove(code);
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serve `code` from the cache, refreshing from the registry when the
    /// entry is missing or stale.
    pub async fn get_or_fetch(
        &self,
        registry: &InvoiceRegistry<'_>,
        code: &str,
    ) -> ChainResult<InvoiceRecord> {
        if let Some(record) = self.get(code) {
            metrics::record_cache_lookup(true);
            return Ok(record);
        }
        metrics::record_cache_lookup(false);

        let record = registry.get_invoice(code).await?;
        self.insert(code, record.clone());
        Ok(record)
    }
}
