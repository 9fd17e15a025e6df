use anyhow::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

use super::transport::{build_transport, ProxyTransport};
use super::ProxyRecord;

/// Process-lifetime map from raw proxy string to its transport.
///
/// Entries are built lazily and never evicted. Two callers racing on the same
/// missing key may both build a transport; the later insert wins and both
/// callers get a working transport, so the map never holds more than one per
/// key.
#[derive(Debug)]
pub struct TransportCache {
    timeout: Duration,
    entries: RwLock<HashMap<String, Arc<dyn ProxyTransport>>>,
    constructed: AtomicU64,
}

impl TransportCache {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            entries: RwLock::new(HashMap::new()),
            constructed: AtomicU64::new(0),
        }
    }

    pub fn get(&self, record: &ProxyRecord) -> Result<Arc<dyn ProxyTransport>> {
        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&record.raw)
        {
            return Ok(hit.clone());
        }

        let transport = build_transport(record, self.timeout)?;
        self.constructed.fetch_add(1, Ordering::Relaxed);
        debug!(
            proxy = transport.proxy_url(),
            scheme = transport.protocol().scheme(),
            "proxy transport built"
        );
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(record.raw.clone(), transport.clone());
        Ok(transport)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of transports built so far, including ones lost to a race.
    pub fn constructed(&self) -> u64 {
        self.constructed.load(Ordering::Relaxed)
    }
}
