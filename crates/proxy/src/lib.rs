mod cache;
mod record;
mod transport;

pub use self::cache::TransportCache;
pub use self::record::{ProxyProtocol, ProxyRecord};
pub use self::transport::{build_transport, HttpProxyTransport, ProxyTransport, SocksTransport};

use anyhow::Result;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::warn;

/// Parsed proxy list for one cycle.
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    records: Vec<ProxyRecord>,
}

impl ProxyPool {
    /// Parses every line, skipping (and logging) malformed entries.
    pub fn parse(lines: &[String]) -> Self {
        let mut records = Vec::with_capacity(lines.len());
        for line in lines {
            match ProxyRecord::parse(line) {
                Ok(record) => records.push(record),
                Err(error) => warn!(proxy = %line, error = %error, "skipping malformed proxy"),
            }
        }
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Uniform random pick.
    pub fn choose(&self) -> Option<&ProxyRecord> {
        self.records.choose(&mut rand::thread_rng())
    }
}

/// A proxy picked for one outbound request together with its transport.
#[derive(Debug, Clone)]
pub struct ProxyRoute {
    pub record: ProxyRecord,
    pub transport: Arc<dyn ProxyTransport>,
}

/// Hands out a freshly selected proxy per request when rotation is on.
#[derive(Debug, Clone)]
pub struct ProxySelector {
    pool: Arc<ProxyPool>,
    cache: Arc<TransportCache>,
    rotate: bool,
}

impl ProxySelector {
    pub fn new(pool: Arc<ProxyPool>, cache: Arc<TransportCache>, rotate: bool) -> Self {
        Self {
            pool,
            cache,
            rotate,
        }
    }

    /// `Ok(None)` when rotation is disabled. An empty pool with rotation on is
    /// rejected before a cycle starts, so it surfaces here only as an error.
    pub fn next_route(&self) -> Result<Option<ProxyRoute>> {
        if !self.rotate {
            return Ok(None);
        }
        let record = self
            .pool
            .choose()
            .ok_or_else(|| anyhow::anyhow!("proxy rotation enabled but proxy pool is empty"))?
            .clone();
        let transport = self.cache.get(&record)?;
        Ok(Some(ProxyRoute { record, transport }))
    }
}
