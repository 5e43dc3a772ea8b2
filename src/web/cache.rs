// Time-bounded memoization of the last good report.
//
// There is one global feed, so the cache has a single slot and no key.
// Failures are never cached: the next request runs the pipeline again.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::report::schema::TrendReport;

/// A report and when it was produced.
#[derive(Debug, Clone)]
pub struct CachedReport {
    pub report: TrendReport,
    pub generated_at: DateTime<Utc>,
    stored_at: Instant,
}

/// Single-slot report cache. A zero TTL disables it.
pub struct ReportCache {
    ttl: Duration,
    slot: RwLock<Option<CachedReport>>,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// The cached report, if one exists and is younger than the TTL.
    pub async fn get(&self) -> Option<CachedReport> {
        if !self.is_enabled() {
            return None;
        }
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .cloned()
    }

    /// Store a fresh report, replacing whatever was there.
    pub async fn put(&self, report: TrendReport) -> CachedReport {
        let entry = CachedReport {
            report,
            generated_at: Utc::now(),
            stored_at: Instant::now(),
        };
        if self.is_enabled() {
            *self.slot.write().await = Some(entry.clone());
        }
        entry
    }
}
