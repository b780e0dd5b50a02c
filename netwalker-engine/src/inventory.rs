//! The engine's seam onto the Inventory Store. Kept as a trait so the
//! scheduling loop can be exercised against a deterministic in-memory fake
//! instead of a live SQL Server connection.

use chrono::{DateTime, Utc};

use netwalker_types::{DeviceReport, DeviceStatus};

/// Everything the Discovery Engine needs to write. A `store-error` never
/// aborts the crawl (spec §7): callers log the `anyhow::Error` and move
/// on, they never propagate it out of a worker.
#[async_trait::async_trait]
pub trait InventoryWriter: Send + Sync {
    async fn store_report(&self, report: &DeviceReport) -> anyhow::Result<()>;

    async fn record_disposition(
        &self,
        hostname: &str,
        status: &DeviceStatus,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl InventoryWriter for netwalker_store::InventoryStore {
    async fn store_report(&self, report: &DeviceReport) -> anyhow::Result<()> {
        self.store_report(report).await?;
        Ok(())
    }

    async fn record_disposition(
        &self,
        hostname: &str,
        status: &DeviceStatus,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.record_disposition(hostname, status, now).await?;
        Ok(())
    }
}
