//! Idempotent inventory persistence: device upserts, bidirectional link
//! dedup, VLAN-name reconciliation, and stale-row GC, backed by SQL Server
//! through `tiberius`/`bb8`.
//!
//! `InventoryStore` is the only writer of on-disk rows. Report writers and
//! the web query interface (out of scope here) may open independent
//! read-only connections of their own against the same database.

mod error;
mod pool;
mod schema;
mod upsert;

use chrono::{DateTime, Utc};

use netwalker_types::{DeviceReport, DeviceStatus, DiscoveryProtocol};

pub use error::StoreError;
pub use pool::{build_pool, DatabaseConfig, DbPool};

/// Row counts by table, as surfaced by the `show-status` control-plane
/// command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub row_counts: Vec<(String, u64)>,
}

/// Owns the single writer connection pool for the inventory schema.
pub struct InventoryStore {
    pool: DbPool,
}

impl InventoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Runs the idempotent schema DDL. Safe to call against an
    /// already-initialized database.
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        for statement in schema::STATEMENTS {
            conn.execute(*statement, &[]).await?;
        }
        Ok(())
    }

    /// Persists a full `DeviceReport`: the device row itself (matching,
    /// promoting, or inserting), its versions/interfaces/VLANs, and one
    /// neighbor link per observed adjacency. Returns the device_id.
    pub async fn store_report(&self, report: &DeviceReport) -> Result<i32, StoreError> {
        let mut conn = self.pool.get().await?;
        let device_id = upsert::upsert_device_report(&mut conn, report).await?;

        for neighbor in &report.neighbors {
            let protocol = match neighbor.protocol {
                DiscoveryProtocol::Cdp => "cdp",
                DiscoveryProtocol::Lldp => "lldp",
            };
            upsert::upsert_neighbor(
                &mut conn,
                device_id,
                &neighbor.local_interface,
                &neighbor.remote_hostname,
                &neighbor.remote_interface,
                protocol,
                report.collected_at,
            )
            .await?;
        }

        for prefix in &report.prefixes {
            upsert::upsert_prefix(&mut conn, device_id, prefix, report.collected_at).await?;
        }

        for summary in &report.prefix_summaries {
            upsert::upsert_prefix_summary(&mut conn, device_id, summary).await?;
        }

        Ok(device_id)
    }

    /// Records a terminal, non-`connected` disposition for a device that
    /// never produced a full report: filtered, skipped, connect-failed, or
    /// collect-failed. Every device named in any frontier or neighbor
    /// observation ends up with exactly one such row if it is never
    /// walked successfully (spec §7: "Absence from the store means the
    /// device was never observed").
    pub async fn record_disposition(
        &self,
        hostname: &str,
        status: &DeviceStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if hostname.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await?;
        upsert::upsert_disposition(&mut conn, hostname, status.label(), status.reason(), now).await
    }

    /// Full purge: deletes every row in dependency order (neighbors and
    /// child tables before devices) to honor referential integrity.
    pub async fn purge_all(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        conn.execute("DELETE FROM ipv4_prefix_summarization", &[]).await?;
        conn.execute("DELETE FROM ipv4_prefixes", &[]).await?;
        conn.execute("DELETE FROM device_vlans", &[]).await?;
        conn.execute("DELETE FROM device_versions", &[]).await?;
        conn.execute("DELETE FROM device_interfaces", &[]).await?;
        conn.execute("DELETE FROM device_neighbors", &[]).await?;
        conn.execute("DELETE FROM devices", &[]).await?;
        conn.execute("DELETE FROM vlans", &[]).await?;
        Ok(())
    }

    /// Hard-deletes devices marked `status = 'purge'`. Neighbor rows
    /// referencing them are removed first: the destination foreign key
    /// carries no cascade, so a destination placeholder must be orphaned
    /// before its device row can go.
    pub async fn purge_marked(&self) -> Result<u64, StoreError> {
        let mut conn = self.pool.get().await?;
        conn.execute(
            "DELETE FROM device_neighbors WHERE source_device_id IN (SELECT device_id FROM devices WHERE status = 'purge')
                OR destination_device_id IN (SELECT device_id FROM devices WHERE status = 'purge')",
            &[],
        )
        .await?;
        let result = conn
            .execute("DELETE FROM devices WHERE status = 'purge'", &[])
            .await?;
        Ok(result.total())
    }

    /// `cleanup_stale_links(days)`: removes links whose `last_seen` is
    /// older than `days` days ago.
    pub async fn cleanup_stale_links(&self, days: i64) -> Result<u64, StoreError> {
        let mut conn = self.pool.get().await?;
        let cutoff = Utc::now() - chrono::Duration::days(days);
        let result = conn
            .execute("DELETE FROM device_neighbors WHERE last_seen < @P1", &[&cutoff])
            .await?;
        Ok(result.total())
    }

    /// `show-status`: row counts by table.
    pub async fn show_status(&self) -> Result<StatusReport, StoreError> {
        let mut conn = self.pool.get().await?;
        let mut row_counts = Vec::new();
        for table in [
            "devices",
            "device_versions",
            "device_interfaces",
            "vlans",
            "device_vlans",
            "device_neighbors",
            "ipv4_prefixes",
        ] {
            let rows = conn
                .query(format!("SELECT COUNT(*) AS row_count FROM {table}"), &[])
                .await?
                .into_first_result()
                .await?;
            let count = rows
                .first()
                .and_then(|row| row.get::<i32, _>("row_count"))
                .unwrap_or(0);
            row_counts.push((table.to_string(), count as u64));
        }
        Ok(StatusReport { row_counts })
    }

    /// Database-driven discovery, "re-walk stale" mode: active,
    /// non-placeholder devices not seen within `days` days.
    pub async fn seed_stale(&self, days: i64) -> Result<Vec<String>, StoreError> {
        let mut conn = self.pool.get().await?;
        let cutoff = Utc::now() - chrono::Duration::days(days);
        let rows = conn
            .query(
                "SELECT device_name FROM devices
                 WHERE last_seen < @P1 AND serial_number <> 'unknown' AND status <> 'purge'",
                &[&cutoff],
            )
            .await?
            .into_first_result()
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get::<&str, _>("device_name").map(str::to_string))
            .collect())
    }

    /// Database-driven discovery, "walk unwalked" mode: every placeholder
    /// device observed only as a neighbor.
    pub async fn seed_unwalked(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = conn
            .query(
                "SELECT device_name FROM devices WHERE serial_number = 'unknown' AND hardware_model = 'Unwalked Neighbor'",
                &[],
            )
            .await?
            .into_first_result()
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get::<&str, _>("device_name").map(str::to_string))
            .collect())
    }
}
