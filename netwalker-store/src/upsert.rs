use chrono::{DateTime, Utc};
use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use netwalker_types::{DeviceReport, InterfaceType, Prefix, PrefixSource, PrefixSummary};

use crate::error::StoreError;

pub(crate) type Conn = Client<Compat<TcpStream>>;

const UNKNOWN_SERIAL: &str = "unknown";
const PLACEHOLDER_MODEL: &str = "Unwalked Neighbor";

/// Upserts a full `DeviceReport`: the device row itself (matching,
/// promoting, or inserting), then its versions, interfaces, VLANs, and the
/// primary-management-IP synthetic interface row. Returns the device_id.
pub async fn upsert_device_report(conn: &mut Conn, report: &DeviceReport) -> Result<i32, StoreError> {
    let now = Utc::now();
    let serial = report.primary_serial().unwrap_or(UNKNOWN_SERIAL).to_string();

    let device_id = match find_by_name_and_serial(conn, &report.hostname, &serial).await? {
        Some(id) => {
            update_device_metadata(conn, id, report, now).await?;
            id
        }
        None => match find_placeholder(conn, &report.hostname).await? {
            Some(placeholder_id) if serial != UNKNOWN_SERIAL => {
                promote_placeholder(conn, placeholder_id, report, now).await?;
                placeholder_id
            }
            _ => insert_device(conn, report, &serial, now).await?,
        },
    };

    upsert_version(conn, device_id, &report.software_version, now).await?;

    for interface in &report.interfaces {
        upsert_interface(
            conn,
            device_id,
            &interface.name,
            interface.ipv4.map(|c| c.address().to_string()),
            interface.ipv4.map(|c| c.mask()),
            interface.interface_type,
            now,
        )
        .await?;
    }

    if let Some(ip) = report.primary_ip.filter(|ip| !ip.is_unspecified()) {
        upsert_interface(
            conn,
            device_id,
            "Primary Management",
            Some(ip.to_string()),
            None,
            InterfaceType::Management,
            now,
        )
        .await?;
    }

    for vlan in &report.vlans {
        upsert_vlan(conn, device_id, vlan.number, &vlan.name, vlan.port_count, now).await?;
    }

    Ok(device_id)
}

async fn find_by_name_and_serial(
    conn: &mut Conn,
    hostname: &str,
    serial: &str,
) -> Result<Option<i32>, StoreError> {
    let rows = conn
        .query(
            "SELECT device_id FROM devices WHERE device_name = @P1 AND serial_number = @P2",
            &[&hostname, &serial],
        )
        .await?
        .into_first_result()
        .await?;
    Ok(rows.first().and_then(|row| row.get::<i32, _>("device_id")))
}

async fn find_by_name(conn: &mut Conn, hostname: &str) -> Result<Option<i32>, StoreError> {
    let rows = conn
        .query(
            "SELECT device_id FROM devices WHERE device_name = @P1",
            &[&hostname],
        )
        .await?
        .into_first_result()
        .await?;
    Ok(rows.first().and_then(|row| row.get::<i32, _>("device_id")))
}

async fn find_placeholder(conn: &mut Conn, hostname: &str) -> Result<Option<i32>, StoreError> {
    let rows = conn
        .query(
            "SELECT device_id FROM devices WHERE device_name = @P1 AND serial_number = @P2 AND hardware_model = @P3",
            &[&hostname, &UNKNOWN_SERIAL, &PLACEHOLDER_MODEL],
        )
        .await?
        .into_first_result()
        .await?;
    Ok(rows.first().and_then(|row| row.get::<i32, _>("device_id")))
}

async fn update_device_metadata(
    conn: &mut Conn,
    device_id: i32,
    report: &DeviceReport,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE devices SET platform = @P1, hardware_model = @P2, status = @P3, status_reason = NULL, last_seen = @P4 WHERE device_id = @P5",
        &[
            &report.platform.as_str(),
            &report.hardware_model.as_str(),
            &"connected",
            &now,
            &device_id,
        ],
    )
    .await?;
    Ok(())
}

/// Replaces a placeholder row's identity fields in place, preserving
/// `first_seen`. Child rows already attached to the placeholder (by
/// `device_id` foreign key) automatically become the promoted row's
/// children — no row moves are needed.
async fn promote_placeholder(
    conn: &mut Conn,
    device_id: i32,
    report: &DeviceReport,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let serial = report.primary_serial().unwrap_or(UNKNOWN_SERIAL);
    conn.execute(
        "UPDATE devices SET serial_number = @P1, platform = @P2, hardware_model = @P3, status = @P4, status_reason = NULL, last_seen = @P5 WHERE device_id = @P6",
        &[
            &serial,
            &report.platform.as_str(),
            &report.hardware_model.as_str(),
            &"connected",
            &now,
            &device_id,
        ],
    )
    .await?;
    Ok(())
}

async fn insert_device(
    conn: &mut Conn,
    report: &DeviceReport,
    serial: &str,
    now: DateTime<Utc>,
) -> Result<i32, StoreError> {
    let rows = conn
        .query(
            "INSERT INTO devices (device_name, serial_number, platform, hardware_model, status, first_seen, last_seen)
             OUTPUT INSERTED.device_id
             VALUES (@P1, @P2, @P3, @P4, @P5, @P6, @P6)",
            &[
                &report.hostname.as_str(),
                &serial,
                &report.platform.as_str(),
                &report.hardware_model.as_str(),
                &"connected",
                &now,
            ],
        )
        .await?
        .into_row()
        .await?
        .ok_or_else(|| StoreError::Query("insert did not return a device_id".to_string()))?;
    rows.get::<i32, _>("device_id")
        .ok_or_else(|| StoreError::Query("device_id column missing from insert result".to_string()))
}

/// Ensures a placeholder device row exists for `hostname`, creating one if
/// absent. Used by neighbor-link upsert when a neighbor has not yet been
/// collected itself.
pub async fn ensure_placeholder(conn: &mut Conn, hostname: &str, now: DateTime<Utc>) -> Result<i32, StoreError> {
    if let Some(id) = find_by_name_and_serial(conn, hostname, UNKNOWN_SERIAL).await? {
        return Ok(id);
    }
    let rows = conn
        .query(
            "INSERT INTO devices (device_name, serial_number, platform, hardware_model, status, first_seen, last_seen)
             OUTPUT INSERTED.device_id
             VALUES (@P1, @P2, @P3, @P4, @P5, @P6, @P6)",
            &[
                &hostname,
                &UNKNOWN_SERIAL,
                &"Unknown",
                &PLACEHOLDER_MODEL,
                &"neighbor_only",
                &now,
            ],
        )
        .await?
        .into_row()
        .await?
        .ok_or_else(|| StoreError::Query("placeholder insert did not return a device_id".to_string()))?;
    rows.get::<i32, _>("device_id")
        .ok_or_else(|| StoreError::Query("device_id column missing from placeholder insert".to_string()))
}

async fn upsert_version(
    conn: &mut Conn,
    device_id: i32,
    version: &str,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let updated = conn
        .execute(
            "UPDATE device_versions SET last_seen = @P1 WHERE device_id = @P2 AND software_version = @P3",
            &[&now, &device_id, &version],
        )
        .await?
        .total();
    if updated == 0 {
        conn.execute(
            "INSERT INTO device_versions (device_id, software_version, first_seen, last_seen) VALUES (@P1, @P2, @P3, @P3)",
            &[&device_id, &version, &now],
        )
        .await?;
    }
    Ok(())
}

async fn upsert_interface(
    conn: &mut Conn,
    device_id: i32,
    name: &str,
    ip: Option<String>,
    mask: Option<u8>,
    interface_type: InterfaceType,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let type_str = interface_type_label(interface_type);
    let mask = mask.map(i32::from);
    let updated = conn
        .execute(
            "UPDATE device_interfaces SET last_seen = @P1, subnet_mask = @P2 WHERE device_id = @P3 AND interface_name = @P4 AND ip_address = @P5",
            &[&now, &mask, &device_id, &name, &ip],
        )
        .await?
        .total();
    if updated == 0 {
        conn.execute(
            "INSERT INTO device_interfaces (device_id, interface_name, ip_address, subnet_mask, interface_type, first_seen, last_seen)
             VALUES (@P1, @P2, @P3, @P4, @P5, @P6, @P6)",
            &[&device_id, &name, &ip, &mask, &type_str, &now],
        )
        .await?;
    }
    Ok(())
}

fn interface_type_label(interface_type: InterfaceType) -> &'static str {
    match interface_type {
        InterfaceType::Physical => "physical",
        InterfaceType::Loopback => "loopback",
        InterfaceType::Vlan => "vlan",
        InterfaceType::Tunnel => "tunnel",
        InterfaceType::Management => "management",
        InterfaceType::PortChannel => "port-channel",
    }
}

async fn upsert_vlan(
    conn: &mut Conn,
    device_id: i32,
    number: u16,
    name: &str,
    port_count: Option<u32>,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let updated = conn
        .execute(
            "UPDATE vlans SET last_seen = @P1 WHERE vlan_number = @P2 AND vlan_name = @P3",
            &[&now, &(number as i32), &name],
        )
        .await?
        .total();
    if updated == 0 {
        conn.execute(
            "INSERT INTO vlans (vlan_number, vlan_name, first_seen, last_seen) VALUES (@P1, @P2, @P3, @P3)",
            &[&(number as i32), &name, &now],
        )
        .await?;
    }

    let existing_name: Option<String> = conn
        .query(
            "SELECT vlan_name FROM device_vlans WHERE device_id = @P1 AND vlan_number = @P2",
            &[&device_id, &(number as i32)],
        )
        .await?
        .into_first_result()
        .await?
        .first()
        .and_then(|row| row.get::<&str, _>("vlan_name").map(str::to_string));

    match existing_name {
        Some(ref current) if current == name => {
            conn.execute(
                "UPDATE device_vlans SET last_seen = @P1, port_count = @P2 WHERE device_id = @P3 AND vlan_number = @P4",
                &[&now, &port_count.map(|c| c as i32), &device_id, &(number as i32)],
            )
            .await?;
        }
        Some(_) => {
            conn.execute(
                "DELETE FROM device_vlans WHERE device_id = @P1 AND vlan_number = @P2",
                &[&device_id, &(number as i32)],
            )
            .await?;
            conn.execute(
                "INSERT INTO device_vlans (device_id, vlan_number, vlan_name, port_count, first_seen, last_seen)
                 VALUES (@P1, @P2, @P3, @P4, @P5, @P5)",
                &[&device_id, &(number as i32), &name, &port_count.map(|c| c as i32), &now],
            )
            .await?;
        }
        None => {
            conn.execute(
                "INSERT INTO device_vlans (device_id, vlan_number, vlan_name, port_count, first_seen, last_seen)
                 VALUES (@P1, @P2, @P3, @P4, @P5, @P5)",
                &[&device_id, &(number as i32), &name, &port_count.map(|c| c as i32), &now],
            )
            .await?;
        }
    }
    Ok(())
}

fn prefix_source_label(source: PrefixSource) -> &'static str {
    match source {
        PrefixSource::Rib => "rib",
        PrefixSource::Connected => "connected",
        PrefixSource::Bgp => "bgp",
    }
}

/// Upserts one routed IPv4 prefix observed on a device, keyed on
/// (device, vrf, prefix, source) per spec §4.8 step 8.
pub(crate) async fn upsert_prefix(conn: &mut Conn, device_id: i32, prefix: &Prefix, now: DateTime<Utc>) -> Result<(), StoreError> {
    let cidr = prefix.cidr.to_string();
    let source = prefix_source_label(prefix.source);
    let protocol_code = prefix.protocol_code.map(|c| c.to_string());
    let updated = conn
        .execute(
            "UPDATE ipv4_prefixes SET last_seen = @P1, protocol_code = @P2
             WHERE device_id = @P3 AND vrf = @P4 AND prefix = @P5 AND source = @P6",
            &[&now, &protocol_code, &device_id, &prefix.vrf, &cidr, &source],
        )
        .await?
        .total();
    if updated == 0 {
        conn.execute(
            "INSERT INTO ipv4_prefixes (device_id, vrf, prefix, source, protocol_code, first_seen, last_seen)
             VALUES (@P1, @P2, @P3, @P4, @P5, @P6, @P6)",
            &[&device_id, &prefix.vrf, &cidr, &source, &protocol_code, &now],
        )
        .await?;
    }
    Ok(())
}

/// Upserts one summary→component relationship within a device's VRF (spec
/// §4.8 step 9).
pub(crate) async fn upsert_prefix_summary(
    conn: &mut Conn,
    device_id: i32,
    summary: &PrefixSummary,
) -> Result<(), StoreError> {
    let summary_cidr = summary.summary.to_string();
    let component_cidr = summary.component.to_string();
    let rows = conn
        .query(
            "SELECT 1 FROM ipv4_prefix_summarization
             WHERE device_id = @P1 AND vrf = @P2 AND summary_prefix = @P3 AND component_prefix = @P4",
            &[&device_id, &summary.vrf, &summary_cidr, &component_cidr],
        )
        .await?
        .into_first_result()
        .await?;
    if rows.is_empty() {
        conn.execute(
            "INSERT INTO ipv4_prefix_summarization (device_id, vrf, summary_prefix, component_prefix)
             VALUES (@P1, @P2, @P3, @P4)",
            &[&device_id, &summary.vrf, &summary_cidr, &component_cidr],
        )
        .await?;
    }
    Ok(())
}

/// Upserts one neighbor link. Resolves the remote hostname to a device_id
/// (creating a placeholder if needed), computes the canonical direction
/// (smaller device_id is source), and either refreshes an existing row
/// (checking both the canonical and swapped pair) or inserts one.
pub async fn upsert_neighbor(
    conn: &mut Conn,
    local_device_id: i32,
    local_interface: &str,
    remote_hostname: &str,
    remote_interface: &str,
    protocol: &str,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let remote_id = match find_by_name_and_serial(conn, remote_hostname, UNKNOWN_SERIAL).await? {
        Some(id) => id,
        None => ensure_placeholder(conn, remote_hostname, now).await?,
    };

    let (source_id, source_iface, dest_id, dest_iface) = if local_device_id <= remote_id {
        (local_device_id, local_interface, remote_id, remote_interface)
    } else {
        (remote_id, remote_interface, local_device_id, local_interface)
    };

    let updated = conn
        .execute(
            "UPDATE device_neighbors SET last_seen = @P1
             WHERE (source_device_id = @P2 AND source_interface = @P3 AND destination_device_id = @P4 AND destination_interface = @P5)
                OR (source_device_id = @P4 AND source_interface = @P5 AND destination_device_id = @P2 AND destination_interface = @P3)",
            &[&now, &source_id, &source_iface, &dest_id, &dest_iface],
        )
        .await?
        .total();

    if updated == 0 {
        conn.execute(
            "INSERT INTO device_neighbors (source_device_id, source_interface, destination_device_id, destination_interface, protocol, first_seen, last_seen)
             VALUES (@P1, @P2, @P3, @P4, @P5, @P6, @P6)",
            &[&source_id, &source_iface, &dest_id, &dest_iface, &protocol, &now],
        )
        .await?;
    }

    Ok(())
}

/// Records a terminal, non-`connected` disposition (filtered, skipped,
/// connect_failed, collect_failed) for `hostname`. Looks the device up by
/// name alone first — a device reached again by a longer or re-filtered
/// path after already being walked successfully still updates its one
/// existing row instead of spawning a duplicate. Only a hostname with no
/// `devices` row at all gets the placeholder sentinel (serial `unknown`,
/// model `Unwalked Neighbor`), which later promotion still goes through.
pub async fn upsert_disposition(
    conn: &mut Conn,
    hostname: &str,
    status: &str,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    if let Some(id) = find_by_name(conn, hostname).await? {
        conn.execute(
            "UPDATE devices SET status = @P1, status_reason = @P2, last_seen = @P3 WHERE device_id = @P4",
            &[&status, &reason, &now, &id],
        )
        .await?;
        return Ok(());
    }

    conn.execute(
        "INSERT INTO devices (device_name, serial_number, platform, hardware_model, status, status_reason, first_seen, last_seen)
         VALUES (@P1, @P2, @P3, @P4, @P5, @P6, @P7, @P7)",
        &[
            &hostname,
            &UNKNOWN_SERIAL,
            &"Unknown",
            &PLACEHOLDER_MODEL,
            &status,
            &reason,
            &now,
        ],
    )
    .await?;
    Ok(())
}
