use std::sync::Arc;

use chrono::Utc;
use tracing::{info, info_span, warn};

use netwalker_filter::PostConnectInfo;
use netwalker_types::{Capability, DeviceStatus, DiscoveryMethod, DiscoveryProtocol, Endpoint, PendingNode};

use crate::collect::CollectOutcome;
use crate::engine::Shared;

/// What a worker reports back to the scheduling loop: whether it queued
/// any new frontier entries, which is what drives deadline-reset
/// accounting (spec §4.6 "Deadline reset").
pub(crate) struct WorkerOutcome {
    pub queued_new: bool,
}

/// One pass of spec §4.6 step 4: filter, depth check, connect, collect,
/// filter again, store, enqueue neighbors, done. Every early return has
/// already written its terminal disposition row before returning.
pub(crate) async fn run_worker(shared: Arc<Shared>, node: PendingNode) -> WorkerOutcome {
    let endpoint = node.endpoint.clone();
    let hostname = endpoint.identity_key();
    let span = info_span!("device", host = %hostname);
    let _enter = span.enter();

    if let Some(reason) = shared
        .filter
        .should_exclude_coarse(&hostname, endpoint.primary_ip)
    {
        record(&shared, &hostname, DeviceStatus::Filtered { reason: reason.message() }).await;
        return WorkerOutcome { queued_new: false };
    }

    if node.depth > shared.config.max_depth {
        record(
            &shared,
            &hostname,
            DeviceStatus::depth_exceeded(node.depth, shared.config.max_depth),
        )
        .await;
        return WorkerOutcome { queued_new: false };
    }

    let collector = shared.collector.clone();
    let credentials = shared.credentials.clone();
    let endpoint_for_blocking = endpoint.clone();
    let join_result =
        tokio::task::spawn_blocking(move || collector.collect(&endpoint_for_blocking, &credentials)).await;

    let collect_outcome = match join_result {
        Ok(outcome) => outcome,
        Err(join_err) => {
            record(
                &shared,
                &hostname,
                DeviceStatus::collect_failed(format!("worker task panicked: {join_err}")),
            )
            .await;
            return WorkerOutcome { queued_new: false };
        }
    };

    let report = match collect_outcome {
        CollectOutcome::ConnectFailed(reason) => {
            record(&shared, &hostname, DeviceStatus::connect_failed(reason)).await;
            return WorkerOutcome { queued_new: false };
        }
        CollectOutcome::CollectFailed(reason) => {
            record(&shared, &hostname, DeviceStatus::collect_failed(reason)).await;
            return WorkerOutcome { queued_new: false };
        }
        CollectOutcome::Report(report) => *report,
    };

    // Stage 2: platform/capability filter, now that the device has
    // answered. The device's own advertised capabilities are the union of
    // what its neighbors report seeing from it; `show version`/`show cdp
    // neighbors` never states a device's own capability set directly.
    let capabilities: Vec<Capability> = report
        .neighbors
        .iter()
        .flat_map(|neighbor| neighbor.capabilities.iter().copied())
        .collect();
    let post_connect = PostConnectInfo {
        platform: report.platform.as_str(),
        capabilities: &capabilities,
    };
    if let Some(reason) = shared.filter.should_exclude_post_connect(&post_connect) {
        record(
            &shared,
            &report.hostname,
            DeviceStatus::Filtered { reason: reason.message() },
        )
        .await;
        return WorkerOutcome { queued_new: false };
    }

    if let Err(err) = shared.store.store_report(&report).await {
        warn!(host = %report.hostname, error = %err, "store-error persisting device report");
    }
    info!(host = %report.hostname, partial = report.partial, "device collected");

    let mut queued_new = false;
    for neighbor in &report.neighbors {
        let host_field = neighbor
            .remote_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| neighbor.remote_hostname.clone());
        let mut neighbor_endpoint =
            Endpoint::new(host_field).with_hostname_hint(neighbor.remote_hostname.clone());
        if let Some(ip) = neighbor.remote_ip {
            neighbor_endpoint = neighbor_endpoint.with_ip(ip);
        }

        let depth = node.depth + 1;
        let key = neighbor_endpoint.identity_key();

        if depth > shared.config.max_depth {
            shared.frontier.mark_visited_without_enqueue(&key);
            record(&shared, &key, DeviceStatus::depth_exceeded(depth, shared.config.max_depth)).await;
            continue;
        }

        let method = match neighbor.protocol {
            DiscoveryProtocol::Cdp => DiscoveryMethod::Cdp,
            DiscoveryProtocol::Lldp => DiscoveryMethod::Lldp,
        };
        let pending = PendingNode::discovered(neighbor_endpoint, depth, report.hostname.clone(), method);
        if shared.frontier.try_enqueue(pending) {
            queued_new = true;
        }
    }

    WorkerOutcome { queued_new }
}

async fn record(shared: &Shared, hostname: &str, status: DeviceStatus) {
    if let Err(err) = shared.store.record_disposition(hostname, &status, Utc::now()).await {
        warn!(host = %hostname, error = %err, "store-error recording disposition");
    }
}
