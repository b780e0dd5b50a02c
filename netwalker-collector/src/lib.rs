//! Drives the fixed per-platform command sequence against an already-open
//! `Session` and assembles the results into a `DeviceReport`.
//!
//! Every command in the sequence runs serially on one session; nothing in
//! this crate suspends except the `Session::execute` calls it makes.
//! Required commands that fail twice degrade the report to `partial`
//! rather than aborting; only a failed `show version` is terminal.

mod commands;
mod error;
mod prefixes;

use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use netwalker_connection::Session;
use netwalker_types::{DeviceReport, Platform};

pub use error::CollectError;
pub use prefixes::{PrefixOptions, PrefixResult};

use commands::{run_best_effort, run_with_retry};

#[derive(Clone, Debug)]
pub struct CollectOptions {
    pub read_timeout: Duration,
    pub collect_stack: bool,
    pub prefixes: PrefixOptions,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            collect_stack: false,
            prefixes: PrefixOptions::default(),
        }
    }
}

/// Runs the full command sequence and returns a `DeviceReport`, or a
/// terminal `CollectError` if `show version` could not be obtained or
/// parsed into a usable identity.
pub fn collect_device(session: &mut Session, options: &CollectOptions) -> Result<DeviceReport, CollectError> {
    run_best_effort(session, "terminal length 0", options.read_timeout);

    let show_version = run_with_retry(session, "show version", options.read_timeout)
        .map_err(|e| CollectError::VersionUnavailable(e.to_string()))?;
    let platform = netwalker_parser::detect_platform(&show_version);

    let mut partial = false;

    let show_inventory = match run_with_retry(session, "show inventory", options.read_timeout) {
        Ok(text) => text,
        Err(e) => {
            warn!(host = %session.host(), error = %e, "show inventory failed twice");
            partial = true;
            String::new()
        }
    };

    let identity = netwalker_parser::parse_identity(&show_version, &show_inventory)
        .ok_or(CollectError::IdentityUnparseable)?;

    let mut report = DeviceReport::new(identity, Utc::now());
    report.partial = partial;

    match run_with_retry(session, "show interfaces", options.read_timeout) {
        Ok(text) => report.interfaces = netwalker_parser::parse_interfaces(&text, platform),
        Err(e) => {
            warn!(host = %session.host(), error = %e, "show interfaces failed twice");
            report.partial = true;
        }
    }

    let vlan_command = if platform == Platform::Ios { "show vlan brief" } else { "show vlan" };
    match run_with_retry(session, vlan_command, options.read_timeout) {
        Ok(text) => report.vlans = netwalker_parser::parse_vlans(&text),
        Err(e) => {
            warn!(host = %session.host(), error = %e, "vlan listing failed twice");
            report.partial = true;
        }
    }

    match run_with_retry(session, "show cdp neighbors detail", options.read_timeout) {
        Ok(text) => {
            let (neighbors, _soft_errors) = netwalker_parser::parse_cdp_neighbors(&text, platform);
            report.neighbors.extend(neighbors);
        }
        Err(e) => {
            warn!(host = %session.host(), error = %e, "cdp neighbor collection failed twice");
            report.partial = true;
        }
    }

    match run_with_retry(session, "show lldp neighbors detail", options.read_timeout) {
        Ok(text) => {
            let (neighbors, _soft_errors) = netwalker_parser::parse_lldp_neighbors(&text, platform);
            report.neighbors.extend(neighbors);
        }
        Err(e) => {
            warn!(host = %session.host(), error = %e, "lldp neighbor collection failed twice");
            report.partial = true;
        }
    }

    if options.collect_stack {
        collect_stack_members(session, options, &mut report);
    }

    if options.prefixes.enabled {
        let result = prefixes::collect_prefixes(session, platform, &options.prefixes);
        report.prefixes = result.prefixes;
        report.prefix_summaries = result.summaries;
        report.prefix_exceptions = result.exceptions;
    }

    Ok(report)
}

/// Runs `show switch detail`, falling back to `show mod` when it returns no
/// members (VSS pairs surface this way on some platforms). Every member
/// inherits the parent's software version, since a stack runs one image.
fn collect_stack_members(session: &mut Session, options: &CollectOptions, report: &mut DeviceReport) {
    let mut members = match run_with_retry(session, "show switch detail", options.read_timeout) {
        Ok(text) => netwalker_parser::parse_show_switch(&text),
        Err(_) => Vec::new(),
    };

    if members.is_empty() {
        members = match run_with_retry(session, "show mod", options.read_timeout) {
            Ok(text) => netwalker_parser::parse_show_mod(&text),
            Err(_) => Vec::new(),
        };
    }

    // Stack members have no software_version field of their own: a stack
    // runs one IOS image, so report.software_version already covers them.
    report.stack_members = members;
}
