//! Platform-aware extraction of device identity, interfaces, VLANs,
//! neighbors, routed prefixes, and stack membership from Cisco CLI text.
//!
//! Each submodule owns one `show` command family and is independently
//! testable against realistic fixture text. Parsers never panic on
//! malformed input; a line or block that cannot be understood is either
//! skipped or, where the caller needs to know collection was incomplete,
//! reported back as a soft exception string alongside the records that did
//! parse.

mod identity;
mod interfaces;
mod inventory;
mod neighbors;
mod prefix;
mod stack;
mod vlan;

pub use identity::{detect_platform, extract_hostname, parse_identity};
pub use interfaces::parse_interfaces;
pub use inventory::{extract_primary_model, extract_serials};
pub use neighbors::{parse_cdp_neighbors, parse_lldp_neighbors};
pub use prefix::{
    parse_bgp_line, parse_route_line, parse_route_table, parse_vrf_names, sanitize_vrf_name,
    AmbiguousPrefix,
};
pub use stack::{parse_show_mod, parse_show_switch};
pub use vlan::parse_vlans;
