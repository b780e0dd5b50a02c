//! Shared data model for NetWalker: the value types that flow between the
//! Discovery Engine, Connection Manager, Protocol Parser, and Inventory Store.
//!
//! This crate is deliberately inert: no I/O, no async, no SQL. It exists so
//! that every other crate in the workspace can agree on the shape of an
//! `Endpoint`, a `DeviceReport`, or a `PendingNode` without depending on each
//! other.

mod cidr;
mod credentials;
mod device;
mod endpoint;
mod mac;
mod pending;
mod status;

pub use cidr::{Ipv4Cidr, Ipv4CidrError};
pub use credentials::Credentials;
pub use device::{
    Capability, DeviceIdentity, DeviceReport, DiscoveryProtocol, Interface, InterfaceType, Neighbor,
    Platform, Prefix, PrefixSource, PrefixSummary, StackMember, StackRole, Vlan,
};
pub use endpoint::{clean_hostname, Endpoint};
pub use mac::{MacAddress, MacAddressError};
pub use pending::{DiscoveryMethod, PendingNode};
pub use status::DeviceStatus;
