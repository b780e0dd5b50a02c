use crate::endpoint::Endpoint;

/// How a `PendingNode` entered the frontier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DiscoveryMethod {
    Seed,
    Cdp,
    Lldp,
}

/// An entry in the discovery frontier.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PendingNode {
    pub endpoint: Endpoint,
    pub depth: u32,
    pub parent_key: Option<String>,
    pub discovery_method: DiscoveryMethod,
}

impl PendingNode {
    pub fn seed(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            depth: 0,
            parent_key: None,
            discovery_method: DiscoveryMethod::Seed,
        }
    }

    pub fn discovered(
        endpoint: Endpoint,
        depth: u32,
        parent_key: impl Into<String>,
        method: DiscoveryMethod,
    ) -> Self {
        Self {
            endpoint,
            depth,
            parent_key: Some(parent_key.into()),
            discovery_method: method,
        }
    }

    pub fn identity_key(&self) -> String {
        self.endpoint.identity_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_nodes_start_at_depth_zero() {
        let node = PendingNode::seed(Endpoint::new("10.0.0.1"));
        assert_eq!(node.depth, 0);
        assert_eq!(node.discovery_method, DiscoveryMethod::Seed);
        assert!(node.parent_key.is_none());
    }
}
