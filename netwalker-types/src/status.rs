/// The closed variant type that is the contract between the Discovery
/// Engine and the Inventory Store. Every device ends up represented by
/// exactly one final-disposition row, from the set {connected, filtered,
/// skipped, connect_failed, collect_failed, neighbor_only}.
///
/// Reasons are plain strings with stable prefixes, so downstream
/// automation can pattern-match on them without parsing a free-form enum.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DeviceStatus {
    Connected,
    Filtered { reason: String },
    Skipped { reason: String },
    ConnectFailed { reason: String },
    CollectFailed { reason: String },
    NeighborOnly,
}

impl DeviceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Connected => "connected",
            DeviceStatus::Filtered { .. } => "filtered",
            DeviceStatus::Skipped { .. } => "skipped",
            DeviceStatus::ConnectFailed { .. } => "connect_failed",
            DeviceStatus::CollectFailed { .. } => "collect_failed",
            DeviceStatus::NeighborOnly => "neighbor_only",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            DeviceStatus::Filtered { reason }
            | DeviceStatus::Skipped { reason }
            | DeviceStatus::ConnectFailed { reason }
            | DeviceStatus::CollectFailed { reason } => Some(reason),
            DeviceStatus::Connected | DeviceStatus::NeighborOnly => None,
        }
    }

    pub fn filtered_pattern(pattern_kind: &str) -> Self {
        DeviceStatus::Filtered {
            reason: format!("Filtered by {pattern_kind}"),
        }
    }

    pub fn filtered_post_connect(platform: &str, capabilities: &str) -> Self {
        DeviceStatus::Filtered {
            reason: format!("Filtered by platform ({platform}) or capabilities ({capabilities})"),
        }
    }

    pub fn depth_exceeded(depth: u32, max_depth: u32) -> Self {
        DeviceStatus::Skipped {
            reason: format!("Depth limit exceeded (depth {depth} > max {max_depth})"),
        }
    }

    pub fn connect_failed(classification: impl std::fmt::Display) -> Self {
        DeviceStatus::ConnectFailed {
            reason: format!("Connection failed: {classification}"),
        }
    }

    pub fn collect_failed(classification: impl std::fmt::Display) -> Self {
        DeviceStatus::CollectFailed {
            reason: format!("Collection failed: {classification}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_exceeded_reason_has_stable_wording() {
        let status = DeviceStatus::depth_exceeded(3, 2);
        assert_eq!(
            status.reason().unwrap(),
            "Depth limit exceeded (depth 3 > max 2)"
        );
        assert_eq!(status.label(), "skipped");
    }
}
