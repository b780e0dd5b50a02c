//! Pure include/exclude decisions over hostname, IP, platform, and
//! capability.
//!
//! These checks never touch I/O and always terminate.

use std::net::Ipv4Addr;

use glob::{MatchOptions, Pattern};
use netwalker_types::{Capability, Ipv4Cidr};

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Four independent exclusion lists; any hit excludes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub exclude_hostnames: Vec<String>,
    pub exclude_ip_ranges: Vec<String>,
    pub exclude_platforms: Vec<String>,
    pub exclude_capabilities: Vec<String>,
}

/// Stage-2 information only known after a successful collect.
#[derive(Clone, Debug, Default)]
pub struct PostConnectInfo<'a> {
    pub platform: &'a str,
    pub capabilities: &'a [Capability],
}

/// Why a device was excluded, for the skip-row reason text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExclusionReason {
    HostnameOrIp,
    PlatformOrCapability { platform: String, capabilities: String },
}

impl ExclusionReason {
    pub fn message(&self) -> String {
        match self {
            ExclusionReason::HostnameOrIp => {
                "Filtered by hostname or IP address pattern".to_string()
            }
            ExclusionReason::PlatformOrCapability {
                platform,
                capabilities,
            } => format!("Filtered by platform ({platform}) or capabilities ({capabilities})"),
        }
    }
}

impl FilterCriteria {
    /// Stage 1: coarse hostname/IP check applied to a `PendingNode`
    /// before any connection is attempted.
    pub fn should_exclude_coarse(&self, hostname: &str, ip: Option<Ipv4Addr>) -> Option<ExclusionReason> {
        let hostname_hit = self
            .exclude_hostnames
            .iter()
            .any(|pattern| glob_matches(pattern, hostname));

        let ip_hit = ip.is_some_and(|ip| {
            self.exclude_ip_ranges
                .iter()
                .any(|cidr| cidr_matches(cidr, ip))
        });

        (hostname_hit || ip_hit).then_some(ExclusionReason::HostnameOrIp)
    }

    /// Stage 2: platform/capability check applied after a successful
    /// collect.
    pub fn should_exclude_post_connect(&self, info: &PostConnectInfo<'_>) -> Option<ExclusionReason> {
        let platform_hit = self
            .exclude_platforms
            .iter()
            .any(|substr| info.platform.to_ascii_lowercase().contains(&substr.to_ascii_lowercase()));

        let capability_hit = info.capabilities.iter().any(|cap| {
            self.exclude_capabilities
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(cap.as_str()))
        });

        (platform_hit || capability_hit).then_some(ExclusionReason::PlatformOrCapability {
            platform: info.platform.to_string(),
            capabilities: info
                .capabilities
                .iter()
                .map(Capability::as_str)
                .collect::<Vec<_>>()
                .join(","),
        })
    }
}

fn glob_matches(pattern: &str, hostname: &str) -> bool {
    Pattern::new(pattern)
        .map(|p| p.matches_with(hostname, GLOB_OPTIONS))
        .unwrap_or(false)
}

fn cidr_matches(cidr: &str, ip: Ipv4Addr) -> bool {
    cidr.parse::<Ipv4Cidr>()
        .map(|parsed| parsed.contains(ip))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> FilterCriteria {
        FilterCriteria {
            exclude_hostnames: vec!["*-PHONE-*".to_string()],
            exclude_ip_ranges: vec!["10.99.0.0/16".to_string()],
            exclude_platforms: vec!["IP Phone".to_string()],
            exclude_capabilities: vec!["host phone".to_string()],
        }
    }

    #[test]
    fn hostname_glob_is_case_insensitive() {
        let c = criteria();
        assert!(c
            .should_exclude_coarse("lab-phone-01", None)
            .is_some());
        assert!(c.should_exclude_coarse("core-sw01", None).is_none());
    }

    #[test]
    fn ip_range_match_requires_ipv4() {
        let c = criteria();
        assert!(c
            .should_exclude_coarse("whatever", Some("10.99.5.5".parse().unwrap()))
            .is_some());
        assert!(c
            .should_exclude_coarse("whatever", Some("10.1.1.1".parse().unwrap()))
            .is_none());
    }

    #[test]
    fn platform_substring_match() {
        let c = criteria();
        let info = PostConnectInfo {
            platform: "Cisco IP Phone 7841",
            capabilities: &[],
        };
        assert!(c.should_exclude_post_connect(&info).is_some());
    }

    #[test]
    fn capability_match_is_exact_not_substring() {
        let c = criteria();
        // "phone" as an actual capability value must NOT match the
        // compound exclusion-list entry "host phone": capability matching
        // is exact equality, not substring containment.
        let info = PostConnectInfo {
            platform: "Cisco IOS",
            capabilities: &[Capability::Phone],
        };
        assert!(c.should_exclude_post_connect(&info).is_none());
    }

    #[test]
    fn capability_match_is_case_insensitive_exact() {
        let c = FilterCriteria {
            exclude_capabilities: vec!["Phone".to_string()],
            ..Default::default()
        };
        let info = PostConnectInfo {
            platform: "Cisco IOS",
            capabilities: &[Capability::Phone],
        };
        assert!(c.should_exclude_post_connect(&info).is_some());
    }

    #[test]
    fn malformed_cidr_never_panics_and_never_matches() {
        let c = FilterCriteria {
            exclude_ip_ranges: vec!["not-a-cidr".to_string()],
            ..Default::default()
        };
        assert!(c
            .should_exclude_coarse("host", Some("10.0.0.1".parse().unwrap()))
            .is_none());
    }
}
