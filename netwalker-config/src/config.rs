use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("line {line}: expected `key = value` or `[section]`, got {text:?}")]
    Malformed { line: usize, text: String },
    #[error("unknown section {0:?}")]
    UnknownSection(String),
    #[error("{section}.{key}: cannot parse {value:?} ({reason})")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Subset of {CDP, LLDP} to parse, as set by `discovery.discovery_protocols`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscoveryProtocol {
    Cdp,
    Lldp,
}

/// `ssh` or `telnet`; fallback is always the other transport. Set via
/// `connection.preferred_method`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreferredTransport {
    Ssh,
    Telnet,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoverySection {
    pub max_depth: u32,
    pub concurrent_connections: usize,
    pub connection_timeout: Duration,
    pub discovery_timeout: Duration,
    pub discovery_protocols: Vec<DiscoveryProtocol>,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            max_depth: 3,
            concurrent_connections: 5,
            connection_timeout: Duration::from_secs(30),
            discovery_timeout: Duration::from_secs(3600),
            discovery_protocols: vec![DiscoveryProtocol::Cdp, DiscoveryProtocol::Lldp],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilteringSection {
    pub exclude_hostnames: Vec<String>,
    pub exclude_ip_ranges: Vec<String>,
    pub exclude_platforms: Vec<String>,
    pub exclude_capabilities: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionSection {
    pub ssh_port: u16,
    pub telnet_port: u16,
    pub preferred_method: PreferredTransport,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            ssh_port: 22,
            telnet_port: 23,
            preferred_method: PreferredTransport::Ssh,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputSection {
    pub reports_directory: String,
    pub site_boundary_pattern: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackSection {
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ipv4PrefixSection {
    pub enabled: bool,
    pub rib_enabled: bool,
    pub connected_enabled: bool,
    pub bgp_enabled: bool,
    pub concurrent_connections: usize,
    pub timeout: Duration,
}

impl Default for Ipv4PrefixSection {
    fn default() -> Self {
        Self {
            enabled: false,
            rib_enabled: true,
            connected_enabled: true,
            bgp_enabled: true,
            concurrent_connections: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatabaseSection {
    pub enabled: bool,
    pub server: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub trust_server_certificate: bool,
    pub connection_timeout: Duration,
    pub command_timeout: Duration,
}

/// A fully-parsed `netwalker.conf`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub discovery: DiscoverySection,
    pub filtering: FilteringSection,
    pub connection: ConnectionSection,
    pub output: OutputSection,
    pub stack: StackSection,
    pub ipv4_prefix: Ipv4PrefixSection,
    pub database: DatabaseSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery: DiscoverySection::default(),
            filtering: FilteringSection::default(),
            connection: ConnectionSection::default(),
            output: OutputSection::default(),
            stack: StackSection::default(),
            ipv4_prefix: Ipv4PrefixSection::default(),
            database: DatabaseSection {
                connection_timeout: Duration::from_secs(30),
                command_timeout: Duration::from_secs(30),
                ..Default::default()
            },
        }
    }
}

type RawSections = BTreeMap<String, BTreeMap<String, String>>;

/// Parses the INI-style sectioned `key = value` text format.
///
/// Lines are one of: blank, a `# comment` or `; comment`, a `[section]`
/// header, or a `key = value` pair scoped to the most recent header. Unknown
/// sections and keys are rejected so that a typo in a config file fails
/// loudly instead of silently keeping a default.
pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    let raw = parse_raw_sections(text)?;
    let mut config = Config::default();

    for (section, keys) in &raw {
        match section.as_str() {
            "discovery" => apply_discovery(&mut config.discovery, keys)?,
            "filtering" => apply_filtering(&mut config.filtering, keys),
            "connection" => apply_connection(&mut config.connection, keys)?,
            "output" => apply_output(&mut config.output, keys),
            "stack" => apply_stack(&mut config.stack, keys)?,
            "ipv4_prefix" => apply_ipv4_prefix(&mut config.ipv4_prefix, keys)?,
            "database" => apply_database(&mut config.database, keys)?,
            other => return Err(ConfigError::UnknownSection(other.to_string())),
        }
    }

    Ok(config)
}

fn parse_raw_sections(text: &str) -> Result<RawSections, ConfigError> {
    let mut sections: RawSections = BTreeMap::new();
    let mut current: Option<String> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(inner) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            current = Some(inner.trim().to_ascii_lowercase());
            sections.entry(current.clone().unwrap()).or_default();
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::Malformed {
                line: idx + 1,
                text: raw_line.to_string(),
            });
        };
        let Some(section) = current.as_ref() else {
            return Err(ConfigError::Malformed {
                line: idx + 1,
                text: raw_line.to_string(),
            });
        };
        sections
            .get_mut(section)
            .expect("section inserted on header")
            .insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    Ok(sections)
}

fn invalid(section: &str, key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_u32(section: &str, key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(section, key, value, e.to_string()))
}

fn parse_usize(section: &str, key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(section, key, value, e.to_string()))
}

fn parse_u16(section: &str, key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(section, key, value, e.to_string()))
}

fn parse_secs(section: &str, key: &str, value: &str) -> Result<Duration, ConfigError> {
    parse_u64(section, key, value).map(Duration::from_secs)
}

fn parse_u64(section: &str, key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(section, key, value, e.to_string()))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "expected a boolean")),
    }
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn apply_discovery(
    out: &mut DiscoverySection,
    keys: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    for (key, value) in keys {
        match key.as_str() {
            "max_depth" => out.max_depth = parse_u32("discovery", key, value)?,
            "concurrent_connections" => {
                out.concurrent_connections = parse_usize("discovery", key, value)?
            }
            "connection_timeout" => out.connection_timeout = parse_secs("discovery", key, value)?,
            "discovery_timeout" => out.discovery_timeout = parse_secs("discovery", key, value)?,
            "discovery_protocols" => {
                out.discovery_protocols = split_csv(value)
                    .into_iter()
                    .map(|token| match token.to_ascii_uppercase().as_str() {
                        "CDP" => Ok(DiscoveryProtocol::Cdp),
                        "LLDP" => Ok(DiscoveryProtocol::Lldp),
                        _ => Err(invalid("discovery", key, value, "expected CDP or LLDP")),
                    })
                    .collect::<Result<_, _>>()?
            }
            other => return Err(invalid("discovery", other, value, "unknown key")),
        }
    }
    Ok(())
}

fn apply_filtering(out: &mut FilteringSection, keys: &BTreeMap<String, String>) {
    for (key, value) in keys {
        match key.as_str() {
            "exclude_hostnames" => out.exclude_hostnames = split_csv(value),
            "exclude_ip_ranges" => out.exclude_ip_ranges = split_csv(value),
            "exclude_platforms" => out.exclude_platforms = split_csv(value),
            "exclude_capabilities" => out.exclude_capabilities = split_csv(value),
            _ => {}
        }
    }
}

fn apply_connection(
    out: &mut ConnectionSection,
    keys: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    for (key, value) in keys {
        match key.as_str() {
            "ssh_port" => out.ssh_port = parse_u16("connection", key, value)?,
            "telnet_port" => out.telnet_port = parse_u16("connection", key, value)?,
            "preferred_method" => {
                out.preferred_method = match value.to_ascii_lowercase().as_str() {
                    "ssh" => PreferredTransport::Ssh,
                    "telnet" => PreferredTransport::Telnet,
                    _ => return Err(invalid("connection", key, value, "expected ssh or telnet")),
                }
            }
            other => return Err(invalid("connection", other, value, "unknown key")),
        }
    }
    Ok(())
}

fn apply_output(out: &mut OutputSection, keys: &BTreeMap<String, String>) {
    for (key, value) in keys {
        match key.as_str() {
            "reports_directory" => out.reports_directory = value.clone(),
            "site_boundary_pattern" => out.site_boundary_pattern = Some(value.clone()),
            _ => {}
        }
    }
}

fn apply_stack(out: &mut StackSection, keys: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (key, value) in keys {
        if key == "enabled" {
            out.enabled = parse_bool("stack", key, value)?;
        } else {
            return Err(invalid("stack", key, value, "unknown key"));
        }
    }
    Ok(())
}

fn apply_ipv4_prefix(
    out: &mut Ipv4PrefixSection,
    keys: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    for (key, value) in keys {
        match key.as_str() {
            "enabled" => out.enabled = parse_bool("ipv4_prefix", key, value)?,
            "rib_enabled" => out.rib_enabled = parse_bool("ipv4_prefix", key, value)?,
            "connected_enabled" => out.connected_enabled = parse_bool("ipv4_prefix", key, value)?,
            "bgp_enabled" => out.bgp_enabled = parse_bool("ipv4_prefix", key, value)?,
            "concurrent_connections" => {
                out.concurrent_connections = parse_usize("ipv4_prefix", key, value)?
            }
            "timeout" => out.timeout = parse_secs("ipv4_prefix", key, value)?,
            other => return Err(invalid("ipv4_prefix", other, value, "unknown key")),
        }
    }
    Ok(())
}

fn apply_database(
    out: &mut DatabaseSection,
    keys: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    for (key, value) in keys {
        match key.as_str() {
            "enabled" => out.enabled = parse_bool("database", key, value)?,
            "server" => out.server = value.clone(),
            "port" => out.port = parse_u16("database", key, value)?,
            "database" => out.database = value.clone(),
            "username" => out.username = value.clone(),
            "password" => out.password = value.clone(),
            "trust_server_certificate" => {
                out.trust_server_certificate = parse_bool("database", key, value)?
            }
            "connection_timeout" => out.connection_timeout = parse_secs("database", key, value)?,
            "command_timeout" => out.command_timeout = parse_secs("database", key, value)?,
            other => return Err(invalid("database", other, value, "unknown key")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_representative_config() {
        let text = r#"
            # comment
            [discovery]
            max_depth = 2
            concurrent_connections = 8
            connection_timeout = 15
            discovery_timeout = 1200
            discovery_protocols = CDP, LLDP

            [filtering]
            exclude_hostnames = *-PHONE-*, *-AP-*
            exclude_ip_ranges = 10.99.0.0/16
            exclude_platforms = IP Phone
            exclude_capabilities = phone

            [connection]
            preferred_method = telnet

            [stack]
            enabled = true

            [database]
            enabled = yes
            server = sqlhost
            port = 1433
        "#;

        let config = parse_config(text).unwrap();
        assert_eq!(config.discovery.max_depth, 2);
        assert_eq!(config.discovery.concurrent_connections, 8);
        assert_eq!(
            config.discovery.discovery_protocols,
            vec![DiscoveryProtocol::Cdp, DiscoveryProtocol::Lldp]
        );
        assert_eq!(
            config.filtering.exclude_hostnames,
            vec!["*-PHONE-*", "*-AP-*"]
        );
        assert_eq!(config.connection.preferred_method, PreferredTransport::Telnet);
        assert!(config.stack.enabled);
        assert!(config.database.enabled);
        assert_eq!(config.database.port, 1433);
    }

    #[test]
    fn defaults_when_section_absent() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn rejects_unknown_section() {
        assert!(matches!(
            parse_config("[bogus]\nkey = 1"),
            Err(ConfigError::UnknownSection(_))
        ));
    }

    #[test]
    fn rejects_unknown_key_in_known_section() {
        assert!(matches!(
            parse_config("[discovery]\nnonsense = 1"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_key_value_pair_before_any_section() {
        assert!(matches!(
            parse_config("max_depth = 1"),
            Err(ConfigError::Malformed { .. })
        ));
    }
}
