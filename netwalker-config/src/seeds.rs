use std::net::Ipv4Addr;

use netwalker_types::Endpoint;

/// One line of a seed file, already classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedEntry {
    pub endpoint: Endpoint,
}

/// Parses the line-oriented seed file format:
///
/// - bare hostname
/// - `hostname:ip`
/// - bare IPv4 address
///
/// Blank lines and lines starting with `#` are ignored. Trailing
/// comma-separated fields after the first two are ignored.
pub fn parse_seed_file(text: &str) -> Vec<SeedEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_seed_line)
        .collect()
}

fn parse_seed_line(line: &str) -> Option<SeedEntry> {
    // Trailing comma-separated fields are ignored; only the first field
    // carries the hostname/ip/"hostname:ip" triple.
    let first_field = line.split(',').next()?.trim();
    if first_field.is_empty() {
        return None;
    }

    let endpoint = match first_field.split_once(':') {
        Some((hostname, ip)) => {
            let mut endpoint = Endpoint::new(hostname).with_hostname_hint(hostname);
            if let Ok(parsed_ip) = ip.trim().parse::<Ipv4Addr>() {
                endpoint = endpoint.with_ip(parsed_ip);
            }
            endpoint
        }
        None => match first_field.parse::<Ipv4Addr>() {
            Ok(ip) => Endpoint::new(first_field).with_ip(ip),
            Err(_) => Endpoint::new(first_field).with_hostname_hint(first_field),
        },
    };

    Some(SeedEntry { endpoint })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_hostname() {
        let entries = parse_seed_file("core-sw01\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].endpoint.hostname_hint.as_deref(), Some("core-sw01"));
        assert!(entries[0].endpoint.primary_ip.is_none());
    }

    #[test]
    fn parses_hostname_and_ip() {
        let entries = parse_seed_file("core-sw01:10.1.1.1\n");
        assert_eq!(
            entries[0].endpoint.primary_ip,
            Some("10.1.1.1".parse().unwrap())
        );
    }

    #[test]
    fn parses_bare_ip() {
        let entries = parse_seed_file("10.1.1.1\n");
        assert_eq!(
            entries[0].endpoint.primary_ip,
            Some("10.1.1.1".parse().unwrap())
        );
    }

    #[test]
    fn ignores_blank_and_comment_lines_and_trailing_fields() {
        let entries = parse_seed_file(
            "\n# a comment\ncore-sw01:10.1.1.1,site=HQ,note=ignored\n   \n",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].endpoint.primary_ip,
            Some("10.1.1.1".parse().unwrap())
        );
    }
}
