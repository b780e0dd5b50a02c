use netwalker_types::{StackMember, StackRole};
use regex::Regex;
use std::sync::OnceLock;

fn switch_detail_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*\*?\s*(\d+)\s+(Master|Member|Standby)\s+\S+\s+\S+\s+\S+\s+\S+\s*$")
            .unwrap()
    })
}

fn switch_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^Switch\s+(\d+)\s*$").unwrap())
}

/// Returns, for each `Switch N` detail header, the member number and the
/// text running from just after that header to the start of the next one
/// (or end of input). `regex` has no look-around support, so the blocks
/// are carved out by header position rather than matched in one pattern.
fn switch_blocks(text: &str) -> Vec<(u8, &str)> {
    let headers: Vec<_> = switch_header_re().captures_iter(text).collect();
    headers
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let member_number = caps[1].parse::<u8>().ok()?;
            let start = caps.get(0).unwrap().end();
            let end = headers
                .get(i + 1)
                .map(|next| next.get(0).unwrap().start())
                .unwrap_or(text.len());
            Some((member_number, &text[start..end]))
        })
        .collect()
}

fn model_in_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*Model [Nn]umber\s*:\s*(\S+)").unwrap())
}

fn serial_in_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*Switch [Ss]erial [Nn]umber\s*:\s*(\S+)").unwrap())
}

fn role_from_str(s: &str) -> StackRole {
    match s.to_ascii_lowercase().as_str() {
        "master" => StackRole::Master,
        "standby" => StackRole::Standby,
        _ => StackRole::Member,
    }
}

/// Parses `show switch` / `show switch detail` (traditional StackWise).
/// Returns an empty list if the output carries no recognizable member
/// rows — the caller falls back to `show mod`. Role comes from the
/// summary table (`Switch#  Role ...`); model and serial come from each
/// switch's own `Switch N` detail block.
pub fn parse_show_switch(text: &str) -> Vec<StackMember> {
    let mut members = Vec::new();
    for caps in switch_detail_row_re().captures_iter(text) {
        let Ok(member_number) = caps[1].parse::<u8>() else {
            continue;
        };
        let role = role_from_str(&caps[2]);

        let blocks = switch_blocks(text);
        let block = blocks
            .iter()
            .find(|(n, _)| *n == member_number)
            .map(|(_, b)| *b)
            .unwrap_or("");

        let hardware_model = model_in_block_re()
            .captures(block)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let serial_number = serial_in_block_re()
            .captures(block)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "unknown".to_string());

        members.push(StackMember {
            member_number,
            role,
            hardware_model,
            serial_number,
        });
    }
    members
}

/// A serial matching `[A-Z]{3}\d{6}[A-Z]{2}` or `[A-Z]{3}\d{9}`.
fn looks_like_serial(s: &str) -> bool {
    serial_short_re().is_match(s) || serial_long_re().is_match(s)
}

fn serial_short_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}\d{6}[A-Z]{2}$").unwrap())
}

fn serial_long_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}\d{9}$").unwrap())
}

fn module_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(\d+)\s+\S+.*?\s+(\S+)\s+(\S+)\s*$").unwrap()
    })
}

/// Parses `show mod` for the Catalyst 4500-X / 6500 VSS fallback. Only
/// the first module section is parsed — anything from a MAC
/// address table or sub-module section onward is ignored. Exactly two
/// members with plausible serials are required; Switch 1 is Active,
/// Switch 2 is Standby. Returns an empty list if that shape is not met.
pub fn parse_show_mod(text: &str) -> Vec<StackMember> {
    // The column header row is always present and itself starts with "Mod",
    // so it's skipped unconditionally before scanning for the table body.
    // The module table ends at the first blank line or a line that looks
    // like the start of the MAC-address or sub-module section.
    let mut lines = text.lines();
    lines.next();
    let first_section: String = lines
        .take_while(|line| {
            let t = line.trim();
            !(t.is_empty() || t.to_ascii_lowercase().starts_with("mac") || t.to_ascii_lowercase().starts_with("mod "))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut candidates = Vec::new();
    for caps in module_row_re().captures_iter(&first_section) {
        let Ok(slot) = caps[1].parse::<u8>() else {
            continue;
        };
        let model = caps[2].to_string();
        let serial = caps[3].to_string();
        if looks_like_serial(&serial) {
            candidates.push((slot, model, serial));
        }
    }

    if candidates.len() != 2 {
        return Vec::new();
    }

    candidates
        .into_iter()
        .enumerate()
        .map(|(i, (_, model, serial))| StackMember {
            member_number: (i + 1) as u8,
            role: if i == 0 { StackRole::Active } else { StackRole::Standby },
            hardware_model: model,
            serial_number: serial,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_SWITCH_DETAIL: &str = r#"     Switch/Stack Mac Address : aabb.ccdd.0100
                                             H/W   Current
Switch#  Role   Mac Address     Priority Version  State
-------------------------------------------------------
*1       Master aabb.ccdd.0101     1      V02     Ready
 2       Member aabb.ccdd.0102     1      V02     Ready

Switch 1
  Switch Uptime           : 10 weeks
  Model number             : WS-C3850-24
  Switch Serial Number : FOC1111A1BC

Switch 2
  Switch Uptime           : 10 weeks
  Model number             : WS-C3850-24
  Switch Serial Number : FOC2222A2CD
"#;

    #[test]
    fn parses_stackwise_members() {
        let members = parse_show_switch(SHOW_SWITCH_DETAIL);
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].role, StackRole::Master);
        assert_eq!(members[0].hardware_model, "WS-C3850-24");
        assert_eq!(members[0].serial_number, "FOC1111A1BC");
        assert_eq!(members[1].role, StackRole::Member);
        assert_eq!(members[1].serial_number, "FOC2222A2CD");
    }

    const SHOW_MOD_VSS: &str = r#"Mod Ports Card Type                              Model              Serial No.
--- ----- -------------------------------------- ------------------ -----------
1   32    WS-C4500X-32 Ten Gig Chassis            WS-C4500X-32       JAE240213DA
2   32    WS-C4500X-32 Ten Gig Chassis            WS-C4500X-32       JAE171504NJ

Mod MAC address from                      To
--- ---------------------------------------------
1   aabb.ccdd.0001                         aabb.ccdd.0020
"#;

    #[test]
    fn falls_back_to_show_mod_vss_pair() {
        let members = parse_show_mod(SHOW_MOD_VSS);
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].role, StackRole::Active);
        assert_eq!(members[0].serial_number, "JAE240213DA");
        assert_eq!(members[1].role, StackRole::Standby);
        assert_eq!(members[1].serial_number, "JAE171504NJ");
    }

    #[test]
    fn show_mod_requires_exactly_two_plausible_members() {
        let text = "1   32   Card   Model   NOTASERIAL\n";
        assert!(parse_show_mod(text).is_empty());
    }

    #[test]
    fn nxos_modular_chassis_is_not_a_stack() {
        // NX-OS `show module` line cards never satisfy the StackWise role
        // column or the VSS two-serial shape, so both parsers correctly
        // report no stack members.
        let text = "1    Nexus9000 C9508 Supervisor Module  N9K-SUP  JAE1111AAAA\n";
        assert!(parse_show_switch(text).is_empty());
        assert!(parse_show_mod(text).is_empty());
    }
}
