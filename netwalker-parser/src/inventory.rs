use regex::Regex;
use std::sync::OnceLock;

fn inventory_entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)NAME:\s*"([^"]*)",\s*DESCR:\s*"[^"]*"\s*PID:\s*(\S+)\s*,\s*VID:[^,]*,\s*SN:\s*(\S+)"#,
        )
        .unwrap()
    })
}

/// Extracts every `SN:` value from `show inventory`, in the order
/// presented — the first is the chassis/standalone serial, used as the
/// device's primary serial. Stacks report one serial per member.
pub fn extract_serials(show_inventory: &str) -> Vec<String> {
    inventory_entry_re()
        .captures_iter(show_inventory)
        .map(|c| c[3].to_string())
        .collect()
}

/// Extracts the hardware model (`PID`) of the first (chassis) entry.
pub fn extract_primary_model(show_inventory: &str) -> Option<String> {
    inventory_entry_re()
        .captures_iter(show_inventory)
        .next()
        .map(|c| c[2].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_INVENTORY: &str = r#"NAME: "Chassis", DESCR: "WS-C3750X-24 Universal"
PID: WS-C3750X-24        , VID: V06  , SN: FOC1234X0YZ

NAME: "Switch 2", DESCR: "WS-C3750X-24 Universal"
PID: WS-C3750X-24        , VID: V06  , SN: FOC5678X0YZ
"#;

    #[test]
    fn extracts_all_serials_in_order() {
        assert_eq!(
            extract_serials(SHOW_INVENTORY),
            vec!["FOC1234X0YZ", "FOC5678X0YZ"]
        );
    }

    #[test]
    fn extracts_chassis_model() {
        assert_eq!(
            extract_primary_model(SHOW_INVENTORY).as_deref(),
            Some("WS-C3750X-24")
        );
    }

    #[test]
    fn empty_inventory_yields_no_serials() {
        assert!(extract_serials("").is_empty());
        assert!(extract_primary_model("").is_none());
    }
}
