//! Small callsign and parameter helpers.

/// Whether a callsign carries a secondary-station (SSID) suffix, e.g. `N0CALL-10`.
///
/// ```
/// use linkdial_core::has_ssid;
///
/// assert!(has_ssid("N0CALL-10"));
/// assert!(!has_ssid("N0CALL"));
/// ```
pub fn has_ssid(call: &str) -> bool {
    call.contains('-')
}

/// Parse a boolean parameter value.
///
/// Accepts `1`, `t`, `true`, `0`, `f`, `false` in any case. Anything else,
/// including an empty value (a bare `?radio_only` flag), is `None`, so
/// callers fall back to their global setting.
///
/// ```
/// use linkdial_core::parse_bool;
///
/// assert_eq!(parse_bool("TRUE"), Some(true));
/// assert_eq!(parse_bool("0"), Some(false));
/// assert_eq!(parse_bool("maybe"), None);
/// assert_eq!(parse_bool(""), None);
/// ```
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssid_detection() {
        assert!(has_ssid("LA5NTA-1"));
        assert!(has_ssid("N0CALL-T"));
        assert!(!has_ssid("LA5NTA"));
        assert!(!has_ssid(""));
    }

    #[test]
    fn bool_values() {
        for v in ["1", "t", "T", "true", "True", "TRUE"] {
            assert_eq!(parse_bool(v), Some(true), "{v:?}");
        }
        for v in ["0", "f", "F", "false", "FALSE"] {
            assert_eq!(parse_bool(v), Some(false), "{v:?}");
        }
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool("2"), None);
        assert_eq!(parse_bool(""), None);
        assert_eq!(parse_bool("  "), None);
    }
}
