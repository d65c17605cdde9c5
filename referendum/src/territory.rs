//! Department code conventions of the French administrative coding.
//!
//! The referendum file writes mainland departments without padding (`7`,
//! `2A`) and flags overseas departments and French citizens living abroad
//! with a code containing `Z` (`ZA`, `ZZ`). The department reference table
//! pads mainland codes (`07`) and encodes overseas departments with three
//! digits (`971`). These rules decide which rows can be placed on the
//! mainland map and how both encodings are reconciled.

/// Marker of overseas territories and of voters living abroad in the
/// referendum file. The match is case sensitive.
pub const TERRITORY_MARKER: char = 'Z';

/// Number of digits of the overseas department codes in the reference table.
pub const TERRITORY_CODE_DIGITS: usize = 3;

/// True if a ballot with this department code must not be joined.
///
/// Missing codes are not excluded by this rule: they simply never match an
/// area.
pub fn is_excluded_ballot_code(code: Option<&str>) -> bool {
    code.map_or(false, |c| c.contains(TERRITORY_MARKER))
}

fn is_numeric(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_digit())
}

/// True for the three-digit overseas department codes (`971`).
pub fn is_territory_department_code(code: &str) -> bool {
    is_numeric(code) && code.len() == TERRITORY_CODE_DIGITS
}

/// Brings a department code of the reference table to the encoding of the
/// referendum file.
///
/// Returns `None` for territory codes, which must be dropped. Numeric codes
/// lose their leading zeros (a code made only of zeros keeps one), other
/// codes are returned trimmed and otherwise unchanged.
///
/// Normalizing a normalized code returns it unchanged.
pub fn normalize_department_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if is_territory_department_code(trimmed) {
        return None;
    }
    if !is_numeric(trimmed) {
        return Some(trimmed.to_string());
    }
    let stripped = trimmed.trim_start_matches('0');
    let stripped = if stripped.is_empty() { "0" } else { stripped };
    // A padded territory code ("0971") is still a territory code.
    if is_territory_department_code(stripped) {
        None
    } else {
        Some(stripped.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_ballot_codes() {
        assert!(is_excluded_ballot_code(Some("ZA")));
        assert!(is_excluded_ballot_code(Some("ZZ")));
        assert!(!is_excluded_ballot_code(Some("za")));
        assert!(!is_excluded_ballot_code(Some("2A")));
        assert!(!is_excluded_ballot_code(Some("7")));
        assert!(!is_excluded_ballot_code(None));
    }

    #[test]
    fn territory_codes() {
        assert!(is_territory_department_code("971"));
        assert!(is_territory_department_code("976"));
        assert!(!is_territory_department_code("97"));
        assert!(!is_territory_department_code("2A"));
        assert!(!is_territory_department_code("9710"));
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_department_code("07"), Some("7".to_string()));
        assert_eq!(normalize_department_code(" 01 "), Some("1".to_string()));
        assert_eq!(normalize_department_code("75"), Some("75".to_string()));
        assert_eq!(normalize_department_code("2A"), Some("2A".to_string()));
        assert_eq!(normalize_department_code(" 2B"), Some("2B".to_string()));
        assert_eq!(normalize_department_code("00"), Some("0".to_string()));
        assert_eq!(normalize_department_code("971"), None);
        assert_eq!(normalize_department_code(" 974 "), None);
        assert_eq!(normalize_department_code("0971"), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        let codes = [
            "07", "7", " 01", "10", "2A", "2B", "00", "0", "100", "0100", "1000", "ZZ", "",
            " 9 ",
        ];
        for code in codes {
            if let Some(once) = normalize_department_code(code) {
                assert_eq!(
                    normalize_department_code(&once),
                    Some(once.clone()),
                    "code {:?}",
                    code
                );
            }
        }
    }
}
