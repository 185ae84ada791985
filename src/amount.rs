//! Free-form amount sanitization.
//!
//! Users type amounts like `"100,000 vnd"` or `"1.5tr"`; only the digits and
//! a single decimal dot survive. Anything that still looks malformed after
//! stripping is rejected rather than guessed at.

/// Normalize a raw amount string into a canonical decimal string.
///
/// Returns `None` when no usable amount remains: nothing but junk characters,
/// more than one dot, or more than 2 fractional digits. Leading zeros are
/// stripped (an all-zero amount collapses to `"0"`).
///
/// Idempotent: feeding the output back in returns it unchanged.
pub fn normalize_amount(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let cleaned: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.matches('.').count() > 1 {
        return None;
    }
    if let Some((_, frac)) = cleaned.split_once('.') {
        if frac.len() > 2 {
            return None;
        }
    }
    let stripped = cleaned.trim_start_matches('0');
    if stripped.is_empty() {
        Some("0".to_string())
    } else {
        Some(stripped.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_junk_and_leading_zeros() {
        assert_eq!(normalize_amount("100,000 vnd"), Some("100000".into()));
        assert_eq!(normalize_amount("007"), Some("7".into()));
        assert_eq!(normalize_amount("000"), Some("0".into()));
    }

    #[test]
    fn keeps_two_fractional_digits() {
        assert_eq!(normalize_amount("12.50"), Some("12.50".into()));
        assert_eq!(normalize_amount("12.5"), Some("12.5".into()));
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(normalize_amount("1.2.3"), None);
        assert_eq!(normalize_amount("1.234"), None);
    }

    #[test]
    fn idempotent() {
        for raw in ["100,000", "0.50", "12.5", "000", "7"] {
            let once = normalize_amount(raw).unwrap();
            assert_eq!(normalize_amount(&once), Some(once.clone()));
        }
    }
}
