/// Value returned by `parse_time` when a string cannot be read as a time.
/// Sorts after every valid time.
pub const TIME_SENTINEL: f64 = f64::INFINITY;

/// Value returned by `parse_field` when a string cannot be read as a mark.
/// Sorts after every valid mark in descending order.
pub const FIELD_SENTINEL: f64 = f64::NEG_INFINITY;

// ASCII apostrophe, right single quote, prime, acute
const FEET_CHARS: [char; 4] = ['\'', '\u{2019}', '\u{2032}', '\u{00b4}'];
// ASCII quote, curly left/right, double prime, triple prime
const INCH_CHARS: [char; 5] = ['"', '\u{201c}', '\u{201d}', '\u{2033}', '\u{2034}'];

/// Strip trailing qualifier letters ("q", "w", "Q") and surrounding whitespace.
pub fn strip_result_suffix(s: &str) -> &str {
    s.trim().trim_end_matches(char::is_alphabetic).trim()
}

/// Replace Unicode foot and inch marks with ASCII `'` and `"`.
pub fn normalize_quotes(s: &str) -> String {
    s.chars()
        .map(|c| {
            if FEET_CHARS.contains(&c) {
                '\''
            } else if INCH_CHARS.contains(&c) {
                '"'
            } else {
                c
            }
        })
        .collect()
}

/// Parse a time into seconds.
///
/// Accepts plain seconds ("45.58"), `m:ss.xx` ("4:32.10") and `h:mm:ss`
/// ("2:45:10"). Trailing qualifier letters are ignored. Anything else
/// returns [`TIME_SENTINEL`].
pub fn parse_time(s: &str) -> f64 {
    let s = strip_result_suffix(s);
    if s.is_empty() {
        return TIME_SENTINEL;
    }

    if s.contains(':') {
        let parts: Vec<&str> = s.split(':').collect();
        let parsed: Option<Vec<f64>> = parts.iter().map(|p| parse_component(p)).collect();
        return match parsed.as_deref() {
            Some([minutes, seconds]) => minutes * 60.0 + seconds,
            Some([hours, minutes, seconds]) => hours * 3600.0 + minutes * 60.0 + seconds,
            _ => TIME_SENTINEL,
        };
    }

    parse_component(s).unwrap_or(TIME_SENTINEL)
}

fn parse_component(s: &str) -> Option<f64> {
    let value: f64 = s.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Parse a field mark.
///
/// Feet and inches ("17'6\"", "17' 6", Unicode marks too) become total inches.
/// Otherwise the string is read as a decimal (meters or another unit).
/// Anything else returns [`FIELD_SENTINEL`].
pub fn parse_field(s: &str) -> f64 {
    let s = strip_result_suffix(s);
    if s.is_empty() {
        return FIELD_SENTINEL;
    }
    let s = normalize_quotes(s);

    if let Some(inches) = parse_feet_inches(&s) {
        return inches;
    }

    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => FIELD_SENTINEL,
    }
}

/// Match `<feet> ' <inches>` at the start of the string. Anything after the
/// inches (an inch mark, fractions) is ignored. Totals past `u64` are rejected.
fn parse_feet_inches(s: &str) -> Option<f64> {
    let (feet, rest) = leading_digits(s)?;
    let rest = rest.trim_start().strip_prefix('\'')?.trim_start();
    let (inches, _) = leading_digits(rest)?;
    let total = feet.checked_mul(12)?.checked_add(inches)?;
    Some(total as f64)
}

fn leading_digits(s: &str) -> Option<(u64, &str)> {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// True when the string is written in feet and inches (has both marks).
pub fn looks_like_field_result(s: &str) -> bool {
    let s = normalize_quotes(s.trim());
    s.contains('\'') && s.contains('"')
}

/// True when the list is non-empty and every entry is written in feet and inches.
pub fn all_results_are_field_format<S: AsRef<str>>(results: &[S]) -> bool {
    !results.is_empty() && results.iter().all(|r| looks_like_field_result(r.as_ref()))
}

/// Format seconds as `m:ss.xx`.
///
/// Seconds are rounded to hundredths before splitting so a value like
/// 119.999 renders as "2:00.00" rather than "1:60.00".
pub fn format_time(seconds: f64) -> String {
    let hundredths = (seconds * 100.0).round() as i64;
    let minutes = hundredths / 6000;
    let rest = (hundredths % 6000) as f64 / 100.0;
    format!("{}:{:05.2}", minutes, rest)
}

/// Rewrite leading zeros in the minutes field: "04:32.10" -> "4:32.10",
/// "0:58.20" -> "58.20". Returns `None` when nothing would change.
pub fn normalize_leading_zero(result: &str) -> Option<String> {
    let trimmed = result.trim();
    let (minutes, rest) = trimmed.split_once(':')?;
    if !minutes.starts_with('0') || !minutes.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let stripped = minutes.trim_start_matches('0');
    if stripped.is_empty() {
        Some(rest.to_string())
    } else {
        Some(format!("{}:{}", stripped, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_time_minutes_seconds() {
        assert!(close(parse_time("4:32.10"), 272.10));
    }

    #[test]
    fn test_parse_time_plain_seconds() {
        assert!(close(parse_time("45.58"), 45.58));
    }

    #[test]
    fn test_parse_time_hours() {
        assert!(close(parse_time("2:45:10"), 9910.0));
    }

    #[test]
    fn test_parse_time_strips_qualifier() {
        assert!(close(parse_time("10.95q"), 10.95));
        assert!(close(parse_time(" 1:58.3 Q "), 118.3));
    }

    #[test]
    fn test_parse_time_garbage_is_sentinel() {
        assert_eq!(parse_time("DNF"), TIME_SENTINEL);
        assert_eq!(parse_time(""), TIME_SENTINEL);
        assert_eq!(parse_time("1:2:3:4"), TIME_SENTINEL);
        assert_eq!(parse_time("abc:12"), TIME_SENTINEL);
    }

    #[test]
    fn test_parse_field_feet_inches() {
        assert!(close(parse_field("17'6\""), 210.0));
        assert!(close(parse_field("17'6"), 210.0));
        assert!(close(parse_field("17' 6\""), 210.0));
    }

    #[test]
    fn test_parse_field_unicode_marks() {
        assert!(close(parse_field("17\u{2032}6\u{2033}"), 210.0));
        assert!(close(parse_field("5\u{2019}10\u{201d}"), 70.0));
    }

    #[test]
    fn test_parse_field_decimal() {
        assert!(close(parse_field("17.5"), 17.5));
        assert!(close(parse_field("12.41w"), 12.41));
    }

    #[test]
    fn test_parse_field_garbage_is_sentinel() {
        assert_eq!(parse_field("garbage"), FIELD_SENTINEL);
        assert_eq!(parse_field("NM"), FIELD_SENTINEL);
        assert_eq!(parse_field("17'"), FIELD_SENTINEL);
    }

    #[test]
    fn test_parse_field_oversized_feet_is_sentinel() {
        assert_eq!(parse_field("9999999999999999999'6\""), FIELD_SENTINEL);
        assert_eq!(parse_field("99999999999999999999'6\""), FIELD_SENTINEL);
        assert_eq!(parse_field("1537228672809129301'4\""), FIELD_SENTINEL);
    }

    #[test]
    fn test_looks_like_field_result() {
        assert!(looks_like_field_result("17'6\""));
        assert!(looks_like_field_result("17\u{2032}6\u{2033}"));
        assert!(!looks_like_field_result("17'6"));
        assert!(!looks_like_field_result("17.5"));
    }

    #[test]
    fn test_all_results_are_field_format() {
        assert!(all_results_are_field_format(&["17'6\"", "18'1\""]));
        assert!(!all_results_are_field_format(&["17'6\"", "5.40"]));
        assert!(!all_results_are_field_format::<&str>(&[]));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(199.6), "3:19.60");
        assert_eq!(format_time(45.5), "0:45.50");
        assert_eq!(format_time(119.999), "2:00.00");
    }

    #[test]
    fn test_format_then_parse_keeps_hundredths() {
        for value in [0.01, 9.58, 45.58, 59.99, 60.0, 199.6, 272.1, 1799.99] {
            let parsed = parse_time(&format_time(value));
            assert!((parsed - value).abs() < 0.005, "{} -> {}", value, parsed);
        }
    }

    #[test]
    fn test_normalize_leading_zero() {
        assert_eq!(normalize_leading_zero("04:32.10"), Some("4:32.10".to_string()));
        assert_eq!(normalize_leading_zero("0:58.20"), Some("58.20".to_string()));
        assert_eq!(normalize_leading_zero("4:32.10"), None);
        assert_eq!(normalize_leading_zero("0.58"), None);
    }
}
