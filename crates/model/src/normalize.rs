use chrono::NaiveDate;

/// Normalize text for matching: trimmed, lowercased, inner whitespace
/// collapsed to single spaces.
pub fn norm_text(raw: &str) -> String {
    raw.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Composite natural key from two normalized parts.
pub fn composite_key(a: &str, b: &str) -> String {
    format!("{}|{}", norm_text(a), norm_text(b))
}

/// Parse a money amount into whole cents.
///
/// Accepts currency symbols, thousands separators, and an optional decimal
/// part: `"1,000,000"`, `"$1,000,000.00"`, and `"1000000"` all parse to the
/// same cents.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '_'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    // Fractional part beyond cents is truncated.
    let mut cents_str = frac.to_string();
    cents_str.truncate(2);
    while cents_str.len() < 2 {
        cents_str.push('0');
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents: i64 = cents_str.parse().ok()?;
    let total = whole.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -total } else { total })
}

/// Parse a date as ISO (`2026-03-01`) or US (`3/1/2026`) format.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

/// Parse a boolean-ish spreadsheet cell.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Whether two amounts are within a relative tolerance of each other.
///
/// `tolerance` is a fraction of the larger magnitude (0.02 = ±2%).
pub fn amounts_within(a: i64, b: i64, tolerance: f64) -> bool {
    let delta = (a - b).abs() as f64;
    let scale = a.abs().max(b.abs()) as f64;
    if scale == 0.0 {
        return delta == 0.0;
    }
    delta <= scale * tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_normalization() {
        assert_eq!(norm_text("  Oak St   Tower "), "oak st tower");
        assert_eq!(norm_text("OAK ST TOWER"), "oak st tower");
        assert_eq!(composite_key("Main Depot", " 1 Main  St"), "main depot|1 main st");
    }

    #[test]
    fn amount_formats_agree() {
        assert_eq!(parse_amount("1,000,000"), Some(100_000_000));
        assert_eq!(parse_amount("1000000.00"), Some(100_000_000));
        assert_eq!(parse_amount("$1,000,000.00"), Some(100_000_000));
        assert_eq!(parse_amount("-42.50"), Some(-4250));
        assert_eq!(parse_amount("0.5"), Some(50));
    }

    #[test]
    fn amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("TBD"), None);
        assert_eq!(parse_amount("1.2.3"), None);
    }

    #[test]
    fn date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(parse_date("2026-03-01"), Some(expected));
        assert_eq!(parse_date("3/1/2026"), Some(expected));
        assert_eq!(parse_date("March 1"), None);
    }

    #[test]
    fn relative_tolerance() {
        // 2% of 5,000,000.00
        assert!(amounts_within(500_000_000, 509_000_000, 0.02));
        assert!(!amounts_within(500_000_000, 515_000_000, 0.02));
        assert!(amounts_within(0, 0, 0.02));
        assert!(!amounts_within(0, 1, 0.02));
    }
}
