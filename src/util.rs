// Utility helpers for lenient number parsing and console formatting.
//
// Spreadsheet exports are messy: ordinals arrive as `12`, `12.0` or
// `1,204`, and the presentation layer wants grouped thousands and one
// decimal place on percentages. Everything of that sort lives here.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Row ordinals default to 0 when missing or unreadable.
pub fn parse_ordinal(s: Option<&str>) -> i64 {
    let Some(raw) = s.map(str::trim).filter(|v| !v.is_empty()) else {
        return 0;
    };
    if let Ok(v) = raw.parse::<i64>() {
        return v;
    }
    match parse_f64_safe(Some(raw)) {
        Some(v) if v.is_finite() => v.trunc() as i64,
        _ => 0,
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234.5`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Percentages are stored unrounded; rounding to one decimal happens here,
/// at display time.
pub fn format_percentage(p: f64) -> String {
    format!("{}%", format_number(p, 1))
}

pub fn format_signed(n: i64) -> String {
    if n > 0 {
        format!("+{}", format_int(n))
    } else {
        format_int(n)
    }
}

/// Shorten long free text for table cells, respecting char boundaries.
pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_accept_spreadsheet_shapes() {
        assert_eq!(parse_ordinal(Some("12")), 12);
        assert_eq!(parse_ordinal(Some(" 12.0 ")), 12);
        assert_eq!(parse_ordinal(Some("1,204")), 1204);
        assert_eq!(parse_ordinal(Some("n/a")), 0);
        assert_eq!(parse_ordinal(None), 0);
    }

    #[test]
    fn percentages_round_to_one_decimal_only_when_rendered() {
        assert_eq!(format_percentage(100.0 / 3.0), "33.3%");
        assert_eq!(format_percentage(50.0), "50.0%");
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-0.0, 1), "0.0");
    }

    #[test]
    fn signed_counts_show_direction() {
        assert_eq!(format_signed(4), "+4");
        assert_eq!(format_signed(-1200), "-1,200");
        assert_eq!(format_signed(0), "0");
    }

    #[test]
    fn truncation_keeps_short_text_intact() {
        assert_eq!(truncate_text("cold fries", 20), "cold fries");
        assert_eq!(truncate_text("the food arrived cold", 10), "the food…");
    }
}
