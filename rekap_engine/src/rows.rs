//! Cleaning of raw spreadsheet rows.
//!
//! Spreadsheet sources return ragged rows: trailing empty cells are dropped,
//! blank separator rows are kept, numbers come back already formatted
//! (`4,643`). Everything here is permissive and never fails.

use crate::config::RawRow;

/// The trimmed content of a cell, or the empty string when the row is too short.
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Drops the rows where every cell is empty or whitespace.
pub fn strip_blank_rows(rows: &[RawRow]) -> Vec<RawRow> {
    rows.iter().filter(|r| !is_blank_row(r)).cloned().collect()
}

/// Pads with empty cells or truncates to exactly `width` cells.
///
/// A zero width leaves the row unchanged.
pub fn pad_or_truncate(row: &[String], width: usize) -> RawRow {
    if width == 0 {
        return row.to_vec();
    }
    let mut res: RawRow = row.iter().take(width).cloned().collect();
    while res.len() < width {
        res.push(String::new());
    }
    res
}

/// Keeps only the digits of a rendered count: `"4,643"` is 4643, `"abc"` is 0.
pub fn parse_count(cell: &str) -> u64 {
    let digits: String = cell.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().unwrap_or(0)
}

/// Accepts only plain decimals (`12`, `0.5`); anything else is `None`.
///
/// `None` means "no value", which is different from a zero amount.
pub fn parse_amount(cell: &str) -> Option<f64> {
    let s = cell.trim();
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) {
        return None;
    }
    if let Some(f) = frac_part {
        if !all_digits(f) {
            return None;
        }
    }
    s.parse::<f64>().ok()
}

/// Rounds to two decimals, the precision used for every point value.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `4643` as `4,643`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}

/// Points with two decimals and thousands separators: `1,234.50`.
pub fn format_points(x: f64) -> String {
    let r = round2(x.max(0.0));
    let whole = r.trunc() as u64;
    let cents = ((r - r.trunc()) * 100.0).round() as u64;
    format!("{}.{:02}", format_count(whole), cents.min(99))
}
