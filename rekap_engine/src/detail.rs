// Display views of a single sheet.

use crate::config::RawRow;
use crate::rows::{pad_or_truncate, strip_blank_rows};
use crate::totals::extract_total;

pub const LOG_HEADERS: [&str; 3] = ["Nama Staff", "Link Kesalahan", "Poin Kesalahan"];
pub const SPECIAL_HEADERS: [&str; 3] = ["Kode", "Poin Kesalahan", "Ketentuan"];

/// Width of the error log and special sheet views.
pub const DISPLAY_WIDTH: usize = 3;

/// One site sheet as shown on its own page.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SheetDetail {
    pub log_headers: Vec<String>,
    /// Every non-blank log row after the header, in three columns.
    /// Unclassified rows stay here even though they count nowhere.
    pub log_rows: Vec<RawRow>,
    pub staff_headers: RawRow,
    pub staff_rows: Vec<RawRow>,
    pub staff_total: u64,
}

fn headers(h: &[&str]) -> Vec<String> {
    h.iter().map(|s| s.to_string()).collect()
}

/// `log_width` is the number of log columns shown, usually `DISPLAY_WIDTH`.
pub fn sheet_detail(log_rows: &[RawRow], staff_rows: &[RawRow], log_width: usize) -> SheetDetail {
    let log = strip_blank_rows(log_rows);
    let staff = strip_blank_rows(staff_rows);
    let (staff_total, data) = extract_total(&staff);
    SheetDetail {
        log_headers: headers(&LOG_HEADERS),
        log_rows: log
            .iter()
            .skip(1)
            .map(|r| pad_or_truncate(r, log_width))
            .collect(),
        staff_headers: staff.first().cloned().unwrap_or_default(),
        staff_rows: data,
        staff_total,
    }
}

/// A special sheet: its rows in three columns, headers included.
pub fn special_sheet(rows: &[RawRow]) -> (Vec<String>, Vec<RawRow>) {
    (
        headers(&SPECIAL_HEADERS),
        rows.iter().map(|r| pad_or_truncate(r, DISPLAY_WIDTH)).collect(),
    )
}
