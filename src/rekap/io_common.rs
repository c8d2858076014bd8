// Ranges and the interface shared by every sheet source.

use std::path::Path;

use crate::rekap::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// An A1 range such as `A1:C`, `H1:AH` or `'DEPOBOS'!A2:BN`. Indices are 0-based.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct A1Range {
    pub first_col: usize,
    pub first_row: usize,
    /// Inclusive. `None` runs to the last column.
    pub last_col: Option<usize>,
    /// Inclusive. `None` runs to the last row.
    pub last_row: Option<usize>,
}

// `AH` is column 33.
fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut res: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as usize - 'A' as usize + 1;
        res = res.checked_mul(26)?.checked_add(digit)?;
    }
    Some(res - 1)
}

// `AH12` gives (Some(33), Some(11)), `C` gives (Some(2), None).
fn parse_cell(s: &str) -> Option<(Option<usize>, Option<usize>)> {
    let split = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
    let (letters, digits) = s.split_at(split);
    let col = if letters.is_empty() {
        None
    } else {
        Some(column_index(letters)?)
    };
    let row = if digits.is_empty() {
        None
    } else {
        match digits.parse::<usize>().ok()? {
            0 => return None,
            r => Some(r - 1),
        }
    };
    if col.is_none() && row.is_none() {
        return None;
    }
    Some((col, row))
}

impl A1Range {
    pub fn parse(s: &str) -> RekapResult<A1Range> {
        let bad = || InvalidRangeSnafu { range: s.to_string() }.build();
        // Any sheet prefix is dropped: the sheet is given separately.
        let body = match s.rfind('!') {
            Some(p) => &s[p + 1..],
            None => s,
        }
        .trim();
        let (start, end) = match body.split_once(':') {
            Some((a, b)) => (a, Some(b)),
            None => (body, None),
        };
        let (c0, r0) = parse_cell(start).ok_or_else(bad)?;
        let (c1, r1) = match end {
            Some(e) => parse_cell(e).ok_or_else(bad)?,
            None => (c0, r0),
        };
        let res = A1Range {
            first_col: c0.unwrap_or(0),
            first_row: r0.unwrap_or(0),
            last_col: c1,
            last_row: r1,
        };
        if res.last_col.map(|c| c < res.first_col).unwrap_or(false)
            || res.last_row.map(|r| r < res.first_row).unwrap_or(false)
        {
            return Err(bad());
        }
        Ok(res)
    }

    /// Cuts the range out of a full sheet grid, the way the spreadsheet API
    /// returns it: trailing empty cells and trailing empty rows are dropped.
    pub fn apply(&self, grid: &[RawRow]) -> Vec<RawRow> {
        let last_row = self
            .last_row
            .unwrap_or(usize::MAX)
            .min(grid.len().saturating_sub(1));
        if grid.is_empty() || self.first_row > last_row {
            return Vec::new();
        }
        let mut res: Vec<RawRow> = grid[self.first_row..=last_row]
            .iter()
            .map(|row| {
                let end = self
                    .last_col
                    .map(|c| c + 1)
                    .unwrap_or(row.len())
                    .min(row.len());
                let mut cells: RawRow = if self.first_col < end {
                    row[self.first_col..end].to_vec()
                } else {
                    Vec::new()
                };
                while cells.last().map(|c| c.is_empty()).unwrap_or(false) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while res.last().map(|r| r.is_empty()).unwrap_or(false) {
            res.pop();
        }
        res
    }
}

/// A read request: the sheet name and the range inside it.
pub type RangeRequest = (String, A1Range);

/// A tabular data source: a workbook file, a directory of exports.
///
/// Sources fail closed: a range that cannot be read comes back empty, with
/// a warning in the logs.
pub trait SheetSource {
    /// Identifies the source in cache keys.
    fn source_id(&self) -> String;

    fn sheet_names(&self) -> Vec<String>;

    fn fetch_range(&self, sheet: &str, range: &A1Range) -> Vec<RawRow>;

    /// One entry per request, in order.
    fn fetch_ranges_batch(&self, requests: &[RangeRequest]) -> Vec<Vec<RawRow>> {
        requests
            .iter()
            .map(|(sheet, range)| self.fetch_range(sheet, range))
            .collect()
    }
}
