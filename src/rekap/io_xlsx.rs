// Reading sheets out of an Excel workbook.

use std::fs::File;
use std::io::BufReader;

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate};

use crate::rekap::io_common::{simplify_file_name, A1Range, RangeRequest, SheetSource};
use crate::rekap::*;

type Workbook = Xlsx<BufReader<File>>;

/// Dates are stored as days since 1899-12-30 and shown as `DD/MM/YYYY`,
/// the way the error logs write them.
fn date_from_serial(serial: f64) -> Option<String> {
    // 2958465 is 31/12/9999, the last date a sheet can hold.
    if !(0.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let d = epoch.checked_add_signed(Duration::days(serial.floor() as i64))?;
    Some(d.format("%d/%m/%Y").to_string())
}

/// The displayed value of a cell.
pub fn render_cell(c: &DataType) -> String {
    match c {
        DataType::String(s) => s.clone(),
        DataType::Float(f) => format!("{}", f),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => {
            if *b {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        DataType::DateTime(serial) => date_from_serial(*serial).unwrap_or_else(|| serial.to_string()),
        _ => String::new(),
    }
}

// The worksheet as a grid anchored at A1, whatever the used range is.
fn to_grid(range: &Range<DataType>) -> Vec<RawRow> {
    let (last_row, last_col) = match range.end() {
        Some(e) => e,
        None => return Vec::new(),
    };
    (0..=last_row)
        .map(|r| {
            (0..=last_col)
                .map(|c| range.get_value((r, c)).map(render_cell).unwrap_or_default())
                .collect()
        })
        .collect()
}

/// An `.xlsx` workbook. The file is opened once per batch of reads.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct XlsxWorkbook {
    path: String,
}

impl XlsxWorkbook {
    pub fn open(path: &str) -> RekapResult<XlsxWorkbook> {
        let _workbook: Workbook = open_workbook(path).context(OpeningExcelSnafu { path })?;
        Ok(XlsxWorkbook {
            path: path.to_string(),
        })
    }

    fn workbook(&self) -> RekapResult<Workbook> {
        open_workbook(&self.path).context(OpeningExcelSnafu {
            path: self.path.clone(),
        })
    }

    fn read_sheet(&self, workbook: &mut Workbook, sheet: &str) -> RekapResult<Vec<RawRow>> {
        let wrange = workbook
            .worksheet_range(sheet)
            .context(MissingSheetSnafu {
                path: self.path.clone(),
                sheet,
            })?
            .context(OpeningExcelSnafu {
                path: self.path.clone(),
            })?;
        Ok(to_grid(&wrange))
    }

    fn read_range(&self, workbook: &mut Workbook, sheet: &str, range: &A1Range) -> Vec<RawRow> {
        match self.read_sheet(workbook, sheet) {
            Ok(grid) => range.apply(&grid),
            Err(e) => {
                warn!("fetch_range: {}: {}", sheet, e);
                Vec::new()
            }
        }
    }
}

impl SheetSource for XlsxWorkbook {
    fn source_id(&self) -> String {
        format!("xlsx:{}", self.path)
    }

    fn sheet_names(&self) -> Vec<String> {
        match self.workbook() {
            Ok(wb) => wb.sheet_names().to_vec(),
            Err(e) => {
                warn!("sheet_names: {}", e);
                Vec::new()
            }
        }
    }

    fn fetch_range(&self, sheet: &str, range: &A1Range) -> Vec<RawRow> {
        self.fetch_ranges_batch(&[(sheet.to_string(), range.clone())])
            .pop()
            .unwrap_or_default()
    }

    fn fetch_ranges_batch(&self, requests: &[RangeRequest]) -> Vec<Vec<RawRow>> {
        let mut workbook = match self.workbook() {
            Ok(wb) => wb,
            Err(e) => {
                warn!("fetch_ranges_batch: {}", e);
                return requests.iter().map(|_| Vec::new()).collect();
            }
        };
        debug!(
            "fetch_ranges_batch: {} ranges from {}",
            requests.len(),
            simplify_file_name(&self.path)
        );
        requests
            .iter()
            .map(|(sheet, range)| self.read_range(&mut workbook, sheet, range))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_render_like_the_sheet() {
        assert_eq!(render_cell(&DataType::Float(3.0)), "3");
        assert_eq!(render_cell(&DataType::Float(0.25)), "0.25");
        assert_eq!(render_cell(&DataType::Int(12)), "12");
        assert_eq!(render_cell(&DataType::Bool(true)), "TRUE");
        assert_eq!(render_cell(&DataType::Empty), "");
        assert_eq!(render_cell(&DataType::String("DP".to_string())), "DP");
        // 45901 is the first of September 2025.
        assert_eq!(render_cell(&DataType::DateTime(45901.0)), "01/09/2025");
    }

    #[test]
    fn out_of_range_dates_keep_the_serial() {
        assert_eq!(date_from_serial(1e300), None);
        assert_eq!(date_from_serial(-1.0), None);
        assert_eq!(date_from_serial(f64::NAN), None);
        assert_eq!(render_cell(&DataType::DateTime(1e300)), 1e300.to_string());
    }

    #[test]
    fn missing_workbook() {
        assert!(XlsxWorkbook::open("/nonexistent/kesalahan.xlsx").is_err());
    }
}
