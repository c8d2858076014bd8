// Primitives for reading CSV exports: one file per sheet.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::rekap::io_common::{A1Range, SheetSource};
use crate::rekap::*;

fn read_records<R: Read>(rdr: csv::Reader<R>) -> RekapResult<Vec<RawRow>> {
    let mut res: Vec<RawRow> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        res.push(line.iter().map(|s| s.to_string()).collect());
    }
    Ok(res)
}

fn builder() -> csv::ReaderBuilder {
    let mut b = csv::ReaderBuilder::new();
    // Exports drop trailing empty cells, so rows have different lengths.
    b.has_headers(false).flexible(true);
    b
}

/// Reads a full sheet grid from any reader.
pub fn read_grid<R: Read>(input: R) -> RekapResult<Vec<RawRow>> {
    read_records(builder().from_reader(input))
}

pub fn read_grid_file(path: &Path) -> RekapResult<Vec<RawRow>> {
    let rdr = builder().from_path(path).context(CsvOpenSnafu {
        path: path.to_string_lossy().to_string(),
    })?;
    read_records(rdr)
}

/// A directory of `<sheet name>.csv` files.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn open(path: &str) -> RekapResult<CsvDirectory> {
        let dir = PathBuf::from(path);
        if !dir.is_dir() {
            whatever!("{} is not a directory of CSV exports", path);
        }
        Ok(CsvDirectory { dir })
    }

    fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", sheet))
    }
}

impl SheetSource for CsvDirectory {
    fn source_id(&self) -> String {
        format!("csv:{}", self.dir.display())
    }

    fn sheet_names(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("sheet_names: cannot list {:?}: {}", self.dir, e);
                return Vec::new();
            }
        };
        let mut res: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map(|x| x.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
            })
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(|s| s.to_string()))
            .collect();
        res.sort();
        res
    }

    fn fetch_range(&self, sheet: &str, range: &A1Range) -> Vec<RawRow> {
        let path = self.sheet_path(sheet);
        match read_grid_file(&path) {
            Ok(grid) => {
                let rows = range.apply(&grid);
                debug!("fetch_range: {} {:?}: {} rows", sheet, range, rows.len());
                rows
            }
            Err(e) => {
                warn!("fetch_range: cannot read sheet {} from {:?}: {}", sheet, path, e);
                Vec::new()
            }
        }
    }
}
