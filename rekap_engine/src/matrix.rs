// Monthly sheets laid out as a daily matrix of DP / WD counts.

use log::{debug, info};

use crate::config::*;
use crate::names::{is_excluded_name, IdentityIndex};
use crate::rows::{cell, parse_amount};
use crate::staff::StaffTally;

/// First column holding daily counts.
pub const FIRST_DATA_COLUMN: usize = 4;

/// The date label of every data column, carried forward over blank header cells.
pub fn date_labels(date_header: &[String], type_header: &[String]) -> Vec<String> {
    let width = date_header.len().max(type_header.len());
    let mut current = String::new();
    let mut res = Vec::with_capacity(width);
    for idx in 0..width {
        if idx >= FIRST_DATA_COLUMN && !cell(date_header, idx).is_empty() {
            current = cell(date_header, idx).to_string();
        }
        res.push(current.clone());
    }
    res
}

fn staff_rows(sheet: &MatrixSheet) -> &[RawRow] {
    if sheet.rows.len() < 2 {
        &[]
    } else {
        &sheet.rows[2..]
    }
}

/// Feeds one matrix sheet into a tally.
///
/// `identities` must know every name of the sheet, see `matrix_index`.
pub fn read_matrix(
    sheet: &MatrixSheet,
    identities: &IdentityIndex,
    domain: &DomainConfig,
    tally: &mut StaffTally,
    diagnostics: &mut Diagnostics,
) {
    if sheet.rows.len() < 2 {
        debug!("read_matrix: {}: no header rows", sheet.label);
        return;
    }
    let date_header = &sheet.rows[0];
    let type_header = &sheet.rows[1];
    let dates = date_labels(date_header, type_header);
    // Classified once per column.
    let types: Vec<Option<ErrorType>> = (0..type_header.len())
        .map(|idx| {
            if idx < FIRST_DATA_COLUMN || cell(type_header, idx).is_empty() {
                None
            } else {
                domain.taxonomy.classify(cell(type_header, idx))
            }
        })
        .collect();
    let mut records = 0usize;
    for row in staff_rows(sheet) {
        if row.len() < FIRST_DATA_COLUMN {
            if !row.iter().all(|c| c.trim().is_empty()) {
                diagnostics.skip(SkipReason::MalformedRow);
            }
            continue;
        }
        let name = cell(row, 1);
        if is_excluded_name(name) {
            continue;
        }
        let identity = match identities.resolve(name) {
            Some(i) => i.clone(),
            None => {
                diagnostics.skip(SkipReason::UnresolvedIdentity);
                continue;
            }
        };
        let site = cell(row, 3);
        tally.set_profile(&identity, cell(row, 0), cell(row, 2), site);
        for idx in FIRST_DATA_COLUMN..row.len().min(type_header.len()) {
            let amount = match parse_amount(cell(row, idx)) {
                Some(a) if a > 0.0 => a,
                _ => continue,
            };
            let error_type = match types[idx] {
                Some(t) => t,
                None => {
                    diagnostics.skip(SkipReason::UnclassifiedErrorType);
                    continue;
                }
            };
            tally.add(
                &ErrorRecord {
                    identity: identity.clone(),
                    site: site.to_string(),
                    occurred_on: dates[idx].clone(),
                    month: Some(sheet.label.clone()),
                    error_type,
                    amount,
                },
                &domain.weights,
            );
            records += 1;
        }
    }
    info!("read_matrix: {}: {} records", sheet.label, records);
}

/// The identities named in a set of matrix sheets.
pub fn matrix_index(sheets: &[MatrixSheet]) -> IdentityIndex {
    let mut idx = IdentityIndex::new();
    for sheet in sheets {
        for row in staff_rows(sheet) {
            idx.insert(cell(row, 1));
        }
    }
    idx
}

/// Totals per staff member over several monthly sheets, most errors first.
///
/// A staff member keeps the site and status of the last sheet naming them.
pub fn aggregate_matrix(sheets: &[MatrixSheet], domain: &DomainConfig) -> (Vec<StaffTotal>, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let identities = matrix_index(sheets);
    identities.record_collisions(&mut diagnostics);
    let mut tally = StaffTally::new();
    for sheet in sheets {
        read_matrix(sheet, &identities, domain, &mut tally, &mut diagnostics);
    }
    let mut res = tally.finalize(&domain.weights, domain.chronic_threshold);
    res.sort_by(|a, b| {
        b.total_count
            .cmp(&a.total_count)
            .then_with(|| a.identity.display.cmp(&b.identity.display))
    });
    (res, diagnostics)
}
