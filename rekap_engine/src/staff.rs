// Per-staff folding of classified error rows.

use log::{debug, info};
use std::collections::{BTreeMap, HashMap};

use crate::classify::{Taxonomy, WeightTable};
use crate::config::*;
use crate::months::delimiter_month;
use crate::names::IdentityIndex;
use crate::rows::{cell, parse_amount, round2};

/// Reads the classified errors of a log. Header rows must already be removed.
///
/// Rows are `[name, link or date, type, amount?]`. A missing or blank amount
/// counts as one occurrence.
pub fn records_from_log(
    rows: &[RawRow],
    site: &str,
    identities: &IdentityIndex,
    taxonomy: &Taxonomy,
    diagnostics: &mut Diagnostics,
) -> Vec<ErrorRecord> {
    let mut res: Vec<ErrorRecord> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        if delimiter_month(row).is_some() {
            continue;
        }
        if row.len() < 3 {
            debug!("records_from_log: {}: row {} has {} cells", site, idx, row.len());
            diagnostics.skip(SkipReason::MalformedRow);
            continue;
        }
        let amount = match cell(row, 3) {
            "" => 1.0,
            s => match parse_amount(s) {
                Some(a) => a,
                None => {
                    debug!("records_from_log: {}: row {} amount {:?}", site, idx, s);
                    diagnostics.skip(SkipReason::MalformedRow);
                    continue;
                }
            },
        };
        let identity = match identities.resolve(cell(row, 0)) {
            Some(i) => i.clone(),
            None => {
                debug!("records_from_log: {}: unknown staff {:?}", site, cell(row, 0));
                diagnostics.skip(SkipReason::UnresolvedIdentity);
                continue;
            }
        };
        let error_type = match taxonomy.classify(cell(row, 2)) {
            Some(t) => t,
            None => {
                diagnostics.skip(SkipReason::UnclassifiedErrorType);
                continue;
            }
        };
        res.push(ErrorRecord {
            identity,
            site: site.to_string(),
            occurred_on: cell(row, 1).to_string(),
            month: None,
            error_type,
            amount,
        });
    }
    res
}

#[derive(Debug, Clone)]
struct Tally {
    identity: StaffIdentity,
    passport: String,
    status: String,
    site: String,
    counts: BTreeMap<ErrorType, f64>,
    unresolved_checks: f64,
    total: f64,
    site_counts: Vec<(String, f64)>,
    details: Vec<DetailEntry>,
}

impl Tally {
    fn new(identity: &StaffIdentity) -> Tally {
        Tally {
            identity: identity.clone(),
            passport: String::new(),
            status: String::new(),
            site: String::new(),
            counts: BTreeMap::new(),
            unresolved_checks: 0.0,
            total: 0.0,
            site_counts: Vec::new(),
            details: Vec::new(),
        }
    }

    fn add_to_site(&mut self, site: &str, amount: f64) {
        match self.site_counts.iter_mut().find(|(s, _)| s == site) {
            Some(e) => e.1 += amount,
            None => self.site_counts.push((site.to_string(), amount)),
        }
    }
}

/// Accumulates error records per identity, in first-seen order.
///
/// Counts stay fractional until `finalize`, which also applies the chronic
/// note folding and computes the points.
#[derive(Debug, Clone, Default)]
pub struct StaffTally {
    entries: Vec<Tally>,
    by_key: HashMap<String, usize>,
}

impl StaffTally {
    pub fn new() -> StaffTally {
        StaffTally::default()
    }

    fn entry(&mut self, identity: &StaffIdentity) -> &mut Tally {
        let pos = match self.by_key.get(&identity.key) {
            Some(p) => *p,
            None => {
                self.entries.push(Tally::new(identity));
                self.by_key
                    .insert(identity.key.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos]
    }

    /// Makes sure the identity is reported, even without any error.
    pub fn seed(&mut self, identity: &StaffIdentity, site: &str) {
        let t = self.entry(identity);
        if !site.trim().is_empty() {
            t.site = site.trim().to_string();
        }
    }

    /// Records where a staff member works. Blank values keep the previous ones.
    pub fn set_profile(&mut self, identity: &StaffIdentity, passport: &str, status: &str, site: &str) {
        let t = self.entry(identity);
        for (field, value) in [
            (&mut t.passport, passport),
            (&mut t.status, status),
            (&mut t.site, site),
        ] {
            if !value.trim().is_empty() {
                *field = value.trim().to_string();
            }
        }
    }

    pub fn add(&mut self, record: &ErrorRecord, weights: &WeightTable) {
        let t = self.entry(&record.identity);
        if record.amount <= 0.0 {
            return;
        }
        *t.counts.entry(record.error_type.counted_as()).or_insert(0.0) += record.amount;
        t.total += record.amount;
        if record.error_type == ErrorType::UnresolvedCheck {
            t.unresolved_checks += record.amount;
        } else {
            t.add_to_site(&record.site, record.amount);
        }
        if !record.site.is_empty() {
            t.site = record.site.clone();
        }
        if let Some(month) = &record.month {
            t.details.push(DetailEntry {
                month: month.clone(),
                date: record.occurred_on.clone(),
                error_type: record.error_type,
                amount: record.amount,
                points: round2(weights.point_value(record.error_type, record.amount)),
            });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The totals of every identity seen, in first-seen order.
    pub fn finalize(self, weights: &WeightTable, chronic_threshold: u64) -> Vec<StaffTotal> {
        let mut res: Vec<StaffTotal> = Vec::with_capacity(self.entries.len());
        for mut t in self.entries {
            let mut chronic: u64 = 0;
            if chronic_threshold > 0 && t.unresolved_checks > 0.0 {
                let raw = t.unresolved_checks.floor();
                chronic = raw as u64 / chronic_threshold;
                if let Some(n) = t.counts.get_mut(&ErrorType::Note) {
                    *n = (*n - raw).max(0.0);
                }
                *t.counts.entry(ErrorType::ChronicNote).or_insert(0.0) += chronic as f64;
                t.total = (t.total - raw).max(0.0) + chronic as f64;
                if chronic > 0 {
                    // Chronic notes are booked on the last site seen.
                    let site = t.site.clone();
                    t.add_to_site(&site, chronic as f64);
                }
                debug!(
                    "finalize: {}: {} unresolved checks make {} chronic notes",
                    t.identity.key, raw, chronic
                );
            }
            let points: f64 = t
                .counts
                .iter()
                .map(|(et, n)| weights.point_value(*et, *n))
                .sum();
            t.details.sort_by(|a, b| {
                (&b.month, &b.date, b.error_type.label()).cmp(&(&a.month, &a.date, a.error_type.label()))
            });
            res.push(StaffTotal {
                identity: t.identity,
                passport: t.passport,
                status: t.status,
                site: t.site,
                total_count: t.total.round() as u64,
                per_type_counts: t.counts,
                chronic_count: chronic,
                point_subtotal: round2(points),
                sites: t
                    .site_counts
                    .into_iter()
                    .map(|(site, n)| SiteShare {
                        site,
                        total: n.round() as u64,
                    })
                    .collect(),
                details: t.details,
            });
        }
        res
    }
}

/// Builds the identity index of a staff roster. Names are in column 0.
pub fn roster_index(roster_rows: &[RawRow]) -> IdentityIndex {
    IdentityIndex::from_names(roster_rows.iter().map(|r| cell(r, 0)))
}

/// Totals per staff member of one site: every roster member appears, with
/// zero counts when the log never names them.
pub fn aggregate(
    log_rows: &[RawRow],
    roster_rows: &[RawRow],
    site: &str,
    domain: &DomainConfig,
) -> (Vec<StaffTotal>, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let identities = roster_index(roster_rows);
    identities.record_collisions(&mut diagnostics);
    let mut tally = StaffTally::new();
    for identity in identities.identities() {
        tally.seed(identity, site);
    }
    let records = records_from_log(log_rows, site, &identities, &domain.taxonomy, &mut diagnostics);
    for r in records.iter() {
        tally.add(r, &domain.weights);
    }
    info!(
        "aggregate: {}: {} records for {} staff",
        site,
        records.len(),
        tally.len()
    );
    (tally.finalize(&domain.weights, domain.chronic_threshold), diagnostics)
}
