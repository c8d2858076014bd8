mod config;
use log::{debug, info, warn};

pub mod builder;
pub mod catalog;
pub mod classify;
pub mod detail;
pub mod manual;
pub mod matrix;
pub mod months;
pub mod names;
pub mod rollup;
pub mod rows;
pub mod staff;
pub mod totals;

pub use crate::config::*;

use crate::names::IdentityIndex;
use crate::rows::{cell, strip_blank_rows};
use crate::staff::StaffTally;

// **** Private structures ****

// A site sheet after cleaning: log without its header, staff block split
// into the roster and the trusted total.
#[derive(Debug, Clone)]
struct PreparedSite {
    site: String,
    log: Vec<RawRow>,
    roster: Vec<RawRow>,
    block_total: u64,
}

impl PreparedSite {
    fn new(sheet: &SiteSheet) -> PreparedSite {
        let log = strip_blank_rows(&sheet.log_rows);
        let staff = strip_blank_rows(&sheet.staff_rows);
        let (block_total, roster) = totals::extract_total(&staff);
        PreparedSite {
            site: sheet.site.trim().to_string(),
            log: log.into_iter().skip(1).collect(),
            roster,
            block_total,
        }
    }
}

// The sheets to summarise, in leader map order. Without a map every sheet is used.
fn select_sites<'a>(
    sheets: &'a [SiteSheet],
    map: &SiteLeaderMap,
    diagnostics: &mut Diagnostics,
) -> Vec<&'a SiteSheet> {
    if map.is_empty() {
        return sheets.iter().collect();
    }
    let mut res: Vec<&SiteSheet> = Vec::new();
    for key in map.sites() {
        match sheets.iter().find(|s| s.site.trim().to_uppercase() == key) {
            Some(s) => res.push(s),
            None => {
                warn!("run_rekap: site {} is mapped but has no sheet", key);
                diagnostics.missing_sites.push(key.to_string());
            }
        }
    }
    for s in sheets {
        if map.leader_of(&s.site).is_none() {
            debug!("run_rekap: sheet {:?} is not mapped, skipping", s.site);
        }
    }
    res
}

/// Months found in the logs of the given sheets, most recent first.
pub fn available_months(sheets: &[SiteSheet], today: MonthLabel) -> Vec<MonthLabel> {
    let mut res: Vec<MonthLabel> = Vec::new();
    for s in sheets {
        let log: Vec<RawRow> = strip_blank_rows(&s.log_rows).into_iter().skip(1).collect();
        res.extend(months::available_months(&log, today));
    }
    res.sort();
    res.dedup();
    res.reverse();
    res
}

/// Runs the whole summary over a set of site sheets.
///
/// Arguments:
/// * `sheets` the site sheets, as fetched
/// * `domain` the pipeline configuration
/// * `map` the site to leader assignments. Only mapped sites are summarised, unless
///   the map is empty.
/// * `selector` the month to summarise, or all of them
/// * `today` the current month, which may be offered before its delimiter row exists
///
/// This never fails: everything that was skipped is counted in the report diagnostics.
pub fn run_rekap(
    sheets: &[SiteSheet],
    domain: &DomainConfig,
    map: &SiteLeaderMap,
    selector: MonthSelector,
    today: MonthLabel,
) -> RekapReport {
    info!(
        "Processing {} sheets for {}, month: {}, {} mapped sites",
        sheets.len(),
        domain.domain.name(),
        selector,
        map.entries().len()
    );
    let mut diagnostics = Diagnostics::default();
    let selected = select_sites(sheets, map, &mut diagnostics);
    let prepared: Vec<PreparedSite> = selected.iter().map(|s| PreparedSite::new(s)).collect();

    let mut identities = IdentityIndex::new();
    for p in prepared.iter() {
        for r in p.roster.iter() {
            identities.insert(cell(r, 0));
        }
    }
    identities.record_collisions(&mut diagnostics);

    let mut available: Vec<MonthLabel> = Vec::new();
    let mut all_staff = StaffTally::new();
    let mut site_totals: Vec<SiteTotal> = Vec::new();
    for p in prepared.iter() {
        available.extend(months::available_months(&p.log, today));
        let mut site_staff = StaffTally::new();
        for r in p.roster.iter() {
            if let Some(identity) = identities.resolve(cell(r, 0)) {
                all_staff.seed(identity, &p.site);
                site_staff.seed(identity, &p.site);
            }
        }
        let sliced = months::slice(&p.log, selector, today);
        let records = staff::records_from_log(
            &sliced,
            &p.site,
            &identities,
            &domain.taxonomy,
            &mut diagnostics,
        );
        for r in records.iter() {
            all_staff.add(r, &domain.weights);
            site_staff.add(r, &domain.weights);
        }
        let site_staff = site_staff.finalize(&domain.weights, domain.chronic_threshold);
        let total = match selector {
            MonthSelector::All => p.block_total,
            MonthSelector::Month(_) => site_staff.iter().map(|s| s.total_count).sum(),
        };
        debug!(
            "run_rekap: {}: {} log rows selected, {} records, total {}",
            p.site,
            sliced.len(),
            records.len(),
            total
        );
        site_totals.push(rollup::site_total(&p.site, total, &site_staff));
    }
    for missing in diagnostics.missing_sites.iter() {
        site_totals.push(rollup::site_total(missing, 0, &[]));
    }
    available.sort();
    available.dedup();
    available.reverse();

    let sites = rollup::by_site(site_totals);
    let mut staff_totals = all_staff.finalize(&domain.weights, domain.chronic_threshold);
    staff_totals.sort_by(|a, b| {
        b.total_count
            .cmp(&a.total_count)
            .then_with(|| a.identity.display.cmp(&b.identity.display))
    });
    let staff = rollup::by_staff_non_leader(&staff_totals, &map.leaders());
    let leaders = rollup::by_leader(&sites, map, domain.show_zero_sites);
    info!(
        "Done: {} sites, {} staff, {} leaders, {} months available",
        sites.len(),
        staff.len(),
        leaders.len(),
        available.len()
    );
    RekapReport {
        domain: domain.domain,
        month: selector,
        available_months: available,
        site_grand_total: rollup::site_grand_total(&sites),
        staff_grand_total: rollup::staff_grand_total(&staff),
        leader_grand_total: rollup::leader_grand_total(&leaders),
        sites,
        staff,
        staff_totals,
        leaders,
        diagnostics,
    }
}

/// Runs the summary of daily matrix sheets. Sites come from the staff rows.
pub fn run_matrix_rekap(sheets: &[MatrixSheet], domain: &DomainConfig, map: &SiteLeaderMap) -> MatrixReport {
    info!(
        "Processing {} matrix sheets for {}",
        sheets.len(),
        domain.domain.name()
    );
    let (staff, diagnostics) = matrix::aggregate_matrix(sheets, domain);
    let sites = rollup::by_staff_site(&staff);
    let leaders = rollup::by_leader(&sites, map, domain.show_zero_sites);
    MatrixReport {
        sheets: sheets.iter().map(|s| s.label.clone()).collect(),
        staff,
        sites,
        leaders,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rows(cells: &[&[&str]]) -> Vec<RawRow> {
        cells
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn m(s: &str) -> MonthLabel {
        MonthLabel::parse(s).unwrap()
    }

    fn depobos() -> SiteSheet {
        SiteSheet {
            site: "DEPOBOS".to_string(),
            log_rows: rows(&[
                &["Nama Staff", "Link Kesalahan", "Poin Kesalahan"],
                &["", "01/09/2025", ""],
                &["ALICE", "https://a", "SALAH RESPON"],
                &["JANE", "https://b", "TYPO"],
                &[],
                &["", "01/10/2025", ""],
                &["ALICE", "https://c", "TIDAK RESPON"],
                &["HENDY R", "https://d", "FATAL"],
                &["ZED", "https://e", "FATAL"],
                &["ALICE", "https://f", "KOPI"],
            ]),
            staff_rows: rows(&[
                &["NAMA", "TOTAL"],
                &["ALICE", "2"],
                &["JOHN / JANE", "1"],
                &["HENDY R", "1"],
                &["TOTAL", "40"],
            ]),
        }
    }

    fn patihtoto() -> SiteSheet {
        SiteSheet {
            site: "PatihToto".to_string(),
            log_rows: rows(&[
                &["Nama Staff", "Link Kesalahan", "Poin Kesalahan"],
                &["", "01/10/2025", ""],
                &["BOB", "https://g", "SALAH INFO"],
                &["BOB", "https://h", "SALAH INFO"],
            ]),
            staff_rows: rows(&[&["NAMA", "TOTAL"], &["BOB", "2"], &["CICI", "0"]]),
        }
    }

    fn map() -> SiteLeaderMap {
        SiteLeaderMap::from_pairs(&[
            ("DEPOBOS", "HENDY R"),
            ("PATIHTOTO", "GUNADI"),
            ("PARTAITOGEL", "GUNADI"),
        ])
    }

    #[test]
    fn all_months_use_sheet_totals() {
        init();
        let report = run_rekap(
            &[depobos(), patihtoto()],
            &DomainConfig::livechat(),
            &map(),
            MonthSelector::All,
            m("01-2026"),
        );
        assert_eq!(report.available_months, vec![m("10-2025"), m("09-2025")]);
        let names: Vec<&str> = report.sites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["DEPOBOS", "PatihToto", "PARTAITOGEL"]);
        assert_eq!(report.sites[0].total, 40);
        assert_eq!(report.sites[1].total, 2);
        assert_eq!(report.sites[2].total, 0);
        assert_eq!(report.site_grand_total, 42);
        assert_eq!(report.diagnostics.missing_sites, vec!["PARTAITOGEL".to_string()]);
        assert_eq!(report.diagnostics.unresolved_identities, 1);
        assert_eq!(report.diagnostics.unclassified, 1);

        let staff: Vec<(&str, u64)> = report
            .staff
            .iter()
            .map(|s| (s.name.as_str(), s.total))
            .collect();
        assert_eq!(
            staff,
            vec![("Alice", 2), ("Bob", 2), ("John / Jane", 1), ("Cici", 0)]
        );
        assert_eq!(report.staff[3].details, rollup::NO_ERRORS);

        let gunadi = report
            .leaders
            .iter()
            .find(|l| l.leader_name == "Gunadi")
            .unwrap();
        assert_eq!(gunadi.total, 2);
        assert_eq!(gunadi.site_breakdown.len(), 2);
        assert_eq!(gunadi.details, "Patihtoto (2)");
        assert_eq!(report.leader_grand_total, 42);
    }

    #[test]
    fn a_month_is_summed_from_its_rows() {
        init();
        let report = run_rekap(
            &[depobos(), patihtoto()],
            &DomainConfig::livechat(),
            &map(),
            MonthSelector::Month(m("09-2025")),
            m("01-2026"),
        );
        assert_eq!(report.sites[0].name, "DEPOBOS");
        assert_eq!(report.sites[0].total, 2);
        assert_eq!(report.sites[1].total, 0);
        let alice = report
            .staff_totals
            .iter()
            .find(|s| s.identity.key == "ALICE")
            .unwrap();
        assert_eq!(alice.total_count, 1);
        assert_eq!(alice.count_of(ErrorType::SalahRespon), 1.0);
    }

    #[test]
    fn empty_map_uses_every_sheet() {
        let report = run_rekap(
            &[patihtoto()],
            &DomainConfig::kesalahan(),
            &SiteLeaderMap::new(),
            MonthSelector::All,
            m("01-2026"),
        );
        assert_eq!(report.sites.len(), 1);
        assert!(report.leaders.is_empty());
        assert_eq!(report.staff_grand_total, 2);
        assert_eq!(
            available_months(&[patihtoto(), depobos()], m("01-2026")),
            vec![m("10-2025"), m("09-2025")]
        );
    }

    #[test]
    fn matrix_report_rolls_up_to_leaders() {
        init();
        let sheet = MatrixSheet {
            label: "OKT25".to_string(),
            rows: rows(&[
                &["", "", "", "", "01/10", ""],
                &["PASSPORT", "NAMA", "STATUS", "SITUS", "DP", "WD"],
                &["P1", "Alice", "AKTIF", "DEPOBOS", "4", "1"],
                &["P2", "Bob", "AKTIF", "", "2"],
            ]),
        };
        let report = run_matrix_rekap(&[sheet], &DomainConfig::kesalahan(), &map());
        assert_eq!(report.sheets, vec!["OKT25".to_string()]);
        assert_eq!(report.sites[0].name, "DEPOBOS");
        assert_eq!(report.sites[1].name, rollup::UNKNOWN_SITE);
        let hendy = &report.leaders[0];
        assert_eq!(hendy.leader_name, "Hendy R");
        assert_eq!(hendy.total, 5);
        assert_eq!(hendy.point_total, 2.0);
        assert_eq!(report.leaders[1].details, "Patihtoto (0) / Partaitogel (0)");
    }
}
