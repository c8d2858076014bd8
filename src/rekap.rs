use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use rekap_engine::catalog::SheetCatalog;
use rekap_engine::detail::{sheet_detail, special_sheet};
use rekap_engine::months::current_month;
use rekap_engine::rows::{format_count, format_points};
use rekap_engine::*;

use crate::args::Args;
use crate::rekap::cache::{Cache, FileCache, RANGE_TTL};
use crate::rekap::config_reader::*;
use crate::rekap::io_common::{A1Range, RangeRequest, SheetSource};
use crate::rekap::io_csv::CsvDirectory;
use crate::rekap::io_xlsx::XlsxWorkbook;

pub mod cache;
pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum RekapError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Sheet {sheet} not found in {path}"))]
    MissingSheet { path: String, sheet: String },
    #[snafu(display("Error reading {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Invalid A1 range {range:?}"))]
    InvalidRange { range: String },
    #[snafu(display("Invalid taxonomy"))]
    InvalidTaxonomy { source: RekapErrors },
    #[snafu(display("Invalid month {month:?}"))]
    InvalidMonth { source: RekapErrors, month: String },
    #[snafu(display("No input: pass --input or set sources.input in the configuration"))]
    MissingInput {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RekapResult<T> = Result<T, RekapError>;
pub type BRekapResult<T> = Result<T, Box<RekapError>>;

// ********* Reading *********

fn resolve_path(base: Option<&Path>, p: &str) -> String {
    let path = Path::new(p);
    match base {
        Some(b) if path.is_relative() => b.join(path).to_string_lossy().to_string(),
        _ => p.to_string(),
    }
}

fn guess_input_type(input: &str) -> String {
    let p = Path::new(input);
    if p.is_dir() {
        return "csv".to_string();
    }
    match p.extension().and_then(|x| x.to_str()) {
        Some(x) if x.eq_ignore_ascii_case("csv") => "csv".to_string(),
        _ => "xlsx".to_string(),
    }
}

fn open_source(
    args: &Args,
    config: &RekapConfig,
    config_dir: Option<&Path>,
) -> RekapResult<Box<dyn SheetSource>> {
    let input = match &args.input {
        Some(i) => i.clone(),
        None => {
            let i = config.sources.input.as_ref().context(MissingInputSnafu {})?;
            resolve_path(config_dir, i)
        }
    };
    let input_type = args
        .input_type
        .clone()
        .or_else(|| config.sources.input_type.clone())
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| guess_input_type(&input));
    info!("Reading {} input {}", input_type, input);
    match input_type.as_str() {
        "xlsx" => Ok(Box::new(XlsxWorkbook::open(&input)?)),
        "csv" => Ok(Box::new(CsvDirectory::open(&input)?)),
        x => whatever!("unknown input type {:?}, expected xlsx or csv", x),
    }
}

/// Reads ranges through the cache. Ranges not cached are read in one batch.
fn fetch_ranges<C: Cache>(
    cache: &C,
    source: &dyn SheetSource,
    requests: &[RangeRequest],
) -> Vec<Vec<RawRow>> {
    let source_id = source.source_id();
    let keys: Vec<String> = requests
        .iter()
        .map(|(sheet, range)| format!("range:{}:{}:{:?}", source_id, sheet, range))
        .collect();
    let mut res: Vec<Option<Vec<RawRow>>> = keys
        .iter()
        .map(|k| {
            cache
                .get_raw(k, RANGE_TTL)
                .and_then(|js| serde_json::from_value(js).ok())
        })
        .collect();
    let missing: Vec<usize> = (0..requests.len()).filter(|i| res[*i].is_none()).collect();
    debug!(
        "fetch_ranges: {} ranges, {} from the cache",
        requests.len(),
        requests.len() - missing.len()
    );
    if !missing.is_empty() {
        let batch: Vec<RangeRequest> = missing.iter().map(|i| requests[*i].clone()).collect();
        let fetched = source.fetch_ranges_batch(&batch);
        for (i, rows) in missing.into_iter().zip(fetched.into_iter()) {
            if !rows.is_empty() {
                cache.put_raw(&keys[i], &json!(rows));
            }
            res[i] = Some(rows);
        }
    }
    res.into_iter().map(|r| r.unwrap_or_default()).collect()
}

fn read_site_sheets<C: Cache>(
    cache: &C,
    source: &dyn SheetSource,
    sites: &[String],
    dc: &DomainConfig,
) -> RekapResult<Vec<SiteSheet>> {
    let log_range = A1Range::parse(&dc.log_range)?;
    let staff_range = A1Range::parse(&dc.staff_range)?;
    let mut requests: Vec<RangeRequest> = Vec::new();
    for s in sites {
        requests.push((s.clone(), log_range.clone()));
        requests.push((s.clone(), staff_range.clone()));
    }
    let fetched = fetch_ranges(cache, source, &requests);
    Ok(sites
        .iter()
        .zip(fetched.chunks(2))
        .map(|(site, ranges)| SiteSheet {
            site: site.clone(),
            log_rows: ranges.first().cloned().unwrap_or_default(),
            staff_rows: ranges.get(1).cloned().unwrap_or_default(),
        })
        .collect())
}

fn read_matrix_sheets<C: Cache>(
    cache: &C,
    source: &dyn SheetSource,
    labels: &[String],
    dc: &DomainConfig,
) -> RekapResult<Vec<MatrixSheet>> {
    let range = A1Range::parse(&dc.matrix_range)?;
    let requests: Vec<RangeRequest> = labels.iter().map(|l| (l.clone(), range.clone())).collect();
    let fetched = fetch_ranges(cache, source, &requests);
    Ok(labels
        .iter()
        .zip(fetched.into_iter())
        .map(|(label, rows)| MatrixSheet {
            label: label.clone(),
            rows,
        })
        .collect())
}

/// The site sheets to summarise: the mapped sites found in the catalog, in
/// map order, or every site sheet when nothing is mapped.
fn sites_to_read(catalog: &SheetCatalog, map: &SiteLeaderMap) -> Vec<String> {
    if map.is_empty() {
        return catalog.site_sheets.clone();
    }
    map.sites()
        .filter_map(|key| {
            catalog
                .site_sheets
                .iter()
                .find(|n| n.trim().to_uppercase() == key)
                .cloned()
        })
        .collect()
}

// ********* Writing *********

fn staff_total_js(s: &StaffTotal) -> JSValue {
    let counts: JSMap<String, JSValue> = s
        .per_type_counts
        .iter()
        .map(|(t, c)| (t.label().to_string(), json!(c)))
        .collect();
    let sites: Vec<JSValue> = s
        .sites
        .iter()
        .map(|sh| json!({"site": sh.site, "total": sh.total}))
        .collect();
    let details: Vec<JSValue> = s
        .details
        .iter()
        .map(|d| {
            json!({
                "month": d.month,
                "date": d.date,
                "type": d.error_type.label(),
                "amount": d.amount,
                "points": d.points,
            })
        })
        .collect();
    json!({
        "name": s.identity.display,
        "key": s.identity.key,
        "passport": s.passport,
        "status": s.status,
        "site": s.site,
        "total": s.total_count,
        "totalDisplay": format_count(s.total_count),
        "counts": counts,
        "chronicNotes": s.chronic_count,
        "points": s.point_subtotal,
        "pointDisplay": format_points(s.point_subtotal),
        "sites": sites,
        "details": details,
    })
}

fn site_total_js(s: &SiteTotal) -> JSValue {
    let staff: Vec<JSValue> = s
        .staff_breakdown
        .iter()
        .map(|sh| json!({"name": sh.name, "total": sh.total}))
        .collect();
    json!({
        "name": s.name,
        "total": s.total,
        "totalDisplay": format_count(s.total),
        "points": s.point_total,
        "pointDisplay": format_points(s.point_total),
        "staffCount": s.staff_count,
        "staff": staff,
    })
}

fn leader_total_js(l: &LeaderTotal) -> JSValue {
    let sites: Vec<JSValue> = l
        .site_breakdown
        .iter()
        .map(|s| json!({"site": s.site, "total": s.total, "points": s.point_total}))
        .collect();
    json!({
        "name": l.leader_name,
        "total": l.total,
        "totalDisplay": format_count(l.total),
        "points": l.point_total,
        "pointDisplay": format_points(l.point_total),
        "sites": sites,
        "details": l.details,
    })
}

fn staff_rank_js(r: &StaffRank) -> JSValue {
    json!({
        "rank": r.rank,
        "name": r.name,
        "total": r.total,
        "totalDisplay": format_count(r.total),
        "points": r.point_total,
        "pointDisplay": format_points(r.point_total),
        "details": r.details,
    })
}

fn diagnostics_js(d: &Diagnostics) -> JSValue {
    let collisions: Vec<JSValue> = d
        .alias_collisions
        .iter()
        .map(|(alias, before, after)| json!({"alias": alias, "previous": before, "current": after}))
        .collect();
    json!({
        "malformedRows": d.malformed_rows,
        "unresolvedIdentities": d.unresolved_identities,
        "unclassified": d.unclassified,
        "aliasCollisions": collisions,
        "missingSites": d.missing_sites,
    })
}

fn matrix_report_js(m: &MatrixReport) -> JSValue {
    json!({
        "sheets": m.sheets,
        "staff": m.staff.iter().map(staff_total_js).collect::<Vec<_>>(),
        "sites": m.sites.iter().map(site_total_js).collect::<Vec<_>>(),
        "leaders": m.leaders.iter().map(leader_total_js).collect::<Vec<_>>(),
        "diagnostics": diagnostics_js(&m.diagnostics),
    })
}

fn special_sheet_js(name: &str, rows: &[RawRow]) -> JSValue {
    let (headers, rows) = special_sheet(rows);
    json!({"sheet": name, "kind": "special", "headers": headers, "rows": rows})
}

fn build_summary_js(
    report: &RekapReport,
    matrix: Option<&MatrixReport>,
    specials: &[JSValue],
    catalog: &SheetCatalog,
) -> JSValue {
    let months: Vec<String> = report
        .available_months
        .iter()
        .map(|m| m.to_string())
        .collect();
    json!({
        "domain": report.domain.name(),
        "month": report.month.to_string(),
        "availableMonths": months,
        "navigation": catalog.navigation,
        "sites": report.sites.iter().map(site_total_js).collect::<Vec<_>>(),
        "siteGrandTotal": report.site_grand_total,
        "staff": report.staff.iter().map(staff_rank_js).collect::<Vec<_>>(),
        "staffGrandTotal": report.staff_grand_total,
        "staffTotals": report.staff_totals.iter().map(staff_total_js).collect::<Vec<_>>(),
        "leaders": report.leaders.iter().map(leader_total_js).collect::<Vec<_>>(),
        "leaderGrandTotal": report.leader_grand_total,
        "matrix": matrix.map(matrix_report_js),
        "specialSheets": specials,
        "diagnostics": diagnostics_js(&report.diagnostics),
    })
}

/// The detail view of one sheet: a special sheet or a site sheet.
fn sheet_js<C: Cache>(
    cache: &C,
    source: &dyn SheetSource,
    rc: &RuntimeConfig,
    dc: &DomainConfig,
    catalog: &SheetCatalog,
    name: &str,
) -> RekapResult<JSValue> {
    if let Some(r) = rc.special_range(name) {
        let range = A1Range::parse(r)?;
        let rows = fetch_ranges(cache, source, &[(name.to_string(), range)]);
        return Ok(special_sheet_js(name, rows.first().map(|r| r.as_slice()).unwrap_or(&[])));
    }
    let sheet = match catalog
        .site_sheets
        .iter()
        .find(|n| n.trim().eq_ignore_ascii_case(name.trim()))
    {
        Some(s) => s.clone(),
        None => whatever!("sheet {:?} is not a visible site sheet", name),
    };
    let sheets = read_site_sheets(cache, source, &[sheet.clone()], dc)?;
    let (log_rows, staff_rows) = match sheets.first() {
        Some(s) => (s.log_rows.clone(), s.staff_rows.clone()),
        None => (Vec::new(), Vec::new()),
    };
    let d = sheet_detail(&log_rows, &staff_rows, dc.log_width);
    Ok(json!({
        "sheet": sheet,
        "kind": "site",
        "logHeaders": d.log_headers,
        "logRows": d.log_rows,
        "staffHeaders": d.staff_headers,
        "staffRows": d.staff_rows,
        "staffTotal": d.staff_total,
        "staffTotalDisplay": format_count(d.staff_total),
    }))
}

fn read_reference(path: &str) -> RekapResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn check_reference(reference_path: &str, pretty_js: &str) -> RekapResult<()> {
    let reference = read_reference(reference_path)?;
    let pretty_ref = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    if pretty_ref != pretty_js {
        warn!("Found differences with the reference summary");
        print_diff(pretty_ref.as_str(), pretty_js, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("Summary matches the reference {}", reference_path);
    Ok(())
}

/// Where the output goes: `--out`, then the output settings of the
/// configuration. `None` is the standard output.
fn output_path(args: &Args, config: &RekapConfig, config_dir: Option<&Path>) -> Option<String> {
    if let Some(o) = &args.out {
        return match o.trim() {
            "" | "stdout" => None,
            x => Some(x.to_string()),
        };
    }
    let dir = config.output_settings.output_directory.as_ref()?;
    let file = config
        .output_settings
        .report_file_name
        .clone()
        .unwrap_or_else(|| "rekap.json".to_string());
    let p: PathBuf = Path::new(&resolve_path(config_dir, dir)).join(file);
    Some(p.to_string_lossy().to_string())
}

fn emit(
    args: &Args,
    config: &RekapConfig,
    config_dir: Option<&Path>,
    js: &JSValue,
) -> RekapResult<()> {
    let pretty_js = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
    match output_path(args, config, config_dir) {
        None => println!("{}", pretty_js),
        Some(p) => {
            if let Some(parent) = Path::new(&p).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).context(WritingOutputSnafu { path: p.clone() })?;
                }
            }
            fs::write(&p, &pretty_js).context(WritingOutputSnafu { path: p.clone() })?;
            info!("Summary written to {}", p);
        }
    }
    if let Some(reference) = &args.reference {
        check_reference(reference, &pretty_js)?;
    }
    Ok(())
}

// ********* Driver *********

pub fn run(args: &Args) -> BRekapResult<()> {
    run_at(args, current_month())
}

/// Runs the command line program, `today` being the current month.
pub fn run_at(args: &Args, today: MonthLabel) -> BRekapResult<()> {
    let cache = FileCache::new(args.cache_dir.as_deref());
    let config_dir: Option<PathBuf> = args
        .config
        .as_ref()
        .and_then(|p| Path::new(p).parent().map(|d| d.to_path_buf()));
    let config_dir = config_dir.as_deref();
    let config = match &args.config {
        Some(p) => FileConfigStore::new(p, &cache).load()?,
        None => {
            info!("No configuration file, using the stock settings");
            RekapConfig::default()
        }
    };
    debug!("config: {:?}", config);

    let domain = parse_domain(args.domain.as_deref())?;
    let rc = config.runtime_config();
    let dc = config.domain_config(&rc, domain)?;
    let map = rc.site_leader_map(domain).clone();

    let source = open_source(args, &config, config_dir)?;
    let names_key = format!("sheets:{}", source.source_id());
    let sheet_names: Vec<String> =
        cache.get_or_compute(&names_key, RANGE_TTL, || Ok(source.sheet_names()))?;
    let special: Vec<String> = rc.special_sheets.iter().map(|(n, _)| n.clone()).collect();
    let catalog = SheetCatalog::new(&sheet_names, &rc.hidden_sheets, &special);
    info!(
        "{} sheets, {} site sheets, {} special sheets",
        sheet_names.len(),
        catalog.site_sheets.len(),
        special.len()
    );

    if let Some(name) = &args.sheet {
        let js = sheet_js(&cache, source.as_ref(), &rc, &dc, &catalog, name)?;
        emit(args, &config, config_dir, &js)?;
        return Ok(());
    }

    let sites = sites_to_read(&catalog, &map);
    let sheets = read_site_sheets(&cache, source.as_ref(), &sites, &dc)?;

    if args.list_months {
        let months: Vec<String> = available_months(&sheets, today)
            .iter()
            .map(|m| m.to_string())
            .collect();
        let js = json!({"domain": domain.name(), "availableMonths": months});
        emit(args, &config, config_dir, &js)?;
        return Ok(());
    }

    let month = args.month.clone().unwrap_or_else(|| "all".to_string());
    let selector = MonthSelector::parse(&month).context(InvalidMonthSnafu {
        month: month.clone(),
    })?;
    let report = run_rekap(&sheets, &dc, &map, selector, today);

    let matrix = if domain == Domain::Kesalahan && !config.sources.matrix_sheets.is_empty() {
        let msheets =
            read_matrix_sheets(&cache, source.as_ref(), &config.sources.matrix_sheets, &dc)?;
        Some(run_matrix_rekap(&msheets, &dc, &map))
    } else {
        None
    };

    let mut specials: Vec<JSValue> = Vec::new();
    for (name, r) in rc.special_sheets.iter() {
        let range = A1Range::parse(r)?;
        let rows = fetch_ranges(&cache, source.as_ref(), &[(name.clone(), range)]);
        specials.push(special_sheet_js(
            name,
            rows.first().map(|r| r.as_slice()).unwrap_or(&[]),
        ));
    }

    let result_js = build_summary_js(&report, matrix.as_ref(), &specials, &catalog);
    emit(args, &config, config_dir, &result_js)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        dir: PathBuf,
    }

    impl Fixture {
        fn new(name: &str) -> Fixture {
            let _ = env_logger::builder().is_test(true).try_init();
            let dir = std::env::temp_dir().join(format!("rekap-run-{}-{}", name, std::process::id()));
            let _ = fs::remove_dir_all(&dir);
            let sheets = dir.join("sheets");
            fs::create_dir_all(&sheets).unwrap();
            fs::write(
                sheets.join("DEPOBOS.csv"),
                "Nama Staff,Link Kesalahan,Poin Kesalahan,,,,,NAMA,TOTAL\n\
                 ,01/09/2025,,,,,,ALICE,2\n\
                 ALICE,http://a,SALAH RESPON,,,,,BOB,1\n\
                 BOB,http://b,TYPO,,,,,TOTAL,3\n\
                 ALICE,http://c,LAMBAT RESPON\n",
            )
            .unwrap();
            fs::write(
                sheets.join("PATIHTOTO.csv"),
                "Nama Staff,Link Kesalahan,Poin Kesalahan,,,,,NAMA,TOTAL\n\
                 ,01/10/2025,,,,,,CAROL,1\n\
                 CAROL,http://d,FATAL\n",
            )
            .unwrap();
            fs::write(sheets.join("LEADER.csv"), "x\n").unwrap();
            fs::write(
                sheets.join("FATAL.csv"),
                "Kode,Poin Kesalahan,Ketentuan,extra\nF1,5\n",
            )
            .unwrap();
            fs::write(
                dir.join("config.json"),
                r#"{
                    "sources": {"input": "sheets", "inputType": "csv"},
                    "sites": [
                        {"siteNameLivechat": "DEPOBOS", "leaderName": "HENDY R", "isActive": true},
                        {"siteNameLivechat": "PATIHTOTO", "leaderName": "GUNADI", "isActive": true},
                        {"siteNameLivechat": "GONE", "leaderName": "GUNADI", "isActive": false}
                    ],
                    "specialSheets": [{"sheetName": "FATAL", "range": "A1:C"}],
                    "hiddenSheets": ["LEADER"]
                }"#,
            )
            .unwrap();
            Fixture { dir }
        }

        fn args(&self) -> Args {
            Args {
                config: Some(self.dir.join("config.json").to_string_lossy().to_string()),
                domain: None,
                reference: None,
                out: Some(self.out()),
                input: None,
                input_type: None,
                month: None,
                sheet: None,
                cache_dir: None,
                list_months: false,
                verbose: false,
            }
        }

        fn out(&self) -> String {
            self.dir.join("out").join("rekap.json").to_string_lossy().to_string()
        }

        fn output(&self) -> JSValue {
            read_reference(&self.out()).unwrap()
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    fn october_2026() -> MonthLabel {
        MonthLabel::new(2026, 10).unwrap()
    }

    #[test]
    fn summary_over_csv_exports() {
        let f = Fixture::new("all");
        run_at(&f.args(), october_2026()).unwrap();
        let js = f.output();
        assert_eq!(js["domain"], "livechat");
        assert_eq!(js["siteGrandTotal"], 4);
        assert_eq!(js["sites"][0]["name"], "DEPOBOS");
        assert_eq!(js["sites"][0]["total"], 3);
        assert_eq!(js["leaders"][0]["name"], "Hendy R");
        assert_eq!(js["leaders"][0]["details"], "Depobos (3)");
        assert_eq!(js["leaders"][1]["details"], "Patihtoto (1)");
        assert_eq!(js["staff"][0]["name"], "Alice");
        assert_eq!(js["staff"][0]["total"], 2);
        assert_eq!(js["staffGrandTotal"], 4);
        assert_eq!(
            js["availableMonths"],
            json!(["10-2025", "09-2025"])
        );
        assert_eq!(js["navigation"], json!(["DEPOBOS", "PATIHTOTO", "FATAL"]));
        assert_eq!(js["specialSheets"][0]["rows"][1], json!(["F1", "5", ""]));
        assert_eq!(js["matrix"], JSValue::Null);
    }

    #[test]
    fn one_month() {
        let f = Fixture::new("month");
        let mut args = f.args();
        args.month = Some("09-2025".to_string());
        run_at(&args, october_2026()).unwrap();
        let js = f.output();
        assert_eq!(js["month"], "09-2025");
        assert_eq!(js["siteGrandTotal"], 3);
        assert_eq!(js["leaders"][1]["name"], "Gunadi");
        assert_eq!(js["leaders"][1]["total"], 0);
        assert_eq!(js["leaders"][1]["details"], "");
    }

    #[test]
    fn invalid_month_fails() {
        let f = Fixture::new("badmonth");
        let mut args = f.args();
        args.month = Some("2025-09".to_string());
        assert!(run_at(&args, october_2026()).is_err());
    }

    #[test]
    fn sheet_detail_view() {
        let f = Fixture::new("sheet");
        let mut args = f.args();
        args.sheet = Some("depobos".to_string());
        run_at(&args, october_2026()).unwrap();
        let js = f.output();
        assert_eq!(js["kind"], "site");
        assert_eq!(js["staffTotal"], 3);
        assert_eq!(js["logRows"].as_array().map(|a| a.len()), Some(4));
        assert_eq!(js["logRows"][0], json!(["", "01/09/2025", ""]));

        args.sheet = Some("LEADER".to_string());
        assert!(run_at(&args, october_2026()).is_err());
    }

    #[test]
    fn list_months() {
        let f = Fixture::new("months");
        let mut args = f.args();
        args.list_months = true;
        run_at(&args, october_2026()).unwrap();
        assert_eq!(f.output()["availableMonths"], json!(["10-2025", "09-2025"]));
    }

    #[test]
    fn reference_comparison() {
        let f = Fixture::new("reference");
        let args = f.args();
        run_at(&args, october_2026()).unwrap();
        let reference = f.dir.join("reference.json");
        fs::copy(f.out(), &reference).unwrap();

        let mut args = f.args();
        args.reference = Some(reference.to_string_lossy().to_string());
        run_at(&args, october_2026()).unwrap();

        fs::write(&reference, r#"{"siteGrandTotal": 5}"#).unwrap();
        assert!(run_at(&args, october_2026()).is_err());
    }

    #[test]
    fn missing_input() {
        let args = Args {
            config: None,
            domain: Some("kesalahan".to_string()),
            reference: None,
            out: None,
            input: None,
            input_type: None,
            month: None,
            sheet: None,
            cache_dir: None,
            list_months: false,
            verbose: false,
        };
        let e = run_at(&args, october_2026()).unwrap_err();
        assert!(matches!(*e, RekapError::MissingInput {}));
    }
}
