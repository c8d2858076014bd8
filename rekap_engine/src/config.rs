// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// A row as returned by the spreadsheet source: ordered cells, no schema.
pub type RawRow = Vec<String>;

/// One site sheet, already fetched by the caller.
///
/// Both ranges are passed exactly as the source returned them, header row
/// included. Blank rows are tolerated.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SiteSheet {
    pub site: String,
    /// The error log (`Nama Staff`, `Link Kesalahan`, `Poin Kesalahan`, optional amount).
    pub log_rows: Vec<RawRow>,
    /// The staff block: a header, one row per staff (`name`, `total`, ...), optionally a TOTAL row.
    pub staff_rows: Vec<RawRow>,
}

/// A monthly sheet laid out as a daily matrix: two header rows (dates, then
/// types), then `[passport, name, status, site, cells...]`.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MatrixSheet {
    pub label: String,
    pub rows: Vec<RawRow>,
}

/// The fixed error taxonomy.
///
/// `UnresolvedCheck` is the "pengecekan tidak berujung" sub-type of `Note`: it
/// is counted as a note while rows are read and folded into `ChronicNote`
/// once a staff member's rows have all been counted.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum ErrorType {
    Dp,
    Wd,
    SalahRespon,
    TidakRespon,
    LambatRespon,
    SalahInfo,
    SalahProses,
    Typo,
    Fatal,
    Note,
    UnresolvedCheck,
    ChronicNote,
}

impl ErrorType {
    pub const ALL: [ErrorType; 12] = [
        ErrorType::Dp,
        ErrorType::Wd,
        ErrorType::SalahRespon,
        ErrorType::TidakRespon,
        ErrorType::LambatRespon,
        ErrorType::SalahInfo,
        ErrorType::SalahProses,
        ErrorType::Typo,
        ErrorType::Fatal,
        ErrorType::Note,
        ErrorType::UnresolvedCheck,
        ErrorType::ChronicNote,
    ];

    /// The type whose label is `s`, ignoring case and extra spaces.
    pub fn from_label(s: &str) -> Option<ErrorType> {
        let norm = crate::classify::normalize_phrase(s);
        ErrorType::ALL.iter().find(|t| t.label() == norm).cloned()
    }

    /// The bucket an occurrence is counted under while reading rows.
    pub fn counted_as(&self) -> ErrorType {
        match self {
            ErrorType::UnresolvedCheck => ErrorType::Note,
            t => *t,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ErrorType::Dp => "DP",
            ErrorType::Wd => "WD",
            ErrorType::SalahRespon => "SALAH RESPON",
            ErrorType::TidakRespon => "TIDAK RESPON",
            ErrorType::LambatRespon => "LAMBAT RESPON",
            ErrorType::SalahInfo => "SALAH INFO",
            ErrorType::SalahProses => "SALAH PROSES",
            ErrorType::Typo => "TYPO",
            ErrorType::Fatal => "FATAL",
            ErrorType::Note => "NOTE",
            ErrorType::UnresolvedCheck => "PENGECEKAN TIDAK BERUJUNG",
            ErrorType::ChronicNote => "NOTE KRONIS",
        }
    }
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A calendar month, rendered as `MM-YYYY`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct MonthLabel {
    // Field order matters: the derived ordering is calendar order.
    pub year: i32,
    pub month: u32,
}

impl MonthLabel {
    pub fn new(year: i32, month: u32) -> Option<MonthLabel> {
        if (1..=12).contains(&month) {
            Some(MonthLabel { year, month })
        } else {
            None
        }
    }

    pub fn next(&self) -> MonthLabel {
        if self.month == 12 {
            MonthLabel {
                year: self.year + 1,
                month: 1,
            }
        } else {
            MonthLabel {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Parses `MM-YYYY`.
    pub fn parse(s: &str) -> Result<MonthLabel, RekapErrors> {
        let bad = || RekapErrors::InvalidMonthLabel(s.to_string());
        let (m, y) = s.trim().split_once('-').ok_or_else(bad)?;
        let month: u32 = m.parse().map_err(|_| bad())?;
        let year: i32 = y.parse().map_err(|_| bad())?;
        if y.len() != 4 {
            return Err(bad());
        }
        MonthLabel::new(year, month).ok_or_else(bad)
    }
}

impl Display for MonthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

/// Which part of an error log to aggregate.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum MonthSelector {
    All,
    Month(MonthLabel),
}

impl MonthSelector {
    /// `all`, an empty string or `MM-YYYY`.
    pub fn parse(s: &str) -> Result<MonthSelector, RekapErrors> {
        let t = s.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("all") {
            Ok(MonthSelector::All)
        } else {
            MonthLabel::parse(t).map(MonthSelector::Month)
        }
    }
}

impl Display for MonthSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonthSelector::All => write!(f, "all"),
            MonthSelector::Month(m) => write!(f, "{}", m),
        }
    }
}

/// A month and its half-open row range `[start, end)` in a log.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct MonthBucket {
    pub label: MonthLabel,
    pub start: usize,
    pub end: usize,
}

// ******** Output data structures *********

/// The canonical identity of a staff member.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct StaffIdentity {
    /// Upper-case ASCII alphanumerics and `/`.
    pub key: String,
    /// Title-cased original spelling.
    pub display: String,
}

/// One classified error, read from a log row or a matrix cell.
#[derive(PartialEq, Debug, Clone)]
pub struct ErrorRecord {
    pub identity: StaffIdentity,
    pub site: String,
    /// A month bucket label, a date label or the raw second cell of the log row.
    pub occurred_on: String,
    /// Set for records that carry a per-date detail (matrix sheets).
    pub month: Option<String>,
    pub error_type: ErrorType,
    pub amount: f64,
}

/// One line of a staff member's per-date detail.
#[derive(PartialEq, Debug, Clone)]
pub struct DetailEntry {
    pub month: String,
    pub date: String,
    pub error_type: ErrorType,
    pub amount: f64,
    pub points: f64,
}

/// How much of a staff member's total comes from one site.
#[derive(PartialEq, Debug, Clone)]
pub struct SiteShare {
    pub site: String,
    pub total: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StaffTotal {
    pub identity: StaffIdentity,
    pub passport: String,
    pub status: String,
    /// The last site this staff member was seen on.
    pub site: String,
    pub total_count: u64,
    pub per_type_counts: BTreeMap<ErrorType, f64>,
    pub chronic_count: u64,
    pub point_subtotal: f64,
    pub sites: Vec<SiteShare>,
    pub details: Vec<DetailEntry>,
}

impl StaffTotal {
    pub fn count_of(&self, t: ErrorType) -> f64 {
        self.per_type_counts.get(&t).cloned().unwrap_or(0.0)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct StaffShare {
    pub name: String,
    pub total: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SiteTotal {
    /// Upper-cased site name, the key used by the leader mapping.
    pub site_key: String,
    pub name: String,
    pub total: u64,
    pub point_total: f64,
    pub staff_count: usize,
    pub staff_breakdown: Vec<StaffShare>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct LeaderSite {
    pub site: String,
    pub total: u64,
    pub point_total: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct LeaderTotal {
    pub leader_name: String,
    pub total: u64,
    pub point_total: f64,
    pub site_breakdown: Vec<LeaderSite>,
    /// `Site (12) / Other (3)`, subject to the zero-site display policy.
    pub details: String,
}

/// A line of the staff leaderboard.
#[derive(PartialEq, Debug, Clone)]
pub struct StaffRank {
    pub rank: usize,
    pub name: String,
    pub total: u64,
    pub point_total: f64,
    pub details: String,
}

/// Why a row did not contribute to an aggregation.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SkipReason {
    MalformedRow,
    UnresolvedIdentity,
    UnclassifiedErrorType,
}

/// Counters for everything the engine skipped instead of failing.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Diagnostics {
    pub malformed_rows: usize,
    pub unresolved_identities: usize,
    pub unclassified: usize,
    /// (alias, previous identity, new identity)
    pub alias_collisions: Vec<(String, String, String)>,
    /// Sites present in the leader mapping without any sheet.
    pub missing_sites: Vec<String>,
}

impl Diagnostics {
    pub fn skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MalformedRow => self.malformed_rows += 1,
            SkipReason::UnresolvedIdentity => self.unresolved_identities += 1,
            SkipReason::UnclassifiedErrorType => self.unclassified += 1,
        }
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.malformed_rows += other.malformed_rows;
        self.unresolved_identities += other.unresolved_identities;
        self.unclassified += other.unclassified;
        self.alias_collisions.extend(other.alias_collisions);
        self.missing_sites.extend(other.missing_sites);
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct RekapReport {
    pub domain: Domain,
    pub month: MonthSelector,
    /// Descending calendar order.
    pub available_months: Vec<MonthLabel>,
    pub sites: Vec<SiteTotal>,
    pub staff: Vec<StaffRank>,
    pub staff_totals: Vec<StaffTotal>,
    pub leaders: Vec<LeaderTotal>,
    pub site_grand_total: u64,
    pub staff_grand_total: u64,
    pub leader_grand_total: u64,
    pub diagnostics: Diagnostics,
}

/// The summary built from daily matrix sheets.
#[derive(PartialEq, Debug, Clone)]
pub struct MatrixReport {
    pub sheets: Vec<String>,
    /// Descending by total.
    pub staff: Vec<StaffTotal>,
    pub sites: Vec<SiteTotal>,
    pub leaders: Vec<LeaderTotal>,
    pub diagnostics: Diagnostics,
}

/// Errors in the configuration handed to the engine.
///
/// Data problems are never reported this way: they end up in `Diagnostics`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RekapErrors {
    EmptyPhrase,
    /// A phrase that can never match because an earlier phrase is a prefix of it.
    ShadowedPhrase { earlier: String, later: String },
    InvalidMonthLabel(String),
}

impl Error for RekapErrors {}

impl Display for RekapErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RekapErrors::EmptyPhrase => write!(f, "taxonomy contains an empty phrase"),
            RekapErrors::ShadowedPhrase { earlier, later } => write!(
                f,
                "taxonomy phrase {:?} is shadowed by the earlier phrase {:?}",
                later, earlier
            ),
            RekapErrors::InvalidMonthLabel(s) => {
                write!(f, "invalid month {:?}, expected MM-YYYY or all", s)
            }
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Domain {
    Livechat,
    Kesalahan,
}

impl Domain {
    pub fn name(&self) -> &'static str {
        match self {
            Domain::Livechat => "livechat",
            Domain::Kesalahan => "kesalahan",
        }
    }
}

/// Site to leader assignments, in configuration order.
///
/// Site keys are stored upper-cased. A site appears at most once; a later
/// assignment of the same site replaces the earlier leader.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SiteLeaderMap {
    entries: Vec<(String, String)>,
}

impl SiteLeaderMap {
    pub fn new() -> SiteLeaderMap {
        SiteLeaderMap::default()
    }

    pub fn insert(&mut self, site: &str, leader: &str) {
        let key = site.trim().to_uppercase();
        let leader = leader.trim().to_string();
        if key.is_empty() || leader.is_empty() {
            return;
        }
        if let Some(e) = self.entries.iter_mut().find(|(s, _)| *s == key) {
            e.1 = leader;
        } else {
            self.entries.push((key, leader));
        }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> SiteLeaderMap {
        let mut m = SiteLeaderMap::new();
        for (s, l) in pairs {
            m.insert(s, l);
        }
        m
    }

    pub fn leader_of(&self, site: &str) -> Option<&str> {
        let key = site.trim().to_uppercase();
        self.entries
            .iter()
            .find(|(s, _)| *s == key)
            .map(|(_, l)| l.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn sites(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    /// Distinct leaders (compared case-insensitively), first appearance first.
    pub fn leaders(&self) -> Vec<String> {
        let mut res: Vec<String> = Vec::new();
        for (_, l) in self.entries.iter() {
            if !res.iter().any(|r| r.eq_ignore_ascii_case(l)) {
                res.push(l.clone());
            }
        }
        res
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A global setting: either a single value or a list.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Setting {
    Text(String),
    List(Vec<String>),
}

/// Configuration of one aggregation pipeline.
///
/// The livechat and kesalahan reports run the same pipeline with different
/// instances of this structure.
#[derive(PartialEq, Debug, Clone)]
pub struct DomainConfig {
    pub domain: Domain,
    pub log_range: String,
    pub staff_range: String,
    pub matrix_range: String,
    /// Columns kept for display of the error log.
    pub log_width: usize,
    pub taxonomy: crate::classify::Taxonomy,
    pub weights: crate::classify::WeightTable,
    /// Unresolved checks per chronic note. Zero disables the folding.
    pub chronic_threshold: u64,
    /// Whether zero-total sites are listed in a leader's display string.
    pub show_zero_sites: bool,
}

impl DomainConfig {
    pub fn livechat() -> DomainConfig {
        DomainConfig {
            domain: Domain::Livechat,
            log_range: "A1:C".to_string(),
            staff_range: "H1:AH".to_string(),
            matrix_range: "A2:BN".to_string(),
            log_width: 3,
            taxonomy: crate::classify::Taxonomy::standard(),
            weights: crate::classify::WeightTable::standard(),
            chronic_threshold: crate::classify::CHRONIC_THRESHOLD,
            show_zero_sites: false,
        }
    }

    pub fn kesalahan() -> DomainConfig {
        DomainConfig {
            domain: Domain::Kesalahan,
            log_range: "A1:D".to_string(),
            staff_range: "H1:AH".to_string(),
            matrix_range: "A2:BN".to_string(),
            show_zero_sites: true,
            ..DomainConfig::livechat()
        }
    }

    pub fn for_domain(domain: Domain) -> DomainConfig {
        match domain {
            Domain::Livechat => DomainConfig::livechat(),
            Domain::Kesalahan => DomainConfig::kesalahan(),
        }
    }
}

/// Everything read from the configuration store for one run.
///
/// Never mutated: a reload produces a new value.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub livechat_sites: SiteLeaderMap,
    pub kesalahan_sites: SiteLeaderMap,
    /// Sheet name to A1 range.
    pub special_sheets: Vec<(String, String)>,
    pub global: BTreeMap<String, Setting>,
    pub hidden_sheets: Vec<String>,
}

impl RuntimeConfig {
    pub fn site_leader_map(&self, domain: Domain) -> &SiteLeaderMap {
        match domain {
            Domain::Livechat => &self.livechat_sites,
            Domain::Kesalahan => &self.kesalahan_sites,
        }
    }

    pub fn global_setting(&self, key: &str) -> Option<&Setting> {
        self.global.get(key)
    }

    /// A non-blank single-valued setting.
    pub fn global_text(&self, key: &str) -> Option<&str> {
        match self.global_setting(key) {
            Some(Setting::Text(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    pub fn special_range(&self, sheet_name: &str) -> Option<&str> {
        self.special_sheets
            .iter()
            .find(|(n, _)| n == sheet_name)
            .map(|(_, r)| r.as_str())
    }

    /// The stock domain configuration with the global range overrides applied.
    pub fn domain_config(&self, domain: Domain) -> DomainConfig {
        let mut dc = DomainConfig::for_domain(domain);
        if let Some(r) = self.global_text("RANGE_KESALAHAN_DEFAULT") {
            dc.log_range = r.to_string();
        }
        if let Some(r) = self.global_text("RANGE_STAFF_DEFAULT") {
            dc.staff_range = r.to_string();
        }
        if domain == Domain::Kesalahan {
            if let Some(r) = self.global_text("RANGE_KESALAHAN_STAFF") {
                dc.matrix_range = r.to_string();
            }
        }
        dc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_labels_order_by_calendar() {
        let a = MonthLabel::parse("12-2024").unwrap();
        let b = MonthLabel::parse("01-2025").unwrap();
        assert!(a < b);
        assert_eq!(a.next(), b);
        assert_eq!(b.to_string(), "01-2025");
    }

    #[test]
    fn error_types_from_labels() {
        assert_eq!(ErrorType::from_label(" salah  respon"), Some(ErrorType::SalahRespon));
        assert_eq!(ErrorType::from_label("NOTE KRONIS"), Some(ErrorType::ChronicNote));
        assert_eq!(ErrorType::from_label("BONUS"), None);
        assert_eq!(ErrorType::UnresolvedCheck.counted_as(), ErrorType::Note);
    }

    #[test]
    fn month_selector_accepts_all_and_blank() {
        assert_eq!(MonthSelector::parse("ALL").unwrap(), MonthSelector::All);
        assert_eq!(MonthSelector::parse(" ").unwrap(), MonthSelector::All);
        assert!(MonthSelector::parse("13-2025").is_err());
        assert!(MonthSelector::parse("9-25").is_err());
    }

    #[test]
    fn site_map_keeps_order_and_dedups_leaders() {
        let m = SiteLeaderMap::from_pairs(&[
            ("PatihToto", "Gunadi"),
            ("partaitogel", "GUNADI"),
            ("depobos", "Hendy R"),
        ]);
        assert_eq!(m.leader_of("patihtoto"), Some("Gunadi"));
        assert_eq!(m.sites().collect::<Vec<_>>(), vec!["PATIHTOTO", "PARTAITOGEL", "DEPOBOS"]);
        assert_eq!(m.leaders(), vec!["Gunadi".to_string(), "Hendy R".to_string()]);
    }

    #[test]
    fn global_ranges_override_domain_defaults() {
        let mut rc = RuntimeConfig::default();
        rc.global.insert(
            "RANGE_STAFF_DEFAULT".to_string(),
            Setting::Text("H1:H".to_string()),
        );
        rc.global
            .insert("RANGE_KESALAHAN_DEFAULT".to_string(), Setting::Text("  ".to_string()));
        let dc = rc.domain_config(Domain::Livechat);
        assert_eq!(dc.staff_range, "H1:H");
        assert_eq!(dc.log_range, "A1:C");
    }
}
