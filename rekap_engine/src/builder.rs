pub use crate::config::*;

use crate::months::current_month;

/// A builder for collecting sheets before running a summary.
///
/// Using the builder should be considered when sheets arrive one at a time.
///
/// ```
/// pub use rekap_engine::builder::Builder;
/// pub use rekap_engine::{DomainConfig, MonthSelector};
/// # use rekap_engine::RekapErrors;
///
/// let mut builder = Builder::new(&DomainConfig::livechat())?
///     .leaders(&[("DEPOBOS".to_string(), "HENDY R".to_string())])?;
///
/// builder.add_sheet_simple(
///     "DEPOBOS",
///     &[vec!["Nama Staff".to_string()], vec!["ALICE".to_string(), "".to_string(), "TYPO".to_string()]],
///     &[vec!["NAMA".to_string()], vec!["ALICE".to_string(), "1".to_string()]],
/// )?;
///
/// let report = builder.run(MonthSelector::All);
/// assert_eq!(report.site_grand_total, 1);
///
/// # Ok::<(), RekapErrors>(())
/// ```
pub struct Builder {
    pub(crate) _domain: DomainConfig,
    pub(crate) _map: SiteLeaderMap,
    pub(crate) _sheets: Vec<SiteSheet>,
    pub(crate) _matrix_sheets: Vec<MatrixSheet>,
}

impl Builder {
    pub fn new(domain: &DomainConfig) -> Result<Builder, RekapErrors> {
        Ok(Builder {
            _domain: domain.clone(),
            _map: SiteLeaderMap::new(),
            _sheets: Vec::new(),
            _matrix_sheets: Vec::new(),
        })
    }

    pub fn leaders(self, pairs: &[(String, String)]) -> Result<Builder, RekapErrors> {
        let mut map = SiteLeaderMap::new();
        for (site, leader) in pairs {
            map.insert(site, leader);
        }
        Ok(Builder {
            _map: map,
            ..self
        })
    }

    pub fn leader_map(self, map: &SiteLeaderMap) -> Result<Builder, RekapErrors> {
        Ok(Builder {
            _map: map.clone(),
            ..self
        })
    }

    /// Adds a site sheet from its two ranges.
    pub fn add_sheet_simple(
        &mut self,
        site: &str,
        log_rows: &[RawRow],
        staff_rows: &[RawRow],
    ) -> Result<(), RekapErrors> {
        self.add_sheet(&SiteSheet {
            site: site.to_string(),
            log_rows: log_rows.to_vec(),
            staff_rows: staff_rows.to_vec(),
        })
    }

    /// Adds a site sheet. A sheet for the same site replaces the previous one.
    pub fn add_sheet(&mut self, sheet: &SiteSheet) -> Result<(), RekapErrors> {
        let key = sheet.site.trim().to_uppercase();
        self._sheets
            .retain(|s| s.site.trim().to_uppercase() != key);
        self._sheets.push(sheet.clone());
        Ok(())
    }

    pub fn add_matrix_sheet(&mut self, sheet: &MatrixSheet) -> Result<(), RekapErrors> {
        self._matrix_sheets.push(sheet.clone());
        Ok(())
    }

    pub fn available_months(&self) -> Vec<MonthLabel> {
        crate::available_months(&self._sheets, current_month())
    }

    /// Runs the summary against the current month of the local clock.
    pub fn run(&self, selector: MonthSelector) -> RekapReport {
        self.run_at(selector, current_month())
    }

    pub fn run_at(&self, selector: MonthSelector, today: MonthLabel) -> RekapReport {
        crate::run_rekap(&self._sheets, &self._domain, &self._map, selector, today)
    }

    pub fn run_matrix(&self) -> MatrixReport {
        crate::run_matrix_rekap(&self._matrix_sheets, &self._domain, &self._map)
    }
}
