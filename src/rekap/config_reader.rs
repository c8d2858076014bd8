use std::collections::BTreeMap;

use rekap_engine::classify::{Taxonomy, WeightTable};

use crate::rekap::cache::{Cache, CONFIG_TTL};
use crate::rekap::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "reportFileName")]
    pub report_file_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct Sources {
    /// A workbook or a directory of CSV exports, relative to the configuration file.
    pub input: Option<String>,
    #[serde(rename = "inputType")]
    pub input_type: Option<String>,
    /// Daily matrix sheets of the kesalahan workbook, oldest first.
    #[serde(rename = "matrixSheets", default)]
    pub matrix_sheets: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SiteEntry {
    #[serde(rename = "siteNameLivechat")]
    pub site_name_livechat: Option<String>,
    #[serde(rename = "siteNameKesalahan")]
    pub site_name_kesalahan: Option<String>,
    #[serde(rename = "leaderName")]
    pub leader_name: Option<String>,
    // A boolean, or the TRUE / FALSE text of a checkbox column.
    #[serde(rename = "isActive")]
    _is_active: Option<JSValue>,
}

impl SiteEntry {
    /// Sites are active unless explicitly disabled.
    pub fn is_active(&self) -> bool {
        match &self._is_active {
            None | Some(JSValue::Null) => true,
            Some(JSValue::Bool(b)) => *b,
            Some(JSValue::String(s)) => !s.trim().eq_ignore_ascii_case("false"),
            Some(JSValue::Number(n)) => n.as_f64().map(|x| x != 0.0).unwrap_or(true),
            Some(_) => true,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SpecialSheetEntry {
    #[serde(rename = "sheetName")]
    pub sheet_name: String,
    pub range: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub phrase: String,
    #[serde(rename = "type")]
    pub error_type: String,
}

/// Overrides of the stock pipeline of one domain.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineSettings {
    #[serde(rename = "logRange")]
    pub log_range: Option<String>,
    #[serde(rename = "staffRange")]
    pub staff_range: Option<String>,
    #[serde(rename = "matrixRange")]
    pub matrix_range: Option<String>,
    #[serde(rename = "logWidth")]
    pub log_width: Option<usize>,
    #[serde(rename = "showZeroSites")]
    pub show_zero_sites: Option<bool>,
    #[serde(rename = "chronicThreshold")]
    pub chronic_threshold: Option<u64>,
    pub taxonomy: Option<Vec<TaxonomyEntry>>,
    /// Error type label to points per unit. Types not listed keep the stock weight.
    pub weights: Option<BTreeMap<String, f64>>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RekapConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub sources: Sources,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
    #[serde(rename = "specialSheets", default)]
    pub special_sheets: Vec<SpecialSheetEntry>,
    #[serde(rename = "globalSettings", default)]
    pub global_settings: BTreeMap<String, JSValue>,
    #[serde(rename = "hiddenSheets", default)]
    pub hidden_sheets: Vec<String>,
    #[serde(default)]
    pub pipelines: BTreeMap<String, PipelineSettings>,
}

pub fn parse_domain(s: Option<&str>) -> RekapResult<Domain> {
    match s.map(|x| x.trim().to_lowercase()) {
        None => Ok(Domain::Livechat),
        Some(x) if x.is_empty() || x == "livechat" || x == "lc" => Ok(Domain::Livechat),
        Some(x) if x == "kesalahan" => Ok(Domain::Kesalahan),
        Some(x) => whatever!("unknown domain {:?}, expected livechat or kesalahan", x),
    }
}

/// A global setting value. Lists may also be written as a string holding a
/// JSON list; `SCOPES` is a comma separated list.
pub fn parse_setting(key: &str, value: &JSValue) -> Setting {
    match value {
        JSValue::Array(a) => Setting::List(
            a.iter()
                .map(|v| match v {
                    JSValue::String(s) => s.trim().to_string(),
                    x => x.to_string(),
                })
                .collect(),
        ),
        JSValue::String(s) if key == "SCOPES" => Setting::List(
            s.split(',')
                .map(|x| x.trim().to_string())
                .filter(|x| !x.is_empty())
                .collect(),
        ),
        JSValue::String(s) if s.trim().starts_with('[') => {
            match serde_json::from_str::<JSValue>(s.trim()) {
                Ok(js @ JSValue::Array(_)) => parse_setting(key, &js),
                _ => Setting::Text(s.clone()),
            }
        }
        JSValue::String(s) => Setting::Text(s.clone()),
        JSValue::Null => Setting::Text(String::new()),
        x => Setting::Text(x.to_string()),
    }
}

fn error_type_of(label: &str) -> RekapResult<ErrorType> {
    match ErrorType::from_label(label) {
        Some(t) => Ok(t),
        None => whatever!("unknown error type {:?} in the pipeline settings", label),
    }
}

impl RekapConfig {
    pub fn runtime_config(&self) -> RuntimeConfig {
        let mut rc = RuntimeConfig::default();
        for site in self.sites.iter() {
            if !site.is_active() {
                debug!("runtime_config: skipping inactive site {:?}", site);
                continue;
            }
            let leader = site.leader_name.as_deref().unwrap_or("");
            if let Some(s) = &site.site_name_livechat {
                rc.livechat_sites.insert(s, leader);
            }
            if let Some(s) = &site.site_name_kesalahan {
                rc.kesalahan_sites.insert(s, leader);
            }
        }
        rc.special_sheets = self
            .special_sheets
            .iter()
            .filter(|s| !s.sheet_name.trim().is_empty())
            .map(|s| (s.sheet_name.clone(), s.range.clone()))
            .collect();
        rc.global = self
            .global_settings
            .iter()
            .map(|(k, v)| (k.clone(), parse_setting(k, v)))
            .collect();
        rc.hidden_sheets = self.hidden_sheets.clone();
        rc
    }

    /// The pipeline of a domain: stock values, then the global range
    /// settings, then the `pipelines` section of this file.
    pub fn domain_config(&self, rc: &RuntimeConfig, domain: Domain) -> RekapResult<DomainConfig> {
        let mut dc = rc.domain_config(domain);
        let ps = match self.pipelines.get(domain.name()) {
            Some(ps) => ps,
            None => return Ok(dc),
        };
        if let Some(r) = &ps.log_range {
            dc.log_range = r.clone();
        }
        if let Some(r) = &ps.staff_range {
            dc.staff_range = r.clone();
        }
        if let Some(r) = &ps.matrix_range {
            dc.matrix_range = r.clone();
        }
        if let Some(w) = ps.log_width {
            dc.log_width = w;
        }
        if let Some(b) = ps.show_zero_sites {
            dc.show_zero_sites = b;
        }
        if let Some(t) = ps.chronic_threshold {
            dc.chronic_threshold = t;
        }
        if let Some(entries) = &ps.taxonomy {
            let mut phrases: Vec<(String, ErrorType)> = Vec::new();
            for e in entries {
                phrases.push((e.phrase.clone(), error_type_of(&e.error_type)?));
            }
            dc.taxonomy = Taxonomy::new(phrases).context(InvalidTaxonomySnafu {})?;
        }
        if let Some(weights) = &ps.weights {
            let mut table: WeightTable = dc.weights.clone();
            for (label, w) in weights {
                table = table.with(error_type_of(label)?, *w);
            }
            dc.weights = table;
        }
        info!(
            "domain_config: {} pipeline overridden by the configuration file",
            domain.name()
        );
        Ok(dc)
    }
}

pub fn read_config(path: &str) -> RekapResult<RekapConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: RekapConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

/// Where the run configuration comes from.
pub trait ConfigStore {
    fn load(&self) -> BRekapResult<RekapConfig>;

    /// Drops any cached copy before loading.
    fn reload(&self) -> BRekapResult<RekapConfig>;
}

/// A JSON configuration file, read through a cache.
pub struct FileConfigStore<'a, C: Cache> {
    path: String,
    cache: &'a C,
}

impl<'a, C: Cache> FileConfigStore<'a, C> {
    pub fn new(path: &str, cache: &'a C) -> FileConfigStore<'a, C> {
        FileConfigStore {
            path: path.to_string(),
            cache,
        }
    }

    fn key(&self) -> String {
        format!("config:{}", self.path)
    }
}

impl<'a, C: Cache> ConfigStore for FileConfigStore<'a, C> {
    fn load(&self) -> BRekapResult<RekapConfig> {
        self.cache
            .get_or_compute(&self.key(), CONFIG_TTL, || Ok(read_config(&self.path)?))
    }

    fn reload(&self) -> BRekapResult<RekapConfig> {
        self.cache.invalidate(&self.key());
        self.load()
    }
}
