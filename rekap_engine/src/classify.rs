// Error type classification and point weights.

use log::debug;
use std::collections::BTreeMap;

use crate::config::{ErrorType, RekapErrors};

/// Unresolved checks that make one chronic note.
pub const CHRONIC_THRESHOLD: u64 = 10;

/// Upper-cases and collapses every run of whitespace to a single space.
pub fn normalize_phrase(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_uppercase()
}

/// An ordered list of phrases, matched as prefixes. The first match wins.
///
/// The list is validated when built: a phrase may not start with an earlier
/// phrase, since it could then never be selected.
#[derive(PartialEq, Debug, Clone)]
pub struct Taxonomy {
    phrases: Vec<(String, ErrorType)>,
}

impl Taxonomy {
    pub fn new(phrases: Vec<(String, ErrorType)>) -> Result<Taxonomy, RekapErrors> {
        let mut res: Vec<(String, ErrorType)> = Vec::with_capacity(phrases.len());
        for (p, t) in phrases {
            let norm = normalize_phrase(&p);
            if norm.is_empty() {
                return Err(RekapErrors::EmptyPhrase);
            }
            if let Some((earlier, _)) = res.iter().find(|(e, _)| norm.starts_with(e.as_str())) {
                return Err(RekapErrors::ShadowedPhrase {
                    earlier: earlier.clone(),
                    later: norm,
                });
            }
            res.push((norm, t));
        }
        Ok(Taxonomy { phrases: res })
    }

    /// The taxonomy used by both report domains.
    pub fn standard() -> Taxonomy {
        Taxonomy {
            phrases: STANDARD_PHRASES
                .iter()
                .map(|(p, t)| (p.to_string(), *t))
                .collect(),
        }
    }

    pub fn phrases(&self) -> &[(String, ErrorType)] {
        &self.phrases
    }

    pub fn classify(&self, text: &str) -> Option<ErrorType> {
        let norm = normalize_phrase(text);
        if norm.is_empty() {
            return None;
        }
        let res = self
            .phrases
            .iter()
            .find(|(p, _)| norm.starts_with(p.as_str()))
            .map(|(_, t)| *t);
        if res.is_none() {
            debug!("classify: no phrase matches {:?}", norm);
        }
        res
    }
}

// NOTE goes last: it is a prefix of the other note phrases.
const STANDARD_PHRASES: [(&str, ErrorType); 13] = [
    ("NOTE PENGECEKAN TIDAK BERUJUNG", ErrorType::UnresolvedCheck),
    ("PENGECEKAN TIDAK BERUJUNG", ErrorType::UnresolvedCheck),
    ("NOTE KRONIS", ErrorType::ChronicNote),
    ("DP", ErrorType::Dp),
    ("WD", ErrorType::Wd),
    ("SALAH RESPON", ErrorType::SalahRespon),
    ("TIDAK RESPON", ErrorType::TidakRespon),
    ("LAMBAT RESPON", ErrorType::LambatRespon),
    ("SALAH INFO", ErrorType::SalahInfo),
    ("SALAH PROSES", ErrorType::SalahProses),
    ("TYPO", ErrorType::Typo),
    ("FATAL", ErrorType::Fatal),
    ("NOTE", ErrorType::Note),
];

/// Points per unit of amount, by error type. Absent types weigh nothing.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct WeightTable {
    weights: BTreeMap<ErrorType, f64>,
}

impl WeightTable {
    pub fn new() -> WeightTable {
        WeightTable::default()
    }

    pub fn standard() -> WeightTable {
        WeightTable::new()
            .with(ErrorType::Dp, 0.25)
            .with(ErrorType::Wd, 1.0)
    }

    pub fn with(mut self, error_type: ErrorType, weight: f64) -> WeightTable {
        self.weights.insert(error_type, weight);
        self
    }

    pub fn weight(&self, error_type: ErrorType) -> f64 {
        self.weights.get(&error_type).cloned().unwrap_or(0.0)
    }

    pub fn point_value(&self, error_type: ErrorType, amount: f64) -> f64 {
        amount * self.weight(error_type)
    }
}
