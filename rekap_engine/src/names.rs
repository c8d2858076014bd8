// Matching of free-text staff names.

use log::{debug, warn};
use std::collections::HashMap;

use crate::config::{Diagnostics, StaffIdentity};

/// Upper-cases and keeps only ASCII `A-Z`, `0-9` and `/`.
///
/// Two names with the same key are the same identity.
pub fn canonical_key(raw_name: &str) -> String {
    raw_name
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '/')
        .collect()
}

/// The individual names of a slash-joined shared-shift entry.
///
/// `"JOHN / JANE"` gives `["JOHN", "JANE"]`, a plain name gives itself.
pub fn explode_aliases(raw_name: &str) -> Vec<String> {
    raw_name
        .split('/')
        .map(canonical_key)
        .filter(|k| !k.is_empty())
        .collect()
}

/// Rows that name nobody: an empty key or a totals line.
pub fn is_excluded_name(raw_name: &str) -> bool {
    canonical_key(raw_name).is_empty() || raw_name.trim().eq_ignore_ascii_case("total")
}

/// First letter of every word upper-cased, the rest lower-cased.
pub fn title_case(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                res.extend(c.to_lowercase());
            } else {
                res.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            res.push(c);
            prev_alpha = false;
        }
    }
    res
}

pub fn identity_of(raw_name: &str) -> Option<StaffIdentity> {
    if is_excluded_name(raw_name) {
        return None;
    }
    let display = raw_name.split_whitespace().collect::<Vec<&str>>().join(" ");
    Some(StaffIdentity {
        key: canonical_key(raw_name),
        display: title_case(&display),
    })
}

/// Lookup from any spelling or alias to the identity it belongs to.
///
/// Whole roster names always resolve to themselves. An alias shared by two
/// slash-joined entries goes to the entry inserted last.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    identities: Vec<StaffIdentity>,
    by_key: HashMap<String, usize>,
    aliases: HashMap<String, usize>,
    collisions: Vec<(String, String, String)>,
}

impl IdentityIndex {
    pub fn new() -> IdentityIndex {
        IdentityIndex::default()
    }

    pub fn from_names<'a, I>(names: I) -> IdentityIndex
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut idx = IdentityIndex::new();
        for n in names {
            idx.insert(n);
        }
        idx
    }

    /// Registers a roster name and its aliases. Returns the identity, or
    /// `None` for rows that name nobody.
    pub fn insert(&mut self, raw_name: &str) -> Option<StaffIdentity> {
        let identity = identity_of(raw_name)?;
        let pos = match self.by_key.get(&identity.key) {
            Some(p) => *p,
            None => {
                self.identities.push(identity.clone());
                let p = self.identities.len() - 1;
                self.by_key.insert(identity.key.clone(), p);
                p
            }
        };
        let parts = explode_aliases(raw_name);
        if parts.len() > 1 {
            for alias in parts {
                if self.by_key.contains_key(&alias) {
                    debug!(
                        "IdentityIndex: alias {:?} of {:?} is also a roster name, keeping the roster name",
                        alias, identity.key
                    );
                    continue;
                }
                if let Some(prev) = self.aliases.insert(alias.clone(), pos) {
                    if prev != pos {
                        let prev_key = self.identities[prev].key.clone();
                        warn!(
                            "IdentityIndex: alias {:?} claimed by both {:?} and {:?}, using {:?}",
                            alias, prev_key, identity.key, identity.key
                        );
                        self.collisions
                            .push((alias.clone(), prev_key, identity.key.clone()));
                    }
                }
            }
        }
        Some(self.identities[pos].clone())
    }

    /// The identity a raw name refers to, trying the whole name first and
    /// then each of its slash-separated parts.
    pub fn resolve(&self, raw_name: &str) -> Option<&StaffIdentity> {
        if is_excluded_name(raw_name) {
            return None;
        }
        let key = canonical_key(raw_name);
        if let Some(p) = self.by_key.get(&key).or_else(|| self.aliases.get(&key)) {
            return self.identities.get(*p);
        }
        explode_aliases(raw_name)
            .iter()
            .find_map(|part| self.by_key.get(part).or_else(|| self.aliases.get(part)))
            .and_then(|p| self.identities.get(*p))
    }

    /// All identities, in insertion order.
    pub fn identities(&self) -> &[StaffIdentity] {
        &self.identities
    }

    pub fn record_collisions(&self, diagnostics: &mut Diagnostics) {
        diagnostics
            .alias_collisions
            .extend(self.collisions.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_uppercase_ascii() {
        assert_eq!(canonical_key("  José  Ramos "), "JOSRAMOS");
        assert_eq!(canonical_key("john / jane"), "JOHN/JANE");
        assert_eq!(canonical_key("a.b-c 12"), "ABC12");
        let n = "Rio  Pratama";
        assert_eq!(canonical_key(n), canonical_key(n));
    }

    #[test]
    fn totals_and_empty_names_are_excluded() {
        assert!(is_excluded_name(" Total "));
        assert!(is_excluded_name("--"));
        assert!(!is_excluded_name("Totalia"));
        assert!(identity_of("TOTAL").is_none());
    }

    #[test]
    fn title_case_follows_words() {
        assert_eq!(title_case("HENDY R"), "Hendy R");
        assert_eq!(title_case("line togel"), "Line Togel");
        assert_eq!(title_case("UDOY88"), "Udoy88");
        assert_eq!(title_case("JOHN / JANE"), "John / Jane");
    }

    #[test]
    fn aliases_resolve_to_the_combined_identity() {
        let idx = IdentityIndex::from_names(vec!["JOHN / JANE", "ALICE"]);
        let combined = idx.resolve("JOHN / JANE").unwrap().clone();
        assert_eq!(combined.key, "JOHN/JANE");
        assert_eq!(idx.resolve("jane").unwrap(), &combined);
        assert_eq!(idx.resolve(" John ").unwrap(), &combined);
        assert_eq!(idx.resolve("Alice").unwrap().key, "ALICE");
        assert!(idx.resolve("BOB").is_none());
        assert!(idx.resolve("total").is_none());
    }

    #[test]
    fn shared_alias_goes_to_last_entry_and_is_reported() {
        let idx = IdentityIndex::from_names(vec!["JOHN/JANE", "JOHN/SUE"]);
        assert_eq!(idx.resolve("JOHN").unwrap().key, "JOHN/SUE");
        assert_eq!(idx.resolve("JANE").unwrap().key, "JOHN/JANE");
        let mut d = Diagnostics::default();
        idx.record_collisions(&mut d);
        assert_eq!(
            d.alias_collisions,
            vec![(
                "JOHN".to_string(),
                "JOHN/JANE".to_string(),
                "JOHN/SUE".to_string()
            )]
        );
    }

    #[test]
    fn roster_names_win_over_aliases() {
        let idx = IdentityIndex::from_names(vec!["JOHN", "JOHN/JANE"]);
        assert_eq!(idx.resolve("john").unwrap().key, "JOHN");
        assert_eq!(idx.resolve("jane").unwrap().key, "JOHN/JANE");
    }

    #[test]
    fn unknown_combination_falls_back_to_a_known_part() {
        let idx = IdentityIndex::from_names(vec!["JANE"]);
        assert_eq!(idx.resolve("SUE / JANE").unwrap().key, "JANE");
    }
}
