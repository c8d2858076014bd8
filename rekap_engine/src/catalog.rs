// Which sheets of a workbook are shown and which are summarised.

/// Sheet names split between site sheets and special sheets.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SheetCatalog {
    /// Visible sheets that are not special, in workbook order.
    pub site_sheets: Vec<String>,
    /// The navigation list: site sheets, then every special sheet.
    pub navigation: Vec<String>,
}

fn without_spaces(s: &str) -> String {
    s.chars().filter(|c| *c != ' ').collect()
}

impl SheetCatalog {
    /// Hidden names match either trimmed or with every space removed.
    pub fn new(all_names: &[String], hidden: &[String], special: &[String]) -> SheetCatalog {
        let hidden_trimmed: Vec<&str> = hidden
            .iter()
            .chain(special.iter())
            .map(|h| h.trim())
            .collect();
        let hidden_compact: Vec<String> = hidden.iter().map(|h| without_spaces(h)).collect();
        let site_sheets: Vec<String> = all_names
            .iter()
            .filter(|n| !n.trim().is_empty())
            .filter(|n| {
                !hidden_trimmed.contains(&n.trim()) && !hidden_compact.contains(&without_spaces(n))
            })
            .cloned()
            .collect();
        let mut navigation = site_sheets.clone();
        for s in special {
            if !navigation.contains(s) {
                navigation.push(s.clone());
            }
        }
        SheetCatalog {
            site_sheets,
            navigation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hidden_and_special_sheets() {
        let all = names(&["DEPOBOS", " LEADER ", "POIN-POINKESALAHAN", "TOTAL LC", "FATAL", "", "PATIHTOTO"]);
        let cat = SheetCatalog::new(
            &all,
            &names(&["POIN-POIN KESALAHAN", "LEADER", "TOTAL LC"]),
            &names(&["FATAL", "KODE"]),
        );
        assert_eq!(cat.site_sheets, names(&["DEPOBOS", "PATIHTOTO"]));
        assert_eq!(cat.navigation, names(&["DEPOBOS", "PATIHTOTO", "FATAL", "KODE"]));
    }
}
