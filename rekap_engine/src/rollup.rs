// Staff -> site -> leader rollups and their rankings.

use log::{debug, info};
use std::cmp::Ordering;

use crate::config::*;
use crate::names::title_case;
use crate::rows::{format_count, round2};

/// Shown for a staff member without any error.
pub const NO_ERRORS: &str = "NO ERRORS (0)";

/// Site name used for staff whose site is blank.
pub const UNKNOWN_SITE: &str = "N/A";

fn desc_f64(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// `Site (1,234)`
fn labelled(name: &str, total: u64) -> String {
    format!("{} ({})", name, format_count(total))
}

fn breakdown(staff: &[&StaffTotal]) -> Vec<StaffShare> {
    let mut res: Vec<StaffShare> = staff
        .iter()
        .map(|s| StaffShare {
            name: s.identity.display.clone(),
            total: s.total_count,
        })
        .collect();
    res.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    res
}

/// The total of one site sheet.
///
/// `total` comes from the sheet itself (see `extract_total`), the staff only
/// provide the points and the breakdown.
pub fn site_total(site: &str, total: u64, staff: &[StaffTotal]) -> SiteTotal {
    let refs: Vec<&StaffTotal> = staff.iter().collect();
    SiteTotal {
        site_key: site.trim().to_uppercase(),
        name: site.trim().to_string(),
        total,
        point_total: round2(staff.iter().map(|s| s.point_subtotal).sum()),
        staff_count: staff.len(),
        staff_breakdown: breakdown(&refs),
    }
}

/// Sites by decreasing total, then by name.
pub fn by_site(mut sites: Vec<SiteTotal>) -> Vec<SiteTotal> {
    sites.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    sites
}

fn site_of(staff: &StaffTotal) -> String {
    let s = staff.site.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("total") {
        UNKNOWN_SITE.to_string()
    } else {
        s.to_string()
    }
}

/// Groups staff totals by the site recorded on each staff member.
///
/// Staff members are counted once per passport, or once per identity when
/// the passport is unknown.
pub fn by_staff_site(staff: &[StaffTotal]) -> Vec<SiteTotal> {
    let mut groups: Vec<(String, Vec<&StaffTotal>)> = Vec::new();
    for s in staff {
        let site = site_of(s);
        match groups.iter_mut().find(|(g, _)| *g == site) {
            Some((_, members)) => members.push(s),
            None => groups.push((site, vec![s])),
        }
    }
    let sites = groups
        .into_iter()
        .map(|(site, members)| {
            let mut people: Vec<&str> = members
                .iter()
                .map(|m| {
                    if m.passport.is_empty() {
                        m.identity.key.as_str()
                    } else {
                        m.passport.as_str()
                    }
                })
                .collect();
            people.sort_unstable();
            people.dedup();
            SiteTotal {
                site_key: site.to_uppercase(),
                total: members.iter().map(|m| m.total_count).sum(),
                point_total: round2(members.iter().map(|m| m.point_subtotal).sum()),
                staff_count: people.len(),
                staff_breakdown: breakdown(&members),
                name: site,
            }
        })
        .collect();
    by_site(sites)
}

/// Rolls site totals up to the leaders of `map`.
///
/// Every leader and every site of the map is present, with zeros when there
/// is no data. Sites outside the map are ignored.
pub fn by_leader(sites: &[SiteTotal], map: &SiteLeaderMap, show_zero_sites: bool) -> Vec<LeaderTotal> {
    let mut leaders: Vec<LeaderTotal> = map
        .leaders()
        .iter()
        .map(|l| LeaderTotal {
            leader_name: title_case(l),
            total: 0,
            point_total: 0.0,
            site_breakdown: Vec::new(),
            details: String::new(),
        })
        .collect();
    let leader_pos = |leaders: &[LeaderTotal], name: &str| -> Option<usize> {
        leaders
            .iter()
            .position(|l| l.leader_name.eq_ignore_ascii_case(name))
    };
    // Seeded sites keep the map order, which breaks ties below.
    let mut site_keys: Vec<Vec<String>> = vec![Vec::new(); leaders.len()];
    for (site_key, leader) in map.entries() {
        if let Some(p) = leader_pos(&leaders, &title_case(leader)) {
            leaders[p].site_breakdown.push(LeaderSite {
                site: title_case(site_key),
                total: 0,
                point_total: 0.0,
            });
            site_keys[p].push(site_key.clone());
        }
    }
    for st in sites {
        let leader = match map.leader_of(&st.site_key) {
            Some(l) => title_case(l),
            None => {
                debug!("by_leader: site {:?} has no leader", st.site_key);
                continue;
            }
        };
        if let Some(p) = leader_pos(&leaders, &leader) {
            if let Some(sp) = site_keys[p].iter().position(|k| *k == st.site_key) {
                let ls = &mut leaders[p].site_breakdown[sp];
                ls.total += st.total;
                ls.point_total = round2(ls.point_total + st.point_total);
            }
            leaders[p].total += st.total;
            leaders[p].point_total = round2(leaders[p].point_total + st.point_total);
        }
    }
    for l in leaders.iter_mut() {
        l.site_breakdown.sort_by(|a, b| {
            desc_f64(a.point_total, b.point_total).then_with(|| b.total.cmp(&a.total))
        });
        l.details = l
            .site_breakdown
            .iter()
            .filter(|s| show_zero_sites || s.total > 0)
            .map(|s| labelled(&s.site, s.total))
            .collect::<Vec<String>>()
            .join(" / ");
    }
    leaders.sort_by(|a, b| {
        desc_f64(a.point_total, b.point_total)
            .then_with(|| b.total.cmp(&a.total))
            .then_with(|| a.leader_name.cmp(&b.leader_name))
    });
    info!("by_leader: {} leaders over {} sites", leaders.len(), sites.len());
    leaders
}

/// The staff leaderboard, leaders left out.
pub fn by_staff_non_leader(staff: &[StaffTotal], leader_names: &[String]) -> Vec<StaffRank> {
    let mut kept: Vec<&StaffTotal> = staff
        .iter()
        .filter(|s| {
            !leader_names
                .iter()
                .any(|l| l.trim().eq_ignore_ascii_case(s.identity.display.trim()))
        })
        .collect();
    kept.sort_by(|a, b| {
        b.total_count
            .cmp(&a.total_count)
            .then_with(|| a.identity.display.cmp(&b.identity.display))
    });
    kept.iter()
        .enumerate()
        .map(|(idx, s)| {
            let shares: Vec<String> = s
                .sites
                .iter()
                .filter(|sh| sh.total > 0)
                .map(|sh| labelled(&sh.site, sh.total))
                .collect();
            let details = if s.total_count == 0 && shares.is_empty() {
                NO_ERRORS.to_string()
            } else {
                shares.join(" / ")
            };
            StaffRank {
                rank: idx + 1,
                name: s.identity.display.clone(),
                total: s.total_count,
                point_total: s.point_subtotal,
                details,
            }
        })
        .collect()
}

pub fn site_grand_total(sites: &[SiteTotal]) -> u64 {
    sites.iter().map(|s| s.total).sum()
}

pub fn staff_grand_total(staff: &[StaffRank]) -> u64 {
    staff.iter().map(|s| s.total).sum()
}

pub fn leader_grand_total(leaders: &[LeaderTotal]) -> u64 {
    leaders.iter().map(|l| l.total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn staff(name: &str, site: &str, total: u64, points: f64) -> StaffTotal {
        StaffTotal {
            identity: StaffIdentity {
                key: name.to_uppercase(),
                display: name.to_string(),
            },
            passport: String::new(),
            status: String::new(),
            site: site.to_string(),
            total_count: total,
            per_type_counts: BTreeMap::new(),
            chronic_count: 0,
            point_subtotal: points,
            sites: if total > 0 {
                vec![SiteShare {
                    site: site.to_string(),
                    total,
                }]
            } else {
                vec![]
            },
            details: vec![],
        }
    }

    #[test]
    fn sites_sort_by_total_then_name() {
        let sites = by_site(vec![
            site_total("Beta", 5, &[]),
            site_total("Alpha", 5, &[]),
            site_total("Gamma", 9, &[]),
        ]);
        let names: Vec<&str> = sites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn site_total_trusts_the_sheet_total() {
        let s = site_total("depobos", 4643, &[staff("Alice", "depobos", 3, 1.25), staff("Bob", "depobos", 7, 0.5)]);
        assert_eq!(s.total, 4643);
        assert_eq!(s.site_key, "DEPOBOS");
        assert_eq!(s.point_total, 1.75);
        assert_eq!(s.staff_breakdown[0].name, "Bob");
    }

    #[test]
    fn leaders_and_sites_are_seeded() {
        let map = SiteLeaderMap::from_pairs(&[("X", "Y"), ("DEPOBOS", "HENDY R")]);
        let leaders = by_leader(&[site_total("DEPOBOS", 12, &[])], &map, false);
        assert_eq!(leaders.len(), 2);
        assert_eq!(leaders[0].leader_name, "Hendy R");
        assert_eq!(leaders[0].total, 12);
        assert_eq!(leaders[0].details, "Depobos (12)");
        let y = &leaders[1];
        assert_eq!(y.leader_name, "Y");
        assert_eq!(y.total, 0);
        assert_eq!(
            y.site_breakdown,
            vec![LeaderSite {
                site: "X".to_string(),
                total: 0,
                point_total: 0.0
            }]
        );
        assert_eq!(y.details, "");
    }

    #[test]
    fn zero_sites_follow_the_display_policy() {
        let map = SiteLeaderMap::from_pairs(&[("A", "L"), ("B", "L"), ("C", "L")]);
        let sites = [site_total("B", 3, &[]), site_total("C", 1200, &[])];
        let hidden = by_leader(&sites, &map, false);
        assert_eq!(hidden[0].details, "C (1,200) / B (3)");
        let shown = by_leader(&sites, &map, true);
        assert_eq!(shown[0].details, "C (1,200) / B (3) / A (0)");
        assert_eq!(leader_grand_total(&shown), 1203);
    }

    #[test]
    fn leader_sites_rank_by_points() {
        let map = SiteLeaderMap::from_pairs(&[("A", "L"), ("B", "L")]);
        let a = SiteTotal {
            point_total: 0.5,
            ..site_total("A", 10, &[])
        };
        let b = SiteTotal {
            point_total: 2.0,
            ..site_total("B", 1, &[])
        };
        let leaders = by_leader(&[a, b], &map, true);
        assert_eq!(leaders[0].site_breakdown[0].site, "B");
        assert_eq!(leaders[0].point_total, 2.5);
    }

    #[test]
    fn leader_site_ties_fall_back_to_totals_then_map_order() {
        let map = SiteLeaderMap::from_pairs(&[("A", "L"), ("B", "L"), ("C", "L")]);
        let sites = vec![
            site_total("A", 1, &[]),
            site_total("B", 5, &[]),
            site_total("C", 1, &[]),
        ];
        let leaders = by_leader(&sites, &map, true);
        let order: Vec<&str> = leaders[0]
            .site_breakdown
            .iter()
            .map(|s| s.site.as_str())
            .collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn leaders_are_not_ranked_as_staff() {
        let all = vec![
            staff("Gunadi", "PATIHTOTO", 50, 0.0),
            staff("Bob", "PATIHTOTO", 4, 0.0),
            staff("Alice", "DEPOBOS", 4, 0.0),
            staff("Cici", "DEPOBOS", 0, 0.0),
        ];
        let ranks = by_staff_non_leader(&all, &["GUNADI".to_string()]);
        let names: Vec<&str> = ranks.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Cici"]);
        assert_eq!(ranks[0].rank, 1);
        assert_eq!(ranks[0].details, "DEPOBOS (4)");
        assert_eq!(ranks[2].details, NO_ERRORS);
        assert_eq!(staff_grand_total(&ranks), 8);
    }

    #[test]
    fn staff_sites_group_blank_as_unknown() {
        let mut a = staff("Alice", "DEPOBOS", 4, 1.0);
        a.passport = "P1".to_string();
        let mut a2 = staff("Alicia", "DEPOBOS", 2, 0.5);
        a2.passport = "P1".to_string();
        let sites = by_staff_site(&[a, a2, staff("Bob", "", 1, 0.0), staff("Tot", "total", 1, 0.0)]);
        assert_eq!(sites[0].name, "DEPOBOS");
        assert_eq!(sites[0].total, 6);
        assert_eq!(sites[0].staff_count, 1);
        assert_eq!(sites[0].point_total, 1.5);
        assert_eq!(sites[1].name, UNKNOWN_SITE);
        assert_eq!(sites[1].total, 2);
        assert_eq!(sites[1].staff_count, 2);
        assert_eq!(site_grand_total(&sites), 8);
    }
}
