/*!
Month boundaries inside an error log.

Error logs are one long list of rows. A new month starts with a delimiter
row that only carries a date in its second cell:

```text
| Nama Staff | Link Kesalahan | Poin Kesalahan |
|            | 01/09/2025     |                |   <- 09-2025 starts here
| ALICE      | https://...    | SALAH RESPON   |
|            | 01/10/2025     |                |   <- 10-2025 starts here
| BOB        | https://...    | DP             |
```

Rows written after the last delimiter during the following calendar month
are offered as that month even before its delimiter exists.
*/

use chrono::{Datelike, Local, NaiveDate};
use log::{debug, info};
use std::collections::BTreeMap;

use crate::config::{MonthBucket, MonthLabel, MonthSelector, RawRow};
use crate::rows::cell;

/// The month of the local clock.
pub fn current_month() -> MonthLabel {
    let today = Local::now().date_naive();
    MonthLabel {
        year: today.year(),
        month: today.month(),
    }
}

/// Parses `DD/MM/YYYY` or `DD/MM/YY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let year_len = s.rsplit('/').next().map(|y| y.len())?;
    let fmt = match year_len {
        4 => "%d/%m/%Y",
        2 => "%d/%m/%y",
        _ => return None,
    };
    NaiveDate::parse_from_str(s, fmt).ok()
}

/// The month a delimiter row opens, if the row is one.
pub fn delimiter_month(row: &[String]) -> Option<MonthLabel> {
    if !cell(row, 0).is_empty() || !cell(row, 2).is_empty() {
        return None;
    }
    parse_date(cell(row, 1)).map(|d| MonthLabel {
        year: d.year(),
        month: d.month(),
    })
}

/// A row that records an actual error: a name, a type and no date.
pub fn is_error_row(row: &[String]) -> bool {
    !cell(row, 0).is_empty() && !cell(row, 2).is_empty() && parse_date(cell(row, 1)).is_none()
}

/// Row index of the delimiter of every month. The first delimiter of a month wins.
pub fn index(rows: &[RawRow]) -> BTreeMap<MonthLabel, usize> {
    let mut res: BTreeMap<MonthLabel, usize> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        if let Some(m) = delimiter_month(row) {
            if res.contains_key(&m) {
                debug!("index: ignoring repeated delimiter for {} at row {}", m, idx);
            } else {
                res.insert(m, idx);
            }
        }
    }
    res
}

// The delimiter that appears last in the log.
fn latest_delimiter(idx: &BTreeMap<MonthLabel, usize>) -> Option<(MonthLabel, usize)> {
    idx.iter()
        .max_by_key(|(_, pos)| **pos)
        .map(|(m, pos)| (*m, *pos))
}

// The month following the latest delimiter, when it is the current month
// and error rows have been written since.
fn synthesized_month(
    rows: &[RawRow],
    idx: &BTreeMap<MonthLabel, usize>,
    today: MonthLabel,
) -> Option<(MonthLabel, usize)> {
    let (latest, pos) = latest_delimiter(idx)?;
    let next = latest.next();
    if next != today || idx.contains_key(&next) {
        return None;
    }
    if rows[pos + 1..].iter().any(|r| is_error_row(r)) {
        Some((next, pos + 1))
    } else {
        None
    }
}

/// Every month that can be selected, most recent first.
pub fn available_months(rows: &[RawRow], today: MonthLabel) -> Vec<MonthLabel> {
    let idx = index(rows);
    let mut res: Vec<MonthLabel> = idx.keys().cloned().collect();
    if let Some((m, _)) = synthesized_month(rows, &idx, today) {
        info!("available_months: offering {} before its delimiter", m);
        res.push(m);
    }
    res.sort();
    res.reverse();
    res
}

/// The row range of every selectable month, most recent first.
pub fn buckets(rows: &[RawRow], today: MonthLabel) -> Vec<MonthBucket> {
    available_months(rows, today)
        .into_iter()
        .filter_map(|m| {
            bucket_range(rows, m, today).map(|(start, end)| MonthBucket {
                label: m,
                start,
                end,
            })
        })
        .collect()
}

// Where each selectable month starts and where it stops the month before it:
// the delimiter row for delimited months, the first row for a synthesized one.
fn boundaries(rows: &[RawRow], today: MonthLabel) -> BTreeMap<MonthLabel, (usize, usize)> {
    let idx = index(rows);
    let mut res: BTreeMap<MonthLabel, (usize, usize)> =
        idx.iter().map(|(m, pos)| (*m, (pos + 1, *pos))).collect();
    if let Some((m, start)) = synthesized_month(rows, &idx, today) {
        res.insert(m, (start, start));
    }
    res
}

// A month ends where the next more recent month begins.
fn bucket_range(rows: &[RawRow], month: MonthLabel, today: MonthLabel) -> Option<(usize, usize)> {
    let bounds = boundaries(rows, today);
    let (start, _) = *bounds.get(&month)?;
    let end = bounds
        .range(month.next()..)
        .next()
        .map(|(_, (_, stop))| *stop)
        .unwrap_or(rows.len());
    Some((start, end))
}

/// The rows of one month, or every row for `All`.
///
/// Unknown months and empty or inverted ranges give no rows.
pub fn slice(rows: &[RawRow], selector: MonthSelector, today: MonthLabel) -> Vec<RawRow> {
    let month = match selector {
        MonthSelector::All => return rows.to_vec(),
        MonthSelector::Month(m) => m,
    };
    match bucket_range(rows, month, today) {
        Some((start, end)) if start < end => rows[start..end].to_vec(),
        Some((start, end)) => {
            debug!("slice: empty range {}..{} for {}", start, end, month);
            Vec::new()
        }
        None => {
            debug!("slice: no rows for {}", month);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn m(s: &str) -> MonthLabel {
        MonthLabel::parse(s).unwrap()
    }

    fn err(name: &str) -> RawRow {
        row(&[name, "https://link", "SALAH RESPON"])
    }

    fn delim(date: &str) -> RawRow {
        row(&["", date, ""])
    }

    fn sample_log() -> Vec<RawRow> {
        let mut rows = Vec::new();
        for i in 0..5 {
            rows.push(err(&format!("A{}", i)));
        }
        rows.push(delim("01/09/2025"));
        for i in 6..20 {
            rows.push(err(&format!("B{}", i)));
        }
        rows.push(delim("01/10/25"));
        for i in 21..25 {
            rows.push(err(&format!("C{}", i)));
        }
        rows
    }

    #[test]
    fn delimiters_need_a_lone_date() {
        assert_eq!(delimiter_month(&delim("15/09/2025")), Some(m("09-2025")));
        assert_eq!(delimiter_month(&delim("15/09/25")), Some(m("09-2025")));
        assert_eq!(delimiter_month(&row(&["X", "15/09/2025", ""])), None);
        assert_eq!(delimiter_month(&row(&["", "15/09/2025", "DP"])), None);
        assert_eq!(delimiter_month(&delim("2025-09-15")), None);
        assert_eq!(delimiter_month(&delim("31/02/2025")), None);
    }

    #[test]
    fn first_delimiter_of_a_month_wins() {
        let rows = vec![delim("01/09/2025"), err("A"), delim("20/09/2025"), err("B")];
        let idx = index(&rows);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.get(&m("09-2025")), Some(&0));
    }

    #[test]
    fn slice_between_delimiters() {
        let rows = sample_log();
        let today = m("01-2026");
        let sep = slice(&rows, MonthSelector::Month(m("09-2025")), today);
        assert_eq!(sep, rows[6..20].to_vec());
        let oct = slice(&rows, MonthSelector::Month(m("10-2025")), today);
        assert_eq!(oct, rows[21..].to_vec());
        assert_eq!(slice(&rows, MonthSelector::All, today), rows);
        assert!(slice(&rows, MonthSelector::Month(m("08-2025")), today).is_empty());
    }

    #[test]
    fn months_are_listed_most_recent_first() {
        let rows = sample_log();
        assert_eq!(
            available_months(&rows, m("01-2026")),
            vec![m("10-2025"), m("09-2025")]
        );
        let b = buckets(&rows, m("01-2026"));
        assert_eq!(b[1], MonthBucket { label: m("09-2025"), start: 6, end: 20 });
    }

    #[test]
    fn current_month_is_offered_before_its_delimiter() {
        let rows = sample_log();
        let today = m("11-2025");
        assert_eq!(
            available_months(&rows, today),
            vec![m("11-2025"), m("10-2025"), m("09-2025")]
        );
        let nov = slice(&rows, MonthSelector::Month(m("11-2025")), today);
        assert_eq!(nov, rows[21..].to_vec());
        // The rows after the October delimiter now belong to November.
        assert!(slice(&rows, MonthSelector::Month(m("10-2025")), today).is_empty());
        let b = buckets(&rows, today);
        assert_eq!(b[1], MonthBucket { label: m("10-2025"), start: 21, end: 21 });
        assert_eq!(b[2], MonthBucket { label: m("09-2025"), start: 6, end: 20 });
    }

    fn assert_disjoint(b: &[MonthBucket]) {
        let mut ranges: Vec<(usize, usize, MonthLabel)> = b
            .iter()
            .filter(|x| x.start < x.end)
            .map(|x| (x.start, x.end, x.label))
            .collect();
        ranges.sort();
        for w in ranges.windows(2) {
            assert!(w[0].1 <= w[1].0, "{} {:?} overlaps {} {:?}", w[0].2, w[0], w[1].2, w[1]);
        }
    }

    #[test]
    fn buckets_never_share_rows() {
        let logs = vec![
            sample_log(),
            vec![delim("01/10/2025"), err("A"), delim("01/09/2025"), err("B")],
            vec![err("A"), delim("01/10/2025"), err("B"), delim("20/10/2025"), err("C")],
            vec![delim("01/08/2025"), err("A"), delim("01/10/2025"), err("B"), err("C")],
        ];
        let todays = ["08-2025", "09-2025", "10-2025", "11-2025", "12-2025", "01-2026"];
        for rows in logs.iter() {
            for t in todays.iter() {
                let b = buckets(rows, m(t));
                assert_disjoint(&b);
                for x in b.iter() {
                    assert!(x.end <= rows.len());
                }
            }
        }
    }

    #[test]
    fn no_synthesized_month_without_error_rows() {
        let rows = vec![err("A"), delim("01/10/2025"), row(&["", "", ""]), delim("02/10/2025")];
        assert_eq!(available_months(&rows, m("11-2025")), vec![m("10-2025")]);
    }

    #[test]
    fn inverted_ranges_are_empty() {
        // The October delimiter comes before the September one.
        let rows = vec![delim("01/10/2025"), err("A"), delim("01/09/2025"), err("B")];
        let today = m("01-2026");
        assert!(slice(&rows, MonthSelector::Month(m("09-2025")), today).is_empty());
        assert_eq!(slice(&rows, MonthSelector::Month(m("10-2025")), today).len(), 3);
    }
}
