use log::debug;

use crate::config::RawRow;
use crate::rows::{cell, parse_count};

/// The total of a staff block and its data rows.
///
/// Row 0 of the block is the header. A final `TOTAL` row carrying a number
/// is trusted as is and left out of the data rows. Without one, column 1 of
/// every data row is summed and every row is kept.
pub fn extract_total(block: &[RawRow]) -> (u64, Vec<RawRow>) {
    if block.len() < 2 {
        return (0, Vec::new());
    }
    let data = &block[1..];
    if let Some((last, rest)) = data.split_last() {
        if let Some(total) = trusted_total(last) {
            debug!("extract_total: trusting TOTAL row {}", total);
            return (total, rest.to_vec());
        }
    }
    let total = data
        .iter()
        .filter(|r| r.len() > 1)
        .map(|r| parse_count(cell(r, 1)))
        .sum();
    debug!("extract_total: no TOTAL row, summed {} rows to {}", data.len(), total);
    (total, data.to_vec())
}

fn trusted_total(row: &[String]) -> Option<u64> {
    if !cell(row, 0).eq_ignore_ascii_case("total") {
        return None;
    }
    let cleaned = cell(row, 1).replace(',', "");
    // The first run of digits anywhere in the cell, so `Rp 4,643` is 4643.
    let digits: String = cleaned
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(cells: &[&[&str]]) -> Vec<RawRow> {
        cells
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn total_row_is_trusted() {
        let block = rows(&[
            &["NAMA", "TOTAL"],
            &["ALICE", "3"],
            &["BOB", "9"],
            &["TOTAL", "4,643", "x"],
        ]);
        let (total, data) = extract_total(&block);
        assert_eq!(total, 4643);
        assert_eq!(data, rows(&[&["ALICE", "3"], &["BOB", "9"]]));
    }

    #[test]
    fn total_row_may_carry_a_prefix() {
        for value in ["= 4,643", "Rp 4,643", "4,643 staff"] {
            let block = rows(&[
                &["NAMA", "TOTAL"],
                &["ALICE", "3"],
                &["BOB", "9"],
                &["TOTAL", value],
            ]);
            let (total, data) = extract_total(&block);
            assert_eq!(total, 4643, "{}", value);
            assert_eq!(data.len(), 2);
        }
    }

    #[test]
    fn manual_sum_keeps_all_rows() {
        let block = rows(&[&["NAMA", "TOTAL"], &["A", "100"], &["B", "2,000"], &["C", "3"]]);
        let (total, data) = extract_total(&block);
        assert_eq!(total, 2103);
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn total_row_without_number_is_summed() {
        let block = rows(&[&["NAMA", "TOTAL"], &["A", "5"], &["total", "-"]]);
        let (total, data) = extract_total(&block);
        assert_eq!(total, 5);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn short_blocks_are_empty() {
        assert_eq!(extract_total(&[]), (0, vec![]));
        assert_eq!(extract_total(&rows(&[&["NAMA", "TOTAL"]])), (0, vec![]));
        let (total, _) = extract_total(&rows(&[&["H"], &["A"], &["B", "x"]]));
        assert_eq!(total, 0);
    }
}
