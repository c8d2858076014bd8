/*!

This is the long-form manual for `rekap_engine` and `rekap`.

## Input sheets

Every site has one sheet with two ranges.

### Error log

The error log range (by default `A1:C`, `A1:D` for kesalahan) starts with a header row,
then one row per error:

```text
Nama Staff | Link Kesalahan | Poin Kesalahan  | Jumlah
           | 01/10/2025     |                 |
ALICE      | https://...    | SALAH RESPON    |
BOB        | https://...    | DP              | 3
```

- rows with a date alone in the second column open a new month (`DD/MM/YYYY` or `DD/MM/YY`).
  Only the first delimiter of a month counts.
- the third column is matched against the error taxonomy, by prefix. Rows that match
  nothing are kept for display but not counted.
- the optional fourth column is the amount. It defaults to 1 and must be a plain decimal
  number (`3`, `0.5`): anything else makes the row malformed.

### Staff block

The staff range (by default `H1:AH`) has a header row, then `name, total, ...` rows. A
final `TOTAL` row is taken as the total of the site. Without it, the second column is
summed.

Names separated by `/` are one shared identity: `JOHN / JANE` collects the errors logged
under `JOHN`, `JANE` or `JOHN / JANE`.

### Daily matrix sheets

Kesalahan monthly sheets (`OKT25`, `NOV25`, ...) are read with the staff range
(`A2:BN` by default):

```text
         |      |        |         | 01/10 |    | 02/10 |    |
PASSPORT | NAMA | STATUS | SITUS   | DP    | WD | DP    | WD |
P1       | ANA  | AKTIF  | DEPOBOS | 4     |    |       | 2  |
```

Dates are carried forward over blank header cells.

## Error types

| Phrase                       | Type        | Points per unit |
|------------------------------|-------------|-----------------|
| `DP`                         | deposit     | 0.25            |
| `WD`                         | withdrawal  | 1.0             |
| `SALAH RESPON`, `TIDAK RESPON`, `LAMBAT RESPON`, `SALAH INFO`, `SALAH PROSES`, `TYPO`, `FATAL` | | 0 |
| `NOTE`                       | note        | 0               |
| `PENGECEKAN TIDAK BERUJUNG`  | note        | 0               |

Every 10 "pengecekan tidak berujung" notes of a staff member make one `NOTE KRONIS`. The
notes themselves are then removed from the note count and from the total.

## Months

`--month all` summarises everything. `--month MM-YYYY` keeps the rows between the
delimiter of that month and the delimiter of the next one. While a month has no delimiter
yet, rows written after the last delimiter are also offered as the current month.

With `all`, the total of a site is the total of its staff block. With a month, it is
recomputed from the error rows of that month.

## Configuration

`rekap` reads a JSON configuration file:

```json
{
  "outputSettings": { "outputDirectory": "out", "reportFileName": "rekap.json" },
  "sources": { "input": "kesalahan.xlsx", "inputType": "xlsx", "matrixSheets": ["SEP25", "OKT25"] },
  "sites": [
    { "siteNameLivechat": "DEPOBOS", "siteNameKesalahan": "DEPOBOS", "leaderName": "HENDY R", "isActive": true }
  ],
  "specialSheets": [ { "sheetName": "FATAL", "range": "A1:M" } ],
  "globalSettings": { "RANGE_STAFF_DEFAULT": "H1:AH" },
  "hiddenSheets": [ "LEADER", "TOTAL LC" ],
  "pipelines": {
    "kesalahan": { "chronicThreshold": 10, "weights": { "DP": 0.25, "WD": 1.0 } }
  }
}
```

- inactive sites are left out of both leader maps.
- `RANGE_KESALAHAN_DEFAULT`, `RANGE_STAFF_DEFAULT` and `RANGE_KESALAHAN_STAFF` override
  the ranges of the pipelines.
- `pipelines` overrides the stock pipeline of a domain: `logRange`, `staffRange`,
  `matrixRange`, `logWidth`, `showZeroSites`, `chronicThreshold`, `weights` and the
  `taxonomy`, an ordered list of `{"phrase": ..., "type": ...}`. A phrase may not start
  with an earlier phrase.
- `input` is relative to the configuration file. A directory is read as CSV exports,
  one `<sheet name>.csv` file per sheet.
- leaders are also rostered as staff in the sheets; they are left out of the staff
  leaderboard.

> Note: zero-total sites show up in a leader's summary line for kesalahan, not for livechat.
 */
