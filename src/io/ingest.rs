//! CSV ingest and normalization.
//!
//! This module is responsible for turning a daily price export (Yahoo-style
//! `Date,Open,High,Low,Close,...` or a plain `date,close` file) into a clean,
//! ascending [`PriceSeries`].
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (duplicates keep the first row seen)
//! - **Separation of concerns**: no simulation logic here

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::{PricePoint, PriceSeries};
use crate::error::AppError;

/// Accepted names of the price column, in order of preference.
const CLOSE_COLUMNS: [&str; 4] = ["close", "adj close", "adj_close", "price"];

/// Summary stats about the points actually used.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub n_points: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub min_close: f64,
    pub max_close: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the series + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub series: PriceSeries,
    pub stats: SeriesStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a price CSV from disk.
pub fn load_price_series(path: &Path) -> Result<IngestedSeries, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let ingested = read_price_series(file)?;
    log::info!(
        "loaded {} prices from {} ({} .. {})",
        ingested.rows_used,
        path.display(),
        ingested.stats.first_date,
        ingested.stats.last_date
    );
    Ok(ingested)
}

/// Check that a CSV header names a `date` column and a close column.
///
/// Only the header line is read.
pub fn check_price_header<R: Read>(input: R) -> Result<(), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?;
    resolve_columns(&build_header_map(headers)).map(|_| ())
}

/// Parse price CSV content from any reader.
pub fn read_price_series<R: Read>(input: R) -> Result<IngestedSeries, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let columns = resolve_columns(&header_map)?;

    let mut points = Vec::new();
    let mut seen = HashSet::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header line, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, columns) {
            Ok(point) if !seen.insert(point.date) => row_errors.push(RowError {
                line,
                message: format!("Duplicate date {} (keeping the first row).", point.date),
            }),
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in &row_errors {
        log::debug!("line {}: {}", e.line, e.message);
    }
    if !row_errors.is_empty() {
        log::warn!("skipped {} of {} CSV rows", row_errors.len(), rows_read);
    }

    let rows_used = points.len();
    points.sort_by_key(|p| p.date);
    let series = PriceSeries::new(points);

    let stats = compute_stats(&series)
        .ok_or_else(|| AppError::new(3, "No valid price rows remain after validation."))?;

    Ok(IngestedSeries {
        series,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Summary stats of a series; `None` when it is empty.
pub fn compute_stats(series: &PriceSeries) -> Option<SeriesStats> {
    let first = series.first()?;
    let last = series.last()?;

    let mut min_close = f64::INFINITY;
    let mut max_close = f64::NEG_INFINITY;
    for p in series.points() {
        min_close = min_close.min(p.close);
        max_close = max_close.max(p.close);
    }

    Some(SeriesStats {
        n_points: series.len(),
        first_date: first.date,
        last_date: last.date,
        min_close,
        max_close,
    })
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    close: usize,
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<Columns, AppError> {
    let date = *header_map
        .get("date")
        .ok_or_else(|| AppError::new(2, "Missing required column: `date`"))?;
    let close = CLOSE_COLUMNS
        .iter()
        .find_map(|name| header_map.get(*name).copied())
        .ok_or_else(|| {
            AppError::new(
                2,
                "Missing required price column: one of `close`, `adj close`, `adj_close`, `price`.",
            )
        })?;
    Ok(Columns { date, close })
}

fn parse_row(record: &StringRecord, columns: Columns) -> Result<PricePoint, String> {
    let date = parse_date(get_required(record, columns.date, "date")?)?;
    let raw_close = get_required(record, columns.close, "close")?;
    let close = raw_close
        .parse::<f64>()
        .map_err(|_| format!("Invalid close '{raw_close}'."))?;
    if !(close.is_finite() && close > 0.0) {
        return Err(format!("Close must be finite and > 0 (got {raw_close})."));
    }
    Ok(PricePoint::new(date, close))
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // Plain dates first, then timestamps (the time and any offset are dropped).
    const DATE_FMTS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    Err(format!(
        "Invalid date '{s}'. Expected YYYY-MM-DD, DD/MM/YYYY, YYYY/MM/DD or a timestamp."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reads_yahoo_style_export() {
        let csv = "\u{feff}Date,Open,High,Low,Close,Adj Close,Volume\n\
                   2021-01-05,1,1,1,11.5,11.0,100\n\
                   2021-01-04,1,1,1,10.5,10.0,100\n";
        let ingested = read_price_series(csv.as_bytes()).unwrap();
        assert_eq!(ingested.rows_read, 2);
        assert_eq!(ingested.rows_used, 2);
        let points = ingested.series.points();
        assert_eq!(points[0].date, d(2021, 1, 4));
        assert_eq!(points[0].close, 10.5);
        assert_eq!(ingested.stats.first_date, d(2021, 1, 4));
        assert_eq!(ingested.stats.max_close, 11.5);
    }

    #[test]
    fn falls_back_to_adjusted_close() {
        let csv = "date,adj_close\n2021-01-04,10\n";
        let ingested = read_price_series(csv.as_bytes()).unwrap();
        assert_eq!(ingested.series.points()[0].close, 10.0);
    }

    #[test]
    fn header_check_reads_only_column_names() {
        assert!(check_price_header("\u{feff}Date,Price\n".as_bytes()).is_ok());
        assert!(check_price_header("date,open,high\n1,2,3\n".as_bytes()).is_err());
        assert!(check_price_header("".as_bytes()).is_err());
    }

    #[test]
    fn bad_rows_are_reported_and_skipped() {
        let csv = "date,close\n\
                   2021-01-04,10\n\
                   not-a-date,11\n\
                   2021-01-05,-3\n\
                   2021-01-06,abc\n\
                   2021-01-04,99\n\
                   2021-01-07,\n\
                   2021-01-08,12\n";
        let ingested = read_price_series(csv.as_bytes()).unwrap();
        assert_eq!(ingested.rows_read, 7);
        assert_eq!(ingested.rows_used, 2);
        let lines: Vec<usize> = ingested.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, [3, 4, 5, 6, 7]);
        assert!(ingested.row_errors[3].message.contains("Duplicate"));
        assert_eq!(ingested.series.first().unwrap().close, 10.0);
    }

    #[test]
    fn accepts_timestamp_dates() {
        assert_eq!(parse_date("2021-03-04").unwrap(), d(2021, 3, 4));
        assert_eq!(parse_date("04/03/2021").unwrap(), d(2021, 3, 4));
        assert_eq!(parse_date("2021/03/04").unwrap(), d(2021, 3, 4));
        assert_eq!(parse_date("2021-03-04 00:00:00").unwrap(), d(2021, 3, 4));
        assert_eq!(parse_date("2021-03-04T09:30:00").unwrap(), d(2021, 3, 4));
        assert_eq!(parse_date("2021-03-04T00:00:00-05:00").unwrap(), d(2021, 3, 4));
        assert!(parse_date("March 4").is_err());
    }

    #[test]
    fn missing_columns_are_schema_errors() {
        let err = read_price_series("day,close\n2021-01-04,1\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = read_price_series("date,open\n2021-01-04,1\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_usable_rows_is_insufficient_data() {
        let err = read_price_series("date,close\nx,y\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Date,Close").unwrap();
        writeln!(file, "2020-02-03,5.5").unwrap();
        file.flush().unwrap();

        let ingested = load_price_series(file.path()).unwrap();
        assert_eq!(ingested.series.len(), 1);
        assert!(load_price_series(Path::new("/nonexistent/prices.csv")).is_err());
    }
}
