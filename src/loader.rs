use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use csv::StringRecord;
use thiserror::Error;

use crate::data::Candle;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("input file contains no valid rows")]
    Empty,

    #[error("unable to infer timestamp from record: {0:?}")]
    Timestamp(StringRecord),

    #[error("failed to parse numeric field '{field}' from value '{value}'")]
    ParseNumber { field: &'static str, value: String },

    #[error("timestamps must be strictly increasing (row {row})")]
    Unordered { row: usize },

    #[error("candle {row} has inconsistent prices (high {high}, low {low})")]
    InvalidRange { row: usize, high: f64, low: f64 },
}

pub fn load_candles_from_csv<P: AsRef<Path>>(path: P, tz: Tz) -> Result<Vec<Candle>> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref).with_context(|| format!("failed to open {:?}", path_ref))?;
    let candles = read_candles(file, tz)?;
    log::info!("loaded {} candles from {:?}", candles.len(), path_ref);
    Ok(candles)
}

/// Parse `datetime,o,h,l,c,v` or `date,time,o,h,l,c,v` rows; a header row is skipped.
pub fn read_candles<R: Read>(input: R, tz: Tz) -> Result<Vec<Candle>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let mut candles = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if let Some(candle) = parse_record(&record, tz)? {
            candles.push(candle);
        }
    }

    if candles.is_empty() {
        return Err(LoaderError::Empty.into());
    }

    candles.sort_by_key(|candle| candle.timestamp);
    Ok(candles)
}

fn parse_record(record: &StringRecord, tz: Tz) -> Result<Option<Candle>> {
    // Header rows start with a column name rather than a date.
    if let Some(first) = record.get(0) {
        let first = first.trim();
        if ["date", "datetime", "timestamp", "time"]
            .iter()
            .any(|name| first.eq_ignore_ascii_case(name))
        {
            return Ok(None);
        }
    }

    let fields: Vec<&str> = record
        .iter()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    if fields.len() < 6 {
        return Ok(None);
    }

    let (datetime, offset) = if fields.len() >= 7 && parse_time(fields[1]).is_ok() {
        (parse_datetime_pair(fields[0], fields[1])?, 2)
    } else {
        parse_datetime_string(fields[0])
            .map(|dt| (dt, 1))
            .ok_or_else(|| anyhow!(LoaderError::Timestamp(record.clone())))?
    };

    let timestamp = match tz.from_local_datetime(&datetime) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => tz.from_utc_datetime(&datetime),
    };

    let open = parse_number(fields.get(offset).copied(), "open")?;
    let high = parse_number(fields.get(offset + 1).copied(), "high")?;
    let low = parse_number(fields.get(offset + 2).copied(), "low")?;
    let close = parse_number(fields.get(offset + 3).copied(), "close")?;
    let volume = parse_number(fields.get(offset + 4).copied(), "volume")?;

    Ok(Some(Candle {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
    }))
}

fn parse_number(value: Option<&str>, field: &'static str) -> Result<f64> {
    let value = value.ok_or_else(|| LoaderError::ParseNumber {
        field,
        value: String::from("<missing>"),
    })?;
    value
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| LoaderError::ParseNumber {
            field,
            value: value.to_string(),
        })
        .map_err(anyhow::Error::from)
}

fn parse_datetime_pair(date_str: &str, time_str: &str) -> Result<NaiveDateTime> {
    let date = parse_date(date_str)?;
    let time = parse_time(time_str)?;
    Ok(NaiveDateTime::new(date, time))
}

fn parse_datetime_string(value: &str) -> Option<NaiveDateTime> {
    let patterns = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%SZ",
    ];
    for pattern in &patterns {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(datetime);
        }
    }
    // Daily candles frequently carry a bare date.
    parse_date(value)
        .ok()
        .filter(|_| !value.contains(':'))
        .map(|date| date.and_time(NaiveTime::MIN))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    let patterns = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    for pattern in &patterns {
        if let Ok(date) = NaiveDate::parse_from_str(value, pattern) {
            return Ok(date);
        }
    }
    Err(LoaderError::Timestamp(StringRecord::from(vec![value.to_string()])).into())
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    let patterns = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
    for pattern in &patterns {
        if let Ok(time) = NaiveTime::parse_from_str(value, pattern) {
            return Ok(time);
        }
    }
    Err(LoaderError::Timestamp(StringRecord::from(vec![value.to_string()])).into())
}

/// Reject series the analysis cannot trust: duplicate timestamps or impossible ranges.
pub fn validate_series(candles: &[Candle]) -> Result<()> {
    if candles.is_empty() {
        return Err(LoaderError::Empty.into());
    }

    for (row, pair) in candles.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(LoaderError::Unordered { row: row + 1 }.into());
        }
    }

    for (row, candle) in candles.iter().enumerate() {
        let finite = [candle.open, candle.high, candle.low, candle.close]
            .iter()
            .all(|v| v.is_finite());
        if !finite || candle.high < candle.low {
            return Err(LoaderError::InvalidRange {
                row,
                high: candle.high,
                low: candle.low,
            }
            .into());
        }
    }

    Ok(())
}
