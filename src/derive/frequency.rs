use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::derive::MetricTable;
use crate::error::ParseError;
use crate::input::TripLogRow;
use crate::route::{Direction, RouteKey};

pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub fn parse_time(raw: &str) -> Result<NaiveTime, ParseError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).map_err(|_| ParseError::Time(raw.to_string()))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| ParseError::Date(raw.to_string()))
}

/// Whole minutes between the start and stop of a trip: floor(seconds / 60).
///
/// Dates are part of the timestamps, so a trip that crosses midnight is
/// measured correctly.
pub fn trip_minutes(row: &TripLogRow) -> Result<i64, ParseError> {
    let start = NaiveDateTime::new(parse_date(&row.datai)?, parse_time(&row.hsstart)?);
    let stop = NaiveDateTime::new(parse_date(&row.dataf)?, parse_time(&row.hsstop)?);

    let seconds = (stop - start).num_seconds();
    if seconds < 0 {
        return Err(ParseError::NegativeDuration {
            start: start.to_string(),
            stop: stop.to_string(),
        });
    }
    Ok(seconds.div_euclid(60))
}

/// Route key of a trip-log row (`linha` + `sentido` code).
pub fn trip_key(row: &TripLogRow) -> Result<RouteKey, ParseError> {
    Ok(RouteKey::new(&row.linha, Direction::parse_code(&row.sentido)?))
}

/// Mean trip duration in minutes per route and direction.
pub fn derive_frequency(rows: &[TripLogRow]) -> MetricTable {
    let mut table = MetricTable::new(TripLogRow::SOURCE);

    for (idx, row) in rows.iter().enumerate() {
        let key = match trip_key(row) {
            Ok(key) => key,
            Err(e) => {
                table.reject(idx, None, e);
                continue;
            }
        };
        match trip_minutes(row) {
            Ok(minutes) => table.push(key, minutes as f64),
            Err(e) => table.reject(idx, Some(key), e),
        }
    }

    table
}
