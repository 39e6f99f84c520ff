use crate::data_types::TimeUnit;
use chrono::{DateTime, Datelike, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartDateFormat {
    Year,      // 2105
    MonthYear, // Jan 2105
    DayMonth,  // 12 Jan
}

/// Picks a label granularity from the visible time range (in seconds).
pub fn determine_date_format(visible_range_sec: f64) -> SmartDateFormat {
    const DAY: f64 = 24.0 * 3600.0;
    const MONTH: f64 = 30.0 * DAY;
    const YEAR: f64 = 365.0 * DAY;

    if visible_range_sec > YEAR * 2.0 {
        SmartDateFormat::Year
    } else if visible_range_sec > MONTH * 2.0 {
        SmartDateFormat::MonthYear
    } else {
        SmartDateFormat::DayMonth
    }
}

fn to_datetime(value: f64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    match unit {
        TimeUnit::Seconds => DateTime::from_timestamp(value as i64, 0),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value as i64),
    }
}

/// Formats a timestamp according to the specified format and unit.
pub fn format_timestamp(value: f64, format: SmartDateFormat, unit: TimeUnit) -> String {
    let Some(dt) = to_datetime(value, unit) else {
        return format!("{:.2}", value);
    };

    match format {
        SmartDateFormat::Year => dt.format("%Y").to_string(),
        SmartDateFormat::MonthYear => dt.format("%b %Y").to_string(),
        SmartDateFormat::DayMonth => dt.format("%d %b").to_string(),
    }
}

/// Calendar year of a timestamp, used for period labels.
pub fn year_of(value: f64, unit: TimeUnit) -> Option<i32> {
    to_datetime(value, unit).map(|dt| dt.year())
}
