//! CF-style conversion of numeric time axes to calendar dates
//!
//! Archive metadata describes the time axis as numbers plus a unit string
//! such as `days since 2000-01-01` and a calendar name. The standard
//! calendars go through `chrono`; the fixed-length model calendars
//! (`noleap`, `360_day`, `all_leap`) are computed arithmetically since no
//! real-world date type can represent e.g. February 30th.

use crate::errors::{InspectorError, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

/// A calendar date that may come from a non-real-world calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hour == 0 && self.minute == 0 && self.second == 0 {
            write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
        } else {
            write!(
                f,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                self.year, self.month, self.day, self.hour, self.minute, self.second
            )
        }
    }
}

impl From<NaiveDateTime> for CalendarDate {
    fn from(dt: NaiveDateTime) -> Self {
        CalendarDate {
            year: dt.year() as i64,
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }
}

/// Supported CF calendar models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    /// `standard`, `gregorian`, `proleptic_gregorian`
    Standard,
    /// `noleap`, `365_day`
    NoLeap,
    /// `all_leap`, `366_day`
    AllLeap,
    /// `360_day`
    Day360,
}

impl Calendar {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(Calendar::Standard),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            other => Err(InspectorError::CalendarError(format!(
                "unsupported calendar '{}'",
                other
            ))),
        }
    }
}

/// Parsed `<interval> since <reference>` unit string.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    pub seconds_per_step: f64,
    pub origin: NaiveDateTime,
}

impl TimeUnits {
    pub fn parse(units: &str) -> Result<Self> {
        let (interval, reference) = units
            .split_once(" since ")
            .ok_or_else(|| {
                InspectorError::CalendarError(format!("unparsable time units '{}'", units))
            })?;
        let seconds_per_step = match interval.trim().to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
            "minutes" | "minute" | "mins" | "min" => 60.0,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3600.0,
            "days" | "day" | "d" => 86400.0,
            other => {
                return Err(InspectorError::CalendarError(format!(
                    "unsupported time interval '{}'",
                    other
                )))
            }
        };
        let origin = parse_reference(reference.trim())?;
        Ok(TimeUnits {
            seconds_per_step,
            origin,
        })
    }
}

fn parse_reference(reference: &str) -> Result<NaiveDateTime> {
    const FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(reference, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(reference, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(InspectorError::CalendarError(format!(
        "unparsable reference date '{}'",
        reference
    )))
}

/// Convert numeric time values to calendar dates.
pub fn num_to_date(values: &[f64], units: &str, calendar: &str) -> Result<Vec<CalendarDate>> {
    let units = TimeUnits::parse(units)?;
    let calendar = Calendar::parse(calendar)?;
    values
        .iter()
        .map(|&v| {
            let offset_secs = (v * units.seconds_per_step).round() as i64;
            match calendar {
                Calendar::Standard => standard_date(units.origin, offset_secs),
                Calendar::NoLeap => Ok(fixed_calendar_date(units.origin, offset_secs, &NOLEAP)),
                Calendar::AllLeap => Ok(fixed_calendar_date(units.origin, offset_secs, &ALL_LEAP)),
                Calendar::Day360 => Ok(fixed_calendar_date(units.origin, offset_secs, &DAY_360)),
            }
        })
        .collect()
}

fn standard_date(origin: NaiveDateTime, offset_secs: i64) -> Result<CalendarDate> {
    origin
        .checked_add_signed(Duration::seconds(offset_secs))
        .map(CalendarDate::from)
        .ok_or_else(|| {
            InspectorError::CalendarError(format!(
                "time offset {}s out of representable range",
                offset_secs
            ))
        })
}

/// Month lengths of the fixed-length calendars.
struct FixedCalendar {
    month_lengths: [i64; 12],
}

const NOLEAP: FixedCalendar = FixedCalendar {
    month_lengths: [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
};

const ALL_LEAP: FixedCalendar = FixedCalendar {
    month_lengths: [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
};

const DAY_360: FixedCalendar = FixedCalendar {
    month_lengths: [30; 12],
};

impl FixedCalendar {
    fn days_per_year(&self) -> i64 {
        self.month_lengths.iter().sum()
    }

    /// Days from the start of year 0 to the given date.
    fn days_from_epoch(&self, year: i64, month: u32, day: u32) -> i64 {
        let before_month: i64 = self.month_lengths[..month as usize - 1].iter().sum();
        year * self.days_per_year() + before_month + (day as i64 - 1)
    }

    fn date_from_days(&self, days: i64) -> (i64, u32, u32) {
        let per_year = self.days_per_year();
        let year = days.div_euclid(per_year);
        let mut remaining = days.rem_euclid(per_year);
        for (idx, &len) in self.month_lengths.iter().enumerate() {
            if remaining < len {
                return (year, idx as u32 + 1, remaining as u32 + 1);
            }
            remaining -= len;
        }
        unreachable!("day-of-year exceeds calendar length")
    }
}

fn fixed_calendar_date(
    origin: NaiveDateTime,
    offset_secs: i64,
    calendar: &FixedCalendar,
) -> CalendarDate {
    let origin_secs = calendar.days_from_epoch(
        origin.year() as i64,
        origin.month(),
        origin.day(),
    ) * 86400
        + origin.num_seconds_from_midnight() as i64;
    let total = origin_secs + offset_secs;
    let (year, month, day) = calendar.date_from_days(total.div_euclid(86400));
    let day_secs = total.rem_euclid(86400);
    CalendarDate {
        year,
        month,
        day,
        hour: (day_secs / 3600) as u32,
        minute: (day_secs % 3600 / 60) as u32,
        second: (day_secs % 60) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_since_standard() {
        let dates = num_to_date(
            &[0.0, 1.0, 2.0],
            "days since 2000-01-01",
            "standard",
        )
        .unwrap();
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[0].to_string(), "2000-01-01");
        assert_eq!(dates[1].to_string(), "2000-01-02");
        assert_eq!(dates[2].to_string(), "2000-01-03");
    }

    #[test]
    fn test_hours_since_with_time_of_day() {
        let dates = num_to_date(
            &[6.0],
            "hours since 1900-01-01 00:00:00",
            "gregorian",
        )
        .unwrap();
        assert_eq!(dates[0].to_string(), "1900-01-01 06:00:00");
    }

    #[test]
    fn test_noleap_skips_february_29() {
        // 2000 is a leap year in the real world, not in noleap
        let dates = num_to_date(&[59.0], "days since 2000-01-01", "noleap").unwrap();
        assert_eq!(dates[0].to_string(), "2000-03-01");
    }

    #[test]
    fn test_360_day_month_rollover() {
        let dates = num_to_date(&[30.0], "days since 2001-01-01", "360_day").unwrap();
        assert_eq!(dates[0].to_string(), "2001-02-01");
    }

    #[test]
    fn test_unknown_calendar_is_an_error() {
        let result = num_to_date(&[0.0], "days since 2000-01-01", "martian");
        assert!(matches!(result, Err(InspectorError::CalendarError(_))));
    }

    #[test]
    fn test_unparsable_units_is_an_error() {
        let result = num_to_date(&[0.0], "fortnights after 2000-01-01", "standard");
        assert!(matches!(result, Err(InspectorError::CalendarError(_))));
    }
}
