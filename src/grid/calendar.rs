//! CF calendars, calendar-aware dates and time axes.
//!
//! Climate archives store time as offsets (`days since 1850-01-01`) on a
//! model calendar. Dates on calendars such as `360_day` cannot always be
//! represented as `chrono` values, so they are kept as plain field tuples
//! ([`CfDateTime`]) until the normalizer converts them.

use crate::grid::error::GridError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Calendar {
    Standard,
    ProlepticGregorian,
    NoLeap,
    AllLeap,
    Day360,
    Julian,
}

impl Calendar {
    pub fn name(&self) -> &'static str {
        match self {
            Calendar::Standard => "standard",
            Calendar::ProlepticGregorian => "proleptic_gregorian",
            Calendar::NoLeap => "noleap",
            Calendar::AllLeap => "all_leap",
            Calendar::Day360 => "360_day",
            Calendar::Julian => "julian",
        }
    }

    /// Calendars whose dates map one-to-one onto `chrono` dates.
    pub fn is_standard(&self) -> bool {
        matches!(self, Calendar::Standard | Calendar::ProlepticGregorian)
    }

    pub fn is_leap_year(&self, year: i32) -> bool {
        match self {
            Calendar::Standard | Calendar::ProlepticGregorian => {
                (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
            }
            Calendar::Julian => year.rem_euclid(4) == 0,
            Calendar::AllLeap => true,
            Calendar::NoLeap | Calendar::Day360 => false,
        }
    }

    pub fn days_in_month(&self, year: i32, month: u32) -> u32 {
        if *self == Calendar::Day360 {
            return 30;
        }
        match month {
            2 if self.is_leap_year(year) => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    pub fn days_in_year(&self, year: i32) -> u32 {
        match self {
            Calendar::Day360 => 360,
            _ if self.is_leap_year(year) => 366,
            _ => 365,
        }
    }

    /// 1-based day of year.
    pub fn day_of_year(&self, date: &CfDateTime) -> u32 {
        (1..date.month)
            .map(|m| self.days_in_month(date.year, m))
            .sum::<u32>()
            + date.day
    }

    /// Shifts `base` by a (possibly fractional, possibly negative) number of
    /// days, honouring this calendar's month and year lengths.
    pub fn add_days(&self, base: &CfDateTime, days: f64) -> CfDateTime {
        let offset = (days * SECONDS_PER_DAY as f64).round() as i64;
        let total = i64::from(base.seconds_of_day()) + offset;
        let day_shift = total.div_euclid(SECONDS_PER_DAY);
        let seconds = total.rem_euclid(SECONDS_PER_DAY) as u32;

        let (year, ordinal) = self.shift_ordinal(base.year, self.day_of_year(base), day_shift);
        let (month, day) = self.month_day(year, ordinal);
        CfDateTime {
            year,
            month,
            day,
            hour: seconds / 3600,
            minute: seconds % 3600 / 60,
            second: seconds % 60,
        }
    }

    fn shift_ordinal(&self, year: i32, ordinal: u32, shift: i64) -> (i32, u32) {
        let mut year = year;
        let mut index = i64::from(ordinal) - 1 + shift;
        match self {
            Calendar::Day360 | Calendar::NoLeap | Calendar::AllLeap => {
                let len = i64::from(self.days_in_year(year));
                year += index.div_euclid(len) as i32;
                index = index.rem_euclid(len);
            }
            Calendar::Julian => {
                // Any four consecutive Julian years hold exactly one leap day.
                let cycles = index.div_euclid(1461);
                year += (cycles * 4) as i32;
                index -= cycles * 1461;
            }
            Calendar::Standard | Calendar::ProlepticGregorian => {
                // 400 Gregorian years hold exactly 146097 days.
                let cycles = index.div_euclid(146_097);
                year += (cycles * 400) as i32;
                index -= cycles * 146_097;
            }
        }
        while index >= i64::from(self.days_in_year(year)) {
            index -= i64::from(self.days_in_year(year));
            year += 1;
        }
        (year, index as u32 + 1)
    }

    fn month_day(&self, year: i32, ordinal: u32) -> (u32, u32) {
        let mut remaining = ordinal;
        for month in 1..=12 {
            let len = self.days_in_month(year, month);
            if remaining <= len {
                return (month, remaining);
            }
            remaining -= len;
        }
        (12, self.days_in_month(year, 12))
    }
}

impl FromStr for Calendar {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" => Ok(Calendar::Standard),
            "proleptic_gregorian" => Ok(Calendar::ProlepticGregorian),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            "julian" => Ok(Calendar::Julian),
            other => Err(GridError::UnknownCalendar(other.to_string())),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A date-time on an arbitrary CF calendar, stored field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CfDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CfDateTime {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub fn from_naive(datetime: NaiveDateTime) -> Self {
        Self::new(
            datetime.year(),
            datetime.month(),
            datetime.day(),
            datetime.hour(),
            datetime.minute(),
            datetime.second(),
        )
    }

    fn seconds_of_day(&self) -> u32 {
        self.hour * 3600 + self.minute * 60 + self.second
    }

    /// Field-wise conversion to a standard timestamp; `None` when the date
    /// does not exist on the standard calendar (e.g. 30 February).
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?.and_hms_opt(
            self.hour,
            self.minute,
            self.second,
        )
    }

    /// Field-wise conversion that clamps impossible days to the last day of
    /// the month. The flag reports whether clamping happened.
    pub fn to_naive_clamped(&self) -> Option<(NaiveDateTime, bool)> {
        if let Some(exact) = self.to_naive() {
            return Some((exact, false));
        }
        let last = Calendar::Standard.days_in_month(self.year, self.month);
        let clamped = CfDateTime {
            day: self.day.min(last),
            ..*self
        };
        clamped.to_naive().map(|dt| (dt, true))
    }

    /// Maps a `360_day` date onto the standard calendar by scaling its day of
    /// year to the target year length (`align_on = "year"`).
    pub fn align_day360_on_year(&self) -> Option<NaiveDateTime> {
        let doy = f64::from(Calendar::Day360.day_of_year(self));
        let days = Calendar::Standard.days_in_year(self.year);
        let scaled = (f64::from(days) * doy / 360.0).round_ties_even() as u32;
        NaiveDate::from_yo_opt(self.year, scaled.clamp(1, days))?.and_hms_opt(
            self.hour,
            self.minute,
            self.second,
        )
    }
}

impl fmt::Display for CfDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// The time coordinate of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeAxis {
    Standard(Vec<NaiveDateTime>),
    Calendar {
        calendar: Calendar,
        dates: Vec<CfDateTime>,
    },
}

impl TimeAxis {
    pub fn len(&self) -> usize {
        match self {
            TimeAxis::Standard(times) => times.len(),
            TimeAxis::Calendar { dates, .. } => dates.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn calendar(&self) -> Option<Calendar> {
        match self {
            TimeAxis::Standard(_) => None,
            TimeAxis::Calendar { calendar, .. } => Some(*calendar),
        }
    }

    pub fn as_standard(&self) -> Result<&[NaiveDateTime], GridError> {
        match self {
            TimeAxis::Standard(times) => Ok(times),
            TimeAxis::Calendar { calendar, .. } => {
                Err(GridError::NonStandardTime(calendar.to_string()))
            }
        }
    }

    pub fn select(&self, indices: &[usize]) -> TimeAxis {
        match self {
            TimeAxis::Standard(times) => {
                TimeAxis::Standard(indices.iter().map(|&i| times[i]).collect())
            }
            TimeAxis::Calendar { calendar, dates } => TimeAxis::Calendar {
                calendar: *calendar,
                dates: indices.iter().map(|&i| dates[i]).collect(),
            },
        }
    }

    /// Appends `parts` in order. All parts must share the same calendar.
    pub fn concat(parts: &[&TimeAxis]) -> Result<TimeAxis, GridError> {
        let Some(first) = parts.first() else {
            return Ok(TimeAxis::Standard(Vec::new()));
        };
        match first {
            TimeAxis::Standard(_) => {
                let mut times = Vec::new();
                for part in parts {
                    times.extend_from_slice(part.as_standard()?);
                }
                Ok(TimeAxis::Standard(times))
            }
            TimeAxis::Calendar { calendar, .. } => {
                let mut dates = Vec::new();
                for part in parts {
                    match part {
                        TimeAxis::Calendar {
                            calendar: other,
                            dates: more,
                        } if other == calendar => dates.extend_from_slice(more),
                        _ => {
                            return Err(GridError::IncompatibleTimeAxes(format!(
                                "cannot join a '{calendar}' axis with a different calendar"
                            )))
                        }
                    }
                }
                Ok(TimeAxis::Calendar {
                    calendar: *calendar,
                    dates,
                })
            }
        }
    }

    /// Decodes CF offsets such as `hours since 1850-01-01 00:00:00`.
    pub fn decode(units: &str, calendar: Calendar, offsets: &[f64]) -> Result<TimeAxis, GridError> {
        let (days_per_unit, base) = parse_time_units(units)?;
        let dates = offsets
            .iter()
            .map(|offset| calendar.add_days(&base, offset * days_per_unit));
        if calendar.is_standard() {
            let times = dates
                .map(|date| {
                    date.to_naive()
                        .ok_or_else(|| GridError::InvalidTimeUnits(units.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TimeAxis::Standard(times))
        } else {
            Ok(TimeAxis::Calendar {
                calendar,
                dates: dates.collect(),
            })
        }
    }
}

/// Splits `<unit> since <date>[ <time>]` into a day multiplier and base date.
fn parse_time_units(units: &str) -> Result<(f64, CfDateTime), GridError> {
    let invalid = || GridError::InvalidTimeUnits(units.to_string());
    let mut parts = units.split_whitespace();
    let unit = parts.next().ok_or_else(invalid)?;
    if parts.next() != Some("since") {
        return Err(invalid());
    }
    let days_per_unit = match unit.to_ascii_lowercase().as_str() {
        "days" | "day" | "d" => 1.0,
        "hours" | "hour" | "h" => 1.0 / 24.0,
        "minutes" | "minute" | "min" => 1.0 / 1440.0,
        "seconds" | "second" | "s" => 1.0 / 86_400.0,
        _ => return Err(invalid()),
    };

    let date = parts.next().ok_or_else(invalid)?;
    let (date, inline_time) = match date.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (date, None),
    };
    let mut ymd = date.splitn(3, '-').map(str::parse::<i64>);
    let year = ymd.next().and_then(Result::ok).ok_or_else(invalid)?;
    let month = ymd.next().and_then(Result::ok).ok_or_else(invalid)?;
    let day = ymd.next().and_then(Result::ok).ok_or_else(invalid)?;

    let mut hms = [0u32; 3];
    if let Some(time) = inline_time.or_else(|| parts.next()) {
        for (slot, field) in hms.iter_mut().zip(time.split(':')) {
            let whole = field.split('.').next().unwrap_or("0");
            *slot = whole.parse().map_err(|_| invalid())?;
        }
    }

    Ok((
        days_per_unit,
        CfDateTime::new(
            year as i32,
            month as u32,
            day as u32,
            hms[0],
            hms[1],
            hms[2],
        ),
    ))
}
