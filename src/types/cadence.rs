//! Cutout time-step codes and their CMIP frequency vocabulary.

use crate::error::CmipError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;

/// The nominal time step of a cutout.
///
/// Parsed from the cutout's `dt` code (`"H"`, `"3H"`, `"6H"`, `"D"`, `"M"`,
/// `"Y"`) and mapped onto the frequency tokens the ESGF archive publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cadence {
    Hourly,
    ThreeHourly,
    SixHourly,
    Daily,
    Monthly,
    Yearly,
}

impl Cadence {
    /// Archive frequency token for time-mean output at this cadence.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmip_esgf::Cadence;
    ///
    /// let cadence: Cadence = "6H".parse().unwrap();
    /// assert_eq!(cadence.frequency(), "6hr");
    /// ```
    pub fn frequency(&self) -> &'static str {
        match self {
            Cadence::Hourly => "1hr",
            Cadence::ThreeHourly => "3hr",
            Cadence::SixHourly => "6hr",
            Cadence::Daily => "day",
            Cadence::Monthly => "mon",
            Cadence::Yearly => "yr",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Cadence::Hourly => "H",
            Cadence::ThreeHourly => "3H",
            Cadence::SixHourly => "6H",
            Cadence::Daily => "D",
            Cadence::Monthly => "M",
            Cadence::Yearly => "Y",
        }
    }

    /// Start of the cadence bin containing `datetime`.
    pub fn floor(&self, datetime: NaiveDateTime) -> NaiveDateTime {
        let date = datetime.date();
        let at = |date: NaiveDate, hour: u32| date.and_hms_opt(hour, 0, 0).unwrap_or(datetime);
        match self {
            Cadence::Hourly => at(date, datetime.hour()),
            Cadence::ThreeHourly => at(date, datetime.hour() / 3 * 3),
            Cadence::SixHourly => at(date, datetime.hour() / 6 * 6),
            Cadence::Daily => at(date, 0),
            Cadence::Monthly => at(date.with_day(1).unwrap_or(date), 0),
            Cadence::Yearly => at(
                NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
                0,
            ),
        }
    }
}

impl FromStr for Cadence {
    type Err = CmipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H" | "h" => Ok(Cadence::Hourly),
            "3H" | "3h" => Ok(Cadence::ThreeHourly),
            "6H" | "6h" => Ok(Cadence::SixHourly),
            "D" => Ok(Cadence::Daily),
            "M" => Ok(Cadence::Monthly),
            "Y" => Ok(Cadence::Yearly),
            other => Err(CmipError::UnknownCadence(other.to_string())),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
