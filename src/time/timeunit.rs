use crate::time::error::Error;
use core::str::FromStr;
use lazy_static::*;
use regex::Regex;
use std::time::Duration;

lazy_static! {
    static ref DURATION_REGEX: Regex = Regex::new(
        r"^\s*(?P<value>\d+)\s*(?P<unit>ns|us|ms|s|m|h|d)?\s*$"
    )
    .expect("Regex compilation error");
}

/// A duration written as a number with an optional unit suffix.
/// A bare number is read as milliseconds.
#[derive(Debug, PartialEq)]
pub struct DurationUnit {
    value: u64,
    unit: TimeUnit,
}

#[derive(Debug, PartialEq)]
pub enum TimeUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl DurationUnit {
    pub fn to_duration(&self) -> Result<Duration, Error> {
        let overflow = || Error::Overflow(format!("{}{}", self.value, self.unit.suffix()));
        let duration = match self.unit {
            TimeUnit::Nanosecond => Duration::from_nanos(self.value),
            TimeUnit::Microsecond => Duration::from_micros(self.value),
            TimeUnit::Millisecond => Duration::from_millis(self.value),
            TimeUnit::Second => Duration::from_secs(self.value),
            TimeUnit::Minute => Duration::from_secs(self.value.checked_mul(60).ok_or_else(overflow)?),
            TimeUnit::Hour => {
                Duration::from_secs(self.value.checked_mul(60 * 60).ok_or_else(overflow)?)
            }
            TimeUnit::Day => {
                Duration::from_secs(self.value.checked_mul(60 * 60 * 24).ok_or_else(overflow)?)
            }
        };
        Ok(duration)
    }
}

impl FromStr for DurationUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DURATION_REGEX.captures(s).ok_or_else(|| {
            Error::Syntax(format!("'{}' is not a correct duration unit value", s))
        })?;
        let value = caps["value"]
            .parse()
            .map_err(|_| Error::Overflow(s.to_owned()))?;
        let unit = match caps.name("unit") {
            Some(unit) => unit.as_str().parse::<TimeUnit>()?,
            None => TimeUnit::Millisecond,
        };
        Ok(Self { value, unit })
    }
}

/// Parses `"250ms"`, `"30s"`, `"1500"` and friends straight into a [`Duration`].
pub fn parse_duration(s: &str) -> Result<Duration, Error> {
    s.parse::<DurationUnit>()?.to_duration()
}

impl TimeUnit {
    fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Nanosecond => "ns",
            TimeUnit::Microsecond => "us",
            TimeUnit::Millisecond => "ms",
            TimeUnit::Second => "s",
            TimeUnit::Minute => "m",
            TimeUnit::Hour => "h",
            TimeUnit::Day => "d",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" | "nanosecond" | "nanos" | "nanoseconds" => Ok(TimeUnit::Nanosecond),
            "us" | "microsecond" | "micros" | "microseconds" => Ok(TimeUnit::Microsecond),
            "ms" | "millisecond" | "millis" | "milliseconds" => Ok(TimeUnit::Millisecond),
            "s" | "second" | "secs" | "seconds" => Ok(TimeUnit::Second),
            "m" | "minute" | "mins" | "minutes" => Ok(TimeUnit::Minute),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hour),
            "d" | "day" | "days" => Ok(TimeUnit::Day),
            _ => Err(Error::UnitNotSupported(format!("Unit '{}' not supported", s))),
        }
    }
}
