//! Hour/minute/second durations with carry and borrow arithmetic.
//!
//! Provides [`Duration`], the immutable value every stopwatch and timer tick
//! produces, and [`InvalidDuration`], the single error kind raised when a value
//! cannot be represented.

use core::fmt::{self, Write};
use core::str::FromStr;

/// Capacity of the buffer returned by [`Duration::to_text`].
///
/// Wide enough for two full `u32` fields, a two digit second and both separators.
pub const TEXT_CAPACITY: usize = 32;

/// Fixed-capacity `HH:MM:SS` rendering of a [`Duration`].
pub type DurationText = heapless::String<TEXT_CAPACITY>;

const SECONDS_PER_MINUTE: i64 = 60;
const MINUTES_PER_HOUR: i64 = 60;

/// A component of a [`Duration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Unit {
    Hour,
    Minute,
    Second,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Hour => write!(f, "hour"),
            Unit::Minute => write!(f, "minute"),
            Unit::Second => write!(f, "second"),
        }
    }
}

/// Reasons a [`Duration`] could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidDuration {
    /// A component was below zero.
    Negative {
        /// Offending component.
        unit: Unit,
        /// Value supplied for it.
        value: i64,
    },

    /// A component does not fit in the stored representation.
    OutOfRange {
        /// Offending component.
        unit: Unit,
        /// Value after normalization.
        value: i64,
    },

    /// Subtraction would produce a negative duration.
    Underflow,

    /// Text is not of the form `H:M:S` with decimal digits only.
    Malformed,
}

impl fmt::Display for InvalidDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidDuration::Negative { unit, value } => {
                write!(f, "invalid value provided for {}: {}", unit, value)
            }
            InvalidDuration::OutOfRange { unit, value } => {
                write!(f, "{} value {} is out of range", unit, value)
            }
            InvalidDuration::Underflow => {
                write!(f, "subtraction would produce a negative duration")
            }
            InvalidDuration::Malformed => {
                write!(f, "expected a duration of the form H:M:S")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidDuration {}

/// An immutable hour/minute/second value.
///
/// Construction validates every component and normalizes overflowing minutes and
/// seconds in a single pass (see [`Duration::new`]). Arithmetic never mutates a
/// value; it returns a fresh one built through the same validated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Duration {
    hour: u32,
    minute: u32,
    second: u32,
}

impl Duration {
    /// `00:00:00`.
    pub const ZERO: Self = Self {
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// `00:00:01`, the amount a stopwatch or timer moves per tick.
    pub const ONE_SECOND: Self = Self {
        hour: 0,
        minute: 0,
        second: 1,
    };

    /// Creates a duration from raw components.
    ///
    /// Minutes of 60 or more carry into hours, then seconds of 60 or more carry
    /// into minutes. The pass is not repeated, so a seconds carry can leave the
    /// minute field at 60 or above: `new(0, 59, 60)` holds 60 minutes.
    ///
    /// # Errors
    /// * [`InvalidDuration::Negative`] - any component is below zero
    /// * [`InvalidDuration::OutOfRange`] - a normalized component exceeds `u32`
    pub fn new(hour: i64, minute: i64, second: i64) -> Result<Self, InvalidDuration> {
        non_negative(Unit::Hour, hour)?;
        non_negative(Unit::Minute, minute)?;
        non_negative(Unit::Second, second)?;

        let (mut hour, mut minute, mut second) = (hour, minute, second);

        if minute >= MINUTES_PER_HOUR {
            let carry = minute / MINUTES_PER_HOUR;
            hour = hour.checked_add(carry).ok_or(InvalidDuration::OutOfRange {
                unit: Unit::Hour,
                value: hour.saturating_add(carry),
            })?;
            minute %= MINUTES_PER_HOUR;
        }

        if second >= SECONDS_PER_MINUTE {
            minute += second / SECONDS_PER_MINUTE;
            second %= SECONDS_PER_MINUTE;
        }

        Ok(Self {
            hour: narrow(Unit::Hour, hour)?,
            minute: narrow(Unit::Minute, minute)?,
            second: narrow(Unit::Second, second)?,
        })
    }

    /// Creates a duration from a whole number of seconds, fully normalized.
    pub fn from_secs(total: u64) -> Result<Self, InvalidDuration> {
        let total = i64::try_from(total).map_err(|_| InvalidDuration::OutOfRange {
            unit: Unit::Second,
            value: i64::MAX,
        })?;
        let minutes = total / SECONDS_PER_MINUTE;
        Self::new(
            minutes / MINUTES_PER_HOUR,
            minutes % MINUTES_PER_HOUR,
            total % SECONDS_PER_MINUTE,
        )
    }

    /// Hour component.
    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// Minute component.
    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Second component.
    pub fn second(&self) -> u32 {
        self.second
    }

    /// Returns true for `00:00:00`.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Total length in seconds.
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hour) * 3600 + u64::from(self.minute) * 60 + u64::from(self.second)
    }

    /// Adds `other`, carrying seconds into minutes and minutes into hours.
    ///
    /// # Errors
    /// * [`InvalidDuration::OutOfRange`] - the hour sum exceeds `u32`
    pub fn checked_add(self, other: Self) -> Result<Self, InvalidDuration> {
        let mut hour = i64::from(self.hour) + i64::from(other.hour);
        let mut minute = i64::from(self.minute) + i64::from(other.minute);
        let mut second = i64::from(self.second) + i64::from(other.second);

        if second >= SECONDS_PER_MINUTE {
            second -= SECONDS_PER_MINUTE;
            minute += 1;
        }

        if minute >= MINUTES_PER_HOUR {
            minute -= MINUTES_PER_HOUR;
            hour += 1;
        }

        Self::new(hour, minute, second)
    }

    /// Subtracts `other`, borrowing from minutes or hours when seconds go negative.
    ///
    /// Minutes are fixed up first: a negative minute difference borrows one hour.
    /// A negative second difference then borrows one minute when any remain,
    /// otherwise one hour (as 59 minutes and 60 seconds).
    ///
    /// # Errors
    /// * [`InvalidDuration::Underflow`] - `other` is longer than `self`
    pub fn checked_sub(self, other: Self) -> Result<Self, InvalidDuration> {
        let mut hour = i64::from(self.hour) - i64::from(other.hour);
        let mut minute = i64::from(self.minute) - i64::from(other.minute);
        let mut second = i64::from(self.second) - i64::from(other.second);

        if minute < 0 {
            minute += MINUTES_PER_HOUR;
            hour -= 1;
        }

        if second < 0 {
            if minute > 0 {
                minute -= 1;
                second += SECONDS_PER_MINUTE;
            } else if hour > 0 {
                hour -= 1;
                minute += MINUTES_PER_HOUR - 1;
                second += SECONDS_PER_MINUTE;
            }
        }

        Self::new(hour, minute, second).map_err(|err| match err {
            InvalidDuration::Negative { .. } => InvalidDuration::Underflow,
            other => other,
        })
    }

    /// Renders the duration as `HH:MM:SS`.
    ///
    /// Each field is zero padded to two digits and never truncated, so 100 hours
    /// renders as `100:00:00`.
    pub fn to_text(&self) -> DurationText {
        let mut text = DurationText::new();
        // Cannot fail: TEXT_CAPACITY covers the widest possible rendering.
        let _ = write!(text, "{}", self);
        text
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl FromStr for Duration {
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.trim().split(':');
        let hour = parse_field(fields.next())?;
        let minute = parse_field(fields.next())?;
        let second = parse_field(fields.next())?;

        if fields.next().is_some() {
            return Err(InvalidDuration::Malformed);
        }

        Self::new(hour, minute, second)
    }
}

impl From<Duration> for core::time::Duration {
    fn from(duration: Duration) -> Self {
        core::time::Duration::from_secs(duration.total_seconds())
    }
}

fn non_negative(unit: Unit, value: i64) -> Result<(), InvalidDuration> {
    if value < 0 {
        return Err(InvalidDuration::Negative { unit, value });
    }
    Ok(())
}

fn narrow(unit: Unit, value: i64) -> Result<u32, InvalidDuration> {
    u32::try_from(value).map_err(|_| InvalidDuration::OutOfRange { unit, value })
}

fn parse_field(field: Option<&str>) -> Result<i64, InvalidDuration> {
    match field {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse().map_err(|_| InvalidDuration::Malformed)
        }
        _ => Err(InvalidDuration::Malformed),
    }
}
