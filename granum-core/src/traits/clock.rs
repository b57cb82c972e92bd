//! Wall clock trait and calendar types

use core::fmt;

/// Errors from setting or parsing the wall clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Text is not in the expected `HH:MM:SS` / `DD/MM/YY` shape
    Format,
    /// Field outside the calendar range
    OutOfRange,
    /// The clock hardware rejected the access
    Hardware,
}

/// Time of day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Time {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

/// Calendar date; `year` counts from 2000
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Date {
    pub year: u8,
    pub month: u8,
    pub day: u8,
}

impl Default for Date {
    fn default() -> Self {
        Self {
            year: 0,
            month: 1,
            day: 1,
        }
    }
}

/// Date and time read together
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

impl Time {
    /// Build a validated time of day
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Result<Self, ClockError> {
        if hours > 23 || minutes > 59 || seconds > 59 {
            return Err(ClockError::OutOfRange);
        }
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    /// Parse `HH:MM:SS`
    pub fn parse(text: &str) -> Result<Self, ClockError> {
        let [h, m, s] = split_three(text, ':')?;
        Self::new(h, m, s)
    }

    /// Seconds since midnight
    pub fn seconds_of_day(&self) -> u32 {
        self.hours as u32 * 3600 + self.minutes as u32 * 60 + self.seconds as u32
    }

    /// Inverse of [`Time::seconds_of_day`], wrapping at 24 h
    pub fn from_seconds_of_day(secs: u32) -> Self {
        let secs = secs % 86_400;
        Self {
            hours: (secs / 3600) as u8,
            minutes: (secs / 60 % 60) as u8,
            seconds: (secs % 60) as u8,
        }
    }
}

impl Date {
    /// Build a validated date
    pub fn new(day: u8, month: u8, year: u8) -> Result<Self, ClockError> {
        if year > 99 || !(1..=12).contains(&month) {
            return Err(ClockError::OutOfRange);
        }
        if day == 0 || day > days_in_month(month, year) {
            return Err(ClockError::OutOfRange);
        }
        Ok(Self { year, month, day })
    }

    /// Parse `DD/MM/YY`
    pub fn parse(text: &str) -> Result<Self, ClockError> {
        let [d, m, y] = split_three(text, '/')?;
        Self::new(d, m, y)
    }

    /// ISO weekday, 1 = Monday through 7 = Sunday
    pub fn weekday(&self) -> u8 {
        let mut days = (self.day as u32).saturating_sub(1);
        for year in 0..self.year {
            days += if year % 4 == 0 { 366 } else { 365 };
        }
        for month in 1..self.month {
            days += days_in_month(month, self.year) as u32;
        }
        // 01/01/00 was a Saturday
        ((days + 5) % 7 + 1) as u8
    }
}

/// Days in `month` of year `2000 + year`
pub fn days_in_month(month: u8, year: u8) -> u8 {
    match month {
        2 if year % 4 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn split_three(text: &str, sep: char) -> Result<[u8; 3], ClockError> {
    let mut out = [0u8; 3];
    let mut parts = text.trim().split(sep);
    for slot in out.iter_mut() {
        let part = parts.next().ok_or(ClockError::Format)?;
        if part.is_empty() || part.len() > 2 {
            return Err(ClockError::Format);
        }
        *slot = part.parse().map_err(|_| ClockError::Format)?;
    }
    if parts.next().is_some() {
        return Err(ClockError::Format);
    }
    Ok(out)
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{:02}", self.day, self.month, self.year)
    }
}

/// Real-time clock collaborator
pub trait WallClock {
    /// Current date and time
    fn now(&self) -> DateTime;

    /// Set the time of day, keeping the date
    fn set_time(&mut self, time: Time) -> Result<(), ClockError>;

    /// Set the date, keeping the time of day
    fn set_date(&mut self, date: Date) -> Result<(), ClockError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_parse() {
        assert_eq!(Time::parse("07:05:09"), Ok(Time::new(7, 5, 9).unwrap()));
        assert_eq!(Time::parse("24:00:00"), Err(ClockError::OutOfRange));
        assert_eq!(Time::parse("12:00"), Err(ClockError::Format));
        assert_eq!(Time::parse("12:00:00:00"), Err(ClockError::Format));
        assert_eq!(Time::parse("ab:00:00"), Err(ClockError::Format));
    }

    #[test]
    fn test_date_parse_leap_year() {
        assert!(Date::parse("29/02/24").is_ok());
        assert_eq!(Date::parse("29/02/25"), Err(ClockError::OutOfRange));
        assert_eq!(Date::parse("31/04/25"), Err(ClockError::OutOfRange));
    }

    #[test]
    fn test_weekday() {
        assert_eq!(Date::new(1, 1, 0).unwrap().weekday(), 6);
        assert_eq!(Date::new(1, 1, 25).unwrap().weekday(), 3);
        assert_eq!(Date::new(26, 9, 25).unwrap().weekday(), 5);
        assert_eq!(Date::new(18, 10, 26).unwrap().weekday(), 7);
        assert_eq!(Date::new(29, 2, 24).unwrap().weekday(), 4);
    }

    #[test]
    fn test_seconds_of_day_roundtrip() {
        let time = Time::new(23, 59, 59).unwrap();
        assert_eq!(Time::from_seconds_of_day(time.seconds_of_day()), time);
        assert_eq!(Time::from_seconds_of_day(86_400), Time::default());
    }

    #[test]
    fn test_display_format() {
        assert_eq!(Time::new(8, 3, 0).unwrap().to_string(), "08:03:00");
        assert_eq!(Date::new(5, 1, 26).unwrap().to_string(), "05/01/26");
    }
}
