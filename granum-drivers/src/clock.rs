//! Calendar-backed wall clock
//!
//! The RTC keeps counting across resets, so a running calendar is left
//! alone. Only a calendar that reads back a year before [`MIN_VALID_YEAR`]
//! (never set, or lost its backup domain) is loaded with midnight of
//! [`DEFAULT_DATE`].

use granum_core::traits::{ClockError, Date, DateTime, Time, WallClock};

/// Date loaded into a calendar that was never set
pub const DEFAULT_DATE: Date = Date {
    day: 26,
    month: 9,
    year: 25,
};

/// Earliest year a set calendar can hold
pub const MIN_VALID_YEAR: u8 = 24;

/// Hardware calendar registers
pub trait Calendar {
    type Error;

    fn read(&mut self) -> Result<DateTime, Self::Error>;

    fn write(&mut self, now: &DateTime) -> Result<(), Self::Error>;
}

/// True when a calendar reading cannot be a set clock
pub fn needs_default(now: &DateTime) -> bool {
    now.date.year < MIN_VALID_YEAR
}

/// [`WallClock`] over a hardware calendar
///
/// Readings are cached; the owner calls [`RtcClock::update`] from the
/// superloop.
#[derive(Debug)]
pub struct RtcClock<C> {
    calendar: C,
    now: DateTime,
}

impl<C: Calendar> RtcClock<C> {
    pub fn new(calendar: C) -> Self {
        Self {
            calendar,
            now: DateTime {
                date: DEFAULT_DATE,
                time: Time::default(),
            },
        }
    }

    /// Keep a running calendar, or load the default into an unset one
    ///
    /// Returns true when the default was written.
    pub fn restore(&mut self) -> Result<bool, C::Error> {
        match self.calendar.read() {
            Ok(now) if !needs_default(&now) => {
                self.now = now;
                Ok(false)
            }
            _ => {
                let now = DateTime {
                    date: DEFAULT_DATE,
                    time: Time::default(),
                };
                self.calendar.write(&now)?;
                self.now = now;
                Ok(true)
            }
        }
    }

    /// Refresh the cached reading
    pub fn update(&mut self) -> Result<(), C::Error> {
        self.now = self.calendar.read()?;
        Ok(())
    }

    fn store(&mut self, now: DateTime) -> Result<(), ClockError> {
        self.calendar
            .write(&now)
            .map_err(|_| ClockError::Hardware)?;
        self.now = now;
        Ok(())
    }
}

impl<C: Calendar> WallClock for RtcClock<C> {
    fn now(&self) -> DateTime {
        self.now
    }

    fn set_time(&mut self, time: Time) -> Result<(), ClockError> {
        self.store(DateTime { time, ..self.now })
    }

    fn set_date(&mut self, date: Date) -> Result<(), ClockError> {
        self.store(DateTime { date, ..self.now })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct MockCalendar {
        now: Option<DateTime>,
        writes: Vec<DateTime>,
        fail_write: bool,
    }

    impl Calendar for MockCalendar {
        type Error = ();

        fn read(&mut self) -> Result<DateTime, ()> {
            self.now.ok_or(())
        }

        fn write(&mut self, now: &DateTime) -> Result<(), ()> {
            if self.fail_write {
                return Err(());
            }
            self.now = Some(*now);
            self.writes.push(*now);
            Ok(())
        }
    }

    fn at(day: u8, month: u8, year: u8, h: u8, m: u8, s: u8) -> DateTime {
        DateTime {
            date: Date::new(day, month, year).unwrap(),
            time: Time::new(h, m, s).unwrap(),
        }
    }

    #[test]
    fn test_running_calendar_kept() {
        let running = at(3, 2, 26, 14, 30, 5);
        let mut clock = RtcClock::new(MockCalendar {
            now: Some(running),
            ..Default::default()
        });

        assert_eq!(clock.restore(), Ok(false));
        assert_eq!(clock.now(), running);
        assert!(clock.calendar.writes.is_empty());
    }

    #[test]
    fn test_unset_calendar_gets_default() {
        let mut clock = RtcClock::new(MockCalendar {
            now: Some(at(1, 1, 0, 0, 4, 10)),
            ..Default::default()
        });

        assert_eq!(clock.restore(), Ok(true));
        let expected = at(26, 9, 25, 0, 0, 0);
        assert_eq!(clock.now(), expected);
        assert_eq!(clock.calendar.writes, [expected]);
    }

    #[test]
    fn test_unreadable_calendar_gets_default() {
        let mut clock = RtcClock::new(MockCalendar::default());
        assert_eq!(clock.restore(), Ok(true));
        assert_eq!(clock.now().date, DEFAULT_DATE);
    }

    #[test]
    fn test_year_boundary() {
        assert!(needs_default(&at(31, 12, 23, 23, 59, 59)));
        assert!(!needs_default(&at(1, 1, 24, 0, 0, 0)));
    }

    #[test]
    fn test_set_time_keeps_date() {
        let mut clock = RtcClock::new(MockCalendar {
            now: Some(at(3, 2, 26, 14, 30, 5)),
            ..Default::default()
        });
        clock.restore().unwrap();

        clock.set_time(Time::new(8, 0, 0).unwrap()).unwrap();
        assert_eq!(clock.now(), at(3, 2, 26, 8, 0, 0));

        clock.set_date(Date::new(4, 2, 26).unwrap()).unwrap();
        clock.update().unwrap();
        assert_eq!(clock.now(), at(4, 2, 26, 8, 0, 0));
    }

    #[test]
    fn test_failed_write_leaves_cache() {
        let running = at(3, 2, 26, 14, 30, 5);
        let mut clock = RtcClock::new(MockCalendar {
            now: Some(running),
            ..Default::default()
        });
        clock.restore().unwrap();
        clock.calendar.fail_write = true;

        assert_eq!(
            clock.set_time(Time::new(8, 0, 0).unwrap()),
            Err(ClockError::Hardware)
        );
        assert_eq!(clock.now(), running);
    }
}
