use super::{int::Padded, write::Format};
use std::time::{SystemTime, UNIX_EPOCH};

#[rustfmt::skip]
static WEEKDAYS: [&[u8; 3]; 7] = [b"Sun", b"Mon", b"Tue", b"Wed", b"Thu", b"Fri", b"Sat"];
#[rustfmt::skip]
static MONTHS: [&[u8; 3]; 12] = [
    b"Jan", b"Feb", b"Mar", b"Apr", b"May", b"Jun",
    b"Jul", b"Aug", b"Sep", b"Oct", b"Nov", b"Dec",
];

const SECS_PER_DAY: u64 = 86_400;

/// A point in time rendered as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HttpDate {
    secs: u64,
}

impl HttpDate {
    /// Length of every rendered date.
    pub const LEN: usize = 29;

    #[inline]
    pub const fn from_unix(secs: u64) -> Self {
        Self { secs }
    }

    /// Reads the system clock. A clock set before 1970 reads as the epoch.
    #[inline]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self::from_unix(secs)
    }

    #[inline]
    pub const fn unix_secs(&self) -> u64 {
        self.secs
    }

    #[inline]
    fn fields(&self) -> impl Format {
        let (days, secs_of_day) = (self.secs / SECS_PER_DAY, self.secs % SECS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        let weekday = ((days + 4) % 7) as usize;
        let secs_of_day = secs_of_day as u32;

        (
            WEEKDAYS[weekday],
            b", ",
            Padded::<2>::new(day),
            b" ",
            MONTHS[month as usize - 1],
            b" ",
            Padded::<4>::new(year),
            b" ",
            Padded::<2>::new(secs_of_day / 3600),
            b":",
            Padded::<2>::new(secs_of_day / 60 % 60),
            b":",
            Padded::<2>::new(secs_of_day % 60),
            b" GMT",
        )
    }
}

impl Format for HttpDate {
    #[inline]
    fn max_size(&self) -> usize {
        Self::LEN
    }

    #[inline]
    fn write_to(&self, dst: &mut [u8]) -> usize {
        self.fields().write_to(dst)
    }
}

/// The current time, read from the clock when it is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Now;

impl Format for Now {
    #[inline]
    fn max_size(&self) -> usize {
        HttpDate::LEN
    }

    #[inline]
    fn write_to(&self, dst: &mut [u8]) -> usize {
        HttpDate::now().write_to(dst)
    }
}

/// Days since 1970-01-01 to a proleptic Gregorian `(year, month, day)`.
///
/// Years are counted from March so the leap day falls at the end of the
/// cycle; see Howard Hinnant's "chrono-Compatible Low-Level Date Algorithms".
fn civil_from_days(days: u64) -> (u32, u32, u32) {
    let shifted = days + 719_468;
    let era = shifted / 146_097;
    let day_of_era = shifted % 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let month_index = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * month_index + 2) / 5 + 1;
    let month = if month_index < 10 {
        month_index + 3
    } else {
        month_index - 9
    };
    let year = year_of_era + era * 400 + (month <= 2) as u64;

    (year as u32, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::*;

    fn render(value: impl Format) -> String {
        let mut dst = [0u8; HttpDate::LEN];
        let len = value.write_to(&mut dst);
        assert_eq!(len, HttpDate::LEN);
        str_op(&dst).to_string()
    }

    #[test]
    fn known_dates() {
        #[rustfmt::skip]
        let cases = [
            (0, "Thu, 01 Jan 1970 00:00:00 GMT"),
            (784_111_777, "Sun, 06 Nov 1994 08:49:37 GMT"),
            (951_782_400, "Tue, 29 Feb 2000 00:00:00 GMT"),
            (1_700_000_000, "Tue, 14 Nov 2023 22:13:20 GMT"),
            (4_102_444_799, "Thu, 31 Dec 2099 23:59:59 GMT"),
        ];

        for (secs, expected) in cases {
            let date = HttpDate::from_unix(secs);
            assert_eq!(date.unix_secs(), secs);
            assert_eq!(render(date), expected);
        }
    }

    #[test]
    fn civil_round_trip_over_leap_years() {
        let mut days = 0;
        for year in 1970..2200u32 {
            let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
            let lengths = [31, if leap { 29 } else { 28 }, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
            for (month, length) in lengths.into_iter().enumerate() {
                for day in 1..=length {
                    assert_eq!(civil_from_days(days), (year, month as u32 + 1, day));
                    days += 1;
                }
            }
        }
    }

    #[test]
    fn now_is_well_formed() {
        let before = HttpDate::now();
        let text = render(Now);
        assert!(text.ends_with(" GMT"));
        assert_eq!(&text[3..5], ", ");
        assert!(WEEKDAYS.iter().any(|day| text.as_bytes().starts_with(*day)));
        assert!(HttpDate::now() >= before);
        assert_eq!(Now.max_size(), HttpDate::LEN);
    }
}
