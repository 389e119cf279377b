//! Assembles the weather line and quotes block into the day's email

use crate::models::Digest;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Build the digest for the local date of `now`
#[must_use]
pub fn compose<Tz>(weather: &str, quotes: &str, now: &DateTime<Tz>) -> Digest
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = now.format(DATE_FORMAT).to_string();

    let subject = format!("Morning Update - {date}");
    let body = format!(
        "Good Morning!\n\
         \n\
         Here is your daily update for {date}:\n\
         \n\
         {weather}\n\
         \n\
         Live Stock Prices:\n\
         {quotes}\n\
         Have a great day!\n"
    );

    Digest { subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::America::New_York;
    use rstest::rstest;

    const WEATHER: &str = "Weather in Monterrey: Clear sky, 72.5°F";
    const QUOTES: &str = "AAPL: $150.00\nGOOGL: Failed to fetch data (timeout)\n";

    #[test]
    fn test_compose_full_digest() {
        let now = New_York.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let digest = compose(WEATHER, QUOTES, &now);

        assert_eq!(digest.subject, "Morning Update - 2024-03-04");
        assert_eq!(
            digest.body,
            "Good Morning!\n\
             \n\
             Here is your daily update for 2024-03-04:\n\
             \n\
             Weather in Monterrey: Clear sky, 72.5°F\n\
             \n\
             Live Stock Prices:\n\
             AAPL: $150.00\n\
             GOOGL: Failed to fetch data (timeout)\n\
             \n\
             Have a great day!\n"
        );
    }

    #[rstest]
    #[case(2024, 1, 1)]
    #[case(2024, 2, 29)]
    #[case(1999, 12, 31)]
    fn test_subject_pattern(#[case] year: i32, #[case] month: u32, #[case] day: u32) {
        let now = Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap();
        let digest = compose("", "", &now);
        assert_eq!(
            digest.subject,
            format!("Morning Update - {year:04}-{month:02}-{day:02}")
        );
    }

    #[test]
    fn test_local_date_is_used() {
        // 02:30 UTC on the 5th is still the evening of the 4th in New York.
        let utc = Utc.with_ymd_and_hms(2024, 3, 5, 2, 30, 0).unwrap();
        let local = utc.with_timezone(&New_York);
        assert_eq!(compose("", "", &local).subject, "Morning Update - 2024-03-04");
        assert_eq!(compose("", "", &utc).subject, "Morning Update - 2024-03-05");
    }
}
