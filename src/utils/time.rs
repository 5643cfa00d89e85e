use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

/// This is the standard way of converting a date to a string in dev-activity.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar day of a moment as seen in `tz`.
pub fn day_in<Tz: TimeZone>(moment: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    moment.with_timezone(tz).date_naive()
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month after the one `date` belongs to.
pub fn next_month_start(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

    use super::{date_key, day_in, month_start, next_month_start};

    #[test]
    fn test_day_in_respects_timezone() {
        let moment = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        let east = FixedOffset::east_opt(2 * 3600).unwrap();

        assert_eq!(day_in(moment, &Utc), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(day_in(moment, &east), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn test_month_boundaries() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 17).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(
            next_month_start(date),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(date_key(date), "2023-12-17");
    }
}
