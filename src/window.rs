// Time Window Resolver
//
// Pure calendar arithmetic. "Now" is always passed in so renders and tests
// can pin the clock; nothing in here reads the wall clock.

use chrono::{DateTime, Datelike, Duration, LocalResult, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

/// Current calendar month in the application timezone, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthWindow {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    /// First instant of `first_day` in the application timezone
    pub start: DateTime<Utc>,
    /// Last millisecond of `last_day` in the application timezone
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    pub fn days_in_month(&self) -> u32 {
        self.last_day.day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day && date <= self.last_day
    }
}

/// Every boundary the fetch stage needs for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindows {
    pub now: DateTime<Utc>,
    /// Calendar date of `now` in the application timezone
    pub today: NaiveDate,
    pub month: MonthWindow,
    /// Lower bound of the trailing window; the upper bound is `now`
    pub trailing_start: DateTime<Utc>,
}

impl TimeWindows {
    /// Resolve the month window and the trailing window for `now`.
    ///
    /// The calendar (which month, where midnight falls) is the one of `now`'s
    /// timezone, so pass `Utc::now().with_timezone(&tz)` for an application zone.
    pub fn resolve<Tz: TimeZone>(now: &DateTime<Tz>, trailing_days: u32) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();

        let first_day = today - Duration::days(i64::from(today.day0()));
        // only fails at the very end of chrono's calendar
        let next_first = first_day
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        let last_day = next_first.pred_opt().unwrap_or(next_first);

        let start = start_of_day(&tz, first_day);
        let end = start_of_day(&tz, next_first) - Duration::milliseconds(1);

        let now_utc = now.with_timezone(&Utc);

        TimeWindows {
            now: now_utc,
            today,
            month: MonthWindow {
                first_day,
                last_day,
                start,
                end,
            },
            trailing_start: now_utc - Duration::days(i64::from(trailing_days)),
        }
    }

    pub fn day_of_month(&self) -> u32 {
        self.today.day()
    }

    pub fn days_remaining(&self) -> u32 {
        self.month.days_in_month() - self.day_of_month()
    }
}

/// Midnight of `date` in `tz`; a DST gap at midnight moves to the first valid instant.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            // Midnight skipped by a DST jump: walk forward an hour at a time
            let mut candidate = midnight;
            for _ in 0..24 {
                candidate += Duration::hours(1);
                if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
                    return dt.with_timezone(&Utc);
                }
            }
            Utc.from_utc_datetime(&midnight)
        }
    }
}
