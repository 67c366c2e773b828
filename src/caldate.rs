//! Calendar helpers: month boundaries, financial years, and time-zone-aware
//! "today". Adapted from the teacher's `converter::timeformat` helpers, which
//! did unchecked `DateTime::from_timestamp(..).unwrap()` conversions for a
//! backtesting clock that never saw invalid timestamps; here the inputs are
//! configuration-driven so we propagate instead of unwrapping.

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;

/// Returns "today" as a calendar date in `tz`, used as the terminal date for
/// every "until today" filter and report window.
pub fn today_in(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// First day of the calendar month containing `date`.
pub fn month_begin(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("valid year/month always has a 1st")
}

/// Last day of the calendar month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .expect("valid next month always has a 1st")
        .pred_opt()
        .expect("day before the 1st always exists")
}

/// First day of the next calendar month after the one containing `date`.
pub fn next_month_begin(date: NaiveDate) -> NaiveDate {
    month_end(date)
        .succ_opt()
        .expect("day after month end always exists")
}

/// `n` calendar months back from `date`, clamped to the last valid day of
/// the destination month (e.g. Mar 31 minus 1 month -> Feb 28/29).
pub fn months_before(date: NaiveDate, n: u32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 - n as i32;
    while month <= 0 {
        month += 12;
        year -= 1;
    }
    let month = month as u32;
    let last_day = month_end(NaiveDate::from_ymd_opt(year, month, 1).expect("valid month"))
        .day();
    NaiveDate::from_ymd_opt(year, month, date.day().min(last_day)).expect("clamped day is valid")
}

/// The financial year starting month (1-12) containing `date`, and the first
/// day of that financial year. `starting_month` is spec.md §6's
/// `financial_year_starting_month` (default 4, i.e. April).
pub fn financial_year_begin(date: NaiveDate, starting_month: u32) -> NaiveDate {
    let year = if date.month() >= starting_month {
        date.year()
    } else {
        date.year() - 1
    };
    NaiveDate::from_ymd_opt(year, starting_month, 1).expect("valid financial year start")
}

/// An iterator over the first day of every calendar month in `[start, end]`
/// inclusive of the month containing `end`. Used by every monthly
/// accumulator (cash flow, budget).
pub fn month_starts(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let mut cursor = month_begin(start);
    let end_month = month_begin(end);
    while cursor <= end_month {
        months.push(cursor);
        cursor = next_month_begin(cursor);
    }
    months
}
