//! US market trading calendar.
//!
//! Weekends plus the NYSE full-closure holidays, computed by rule so no
//! lookup table needs refreshing each year. Saturday holidays are observed
//! the Friday before and Sunday holidays the Monday after, except New
//! Year's Day, which is not observed when it falls on a Saturday.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_holiday(date: NaiveDate) -> bool {
    us_market_holidays(date.year()).contains(&date)
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    !is_weekend(date) && !is_holiday(date)
}

/// Full-closure NYSE holidays for a year, sorted.
pub fn us_market_holidays(year: i32) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(10);

    // New Year's Day: a Saturday Jan 1 is simply not observed.
    let new_year = ymd(year, 1, 1);
    match new_year.weekday() {
        Weekday::Sat => {}
        Weekday::Sun => days.push(new_year + Duration::days(1)),
        _ => days.push(new_year),
    }

    days.push(nth_weekday(year, 1, Weekday::Mon, 3)); // Martin Luther King Jr. Day
    days.push(nth_weekday(year, 2, Weekday::Mon, 3)); // Washington's Birthday
    days.push(easter_sunday(year) - Duration::days(2)); // Good Friday
    days.push(last_weekday(year, 5, 31, Weekday::Mon)); // Memorial Day
    days.push(observed(ymd(year, 6, 19))); // Juneteenth
    days.push(observed(ymd(year, 7, 4))); // Independence Day
    days.push(nth_weekday(year, 9, Weekday::Mon, 1)); // Labor Day
    days.push(nth_weekday(year, 11, Weekday::Thu, 4)); // Thanksgiving
    days.push(observed(ymd(year, 12, 25))); // Christmas

    days.sort();
    days
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Static month/day combinations, always valid.
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> NaiveDate {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n).unwrap()
}

fn last_weekday(year: i32, month: u32, last_day: u32, weekday: Weekday) -> NaiveDate {
    let end = ymd(year, month, last_day);
    let back = (7 + end.weekday().num_days_from_monday()
        - weekday.num_days_from_monday())
        % 7;
    end - Duration::days(back as i64)
}

/// Gregorian Easter (anonymous computus).
fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    ymd(year, month as u32, day as u32)
}
