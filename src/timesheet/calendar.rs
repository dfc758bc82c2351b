use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, Month, Weekday};

/// Dates are exchanged and stored as `MM/DD/YYYY`, matching the JSON files
/// and the table the PDF prints.
pub fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s, format_description!("[month]/[day]/[year]"))
}

pub fn format_date(date: Date) -> String {
    format!("{:02}/{:02}/{}", date.month() as u8, date.day(), date.year())
}

pub fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}

/// Every calendar day of the month, in order.
pub fn month_days(year: i32, month: Month) -> Vec<Date> {
    (1..=31)
        .filter_map(|day| Date::from_calendar_date(year, month, day).ok())
        .collect()
}

pub fn is_weekend(date: Date) -> bool {
    matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday)
}

pub fn weekend_dates(year: i32, month: Month) -> Vec<Date> {
    month_days(year, month)
        .into_iter()
        .filter(|d| is_weekend(*d))
        .collect()
}

/// Company holidays keyed by year, then by `MM/DD/YYYY`. Injectable from a
/// JSON file so the table is not frozen to one calendar year; years without
/// an entry simply have no holidays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolidayCalendar(BTreeMap<i32, BTreeMap<String, String>>);

impl HolidayCalendar {
    /// The built-in 2025 table the service ships with.
    pub fn with_defaults() -> Self {
        let mut calendar = Self::default();
        for (date, name) in [
            ("01/01/2025", "New Year"),
            ("01/14/2025", "Makara sankranti"),
            ("02/26/2025", "Maha Shivaratri"),
            ("05/01/2025", "May Day"),
            ("08/15/2025", "Independence Day"),
            ("08/27/2025", "Ganesh Chaturthi"),
            ("09/05/2025", "Eid -E- Milad"),
            ("10/01/2025", "Ayudha Pooja"),
            ("10/02/2025", "Gandhi Jayanthi"),
            ("10/22/2025", "Deepavali"),
            ("12/25/2025", "Christmas"),
        ] {
            calendar.insert(2025, date, name);
        }
        calendar
    }

    pub fn insert(&mut self, year: i32, date: &str, name: &str) {
        self.0
            .entry(year)
            .or_default()
            .insert(date.to_string(), name.to_string());
    }

    pub fn holiday_name(&self, date: Date) -> Option<&str> {
        self.0
            .get(&date.year())?
            .get(&format_date(date))
            .map(String::as_str)
    }

    pub fn is_holiday(&self, date: Date) -> bool {
        self.holiday_name(date).is_some()
    }

    /// Holidays falling inside the given month, keyed by formatted date.
    pub fn holidays_in_month(&self, year: i32, month: Month) -> BTreeMap<String, String> {
        month_days(year, month)
            .into_iter()
            .filter_map(|d| {
                self.holiday_name(d)
                    .map(|name| (format_date(d), name.to_string()))
            })
            .collect()
    }
}

/// Days an employee can pick for WFH or leave: weekdays that are not company
/// holidays.
pub fn available_dates(year: i32, month: Month, holidays: &HolidayCalendar) -> Vec<Date> {
    month_days(year, month)
        .into_iter()
        .filter(|d| !is_weekend(*d) && !holidays.is_holiday(*d))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveKind {
    Sick,
    Earned,
}

impl LeaveKind {
    pub fn label(self) -> &'static str {
        match self {
            LeaveKind::Sick => "Sick Leave",
            LeaveKind::Earned => "Earned Leave",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkLocation {
    Office,
    Home,
}

impl WorkLocation {
    pub fn label(self) -> &'static str {
        match self {
            WorkLocation::Office => "WFO",
            WorkLocation::Home => "WFH",
        }
    }
}

/// How a single day is treated on the sheet. A date gets exactly one
/// classification; precedence is holiday, then leave, then weekend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayClass {
    Holiday { name: String },
    Leave { leave: LeaveKind },
    Weekend,
    Workday { location: WorkLocation },
}

pub fn classify(
    date: Date,
    holidays: &HolidayCalendar,
    leaves: &BTreeMap<Date, LeaveKind>,
    wfh: &BTreeSet<Date>,
) -> DayClass {
    if let Some(name) = holidays.holiday_name(date) {
        return DayClass::Holiday {
            name: name.to_string(),
        };
    }
    if let Some(kind) = leaves.get(&date) {
        return DayClass::Leave { leave: *kind };
    }
    if is_weekend(date) {
        return DayClass::Weekend;
    }
    let location = if wfh.contains(&date) {
        WorkLocation::Home
    } else {
        WorkLocation::Office
    };
    DayClass::Workday { location }
}
