use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, Month};

use super::calendar::{self, DayClass, HolidayCalendar, LeaveKind, WorkLocation};

pub const MAX_PROJECTS: usize = 10;

/// Clock strings printed for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTimes {
    pub time_in: String,
    pub time_out: String,
    pub hours: String,
}

impl RowTimes {
    /// The fixed strings holiday, weekend and leave rows carry.
    pub fn placeholder() -> Self {
        Self {
            time_in: "9:00".to_string(),
            time_out: "18:00".to_string(),
            hours: "9:00".to_string(),
        }
    }

    pub fn from_minutes(start: u32, duration: u32) -> Self {
        let end = start + duration;
        Self {
            time_in: format!("{:02}:{:02}", start / 60, start % 60),
            time_out: format!("{:02}:{:02}", end / 60, end % 60),
            hours: format!("{}:{:02}", duration / 60, duration % 60),
        }
    }
}

/// Where a row's clock times come from. The sheet does not record real
/// attendance; the default policy draws plausible placeholder times. Swapping
/// the policy is the seam for feeding tracked times in later.
pub trait ClockPolicy: Send + Sync {
    fn times(&self, date: Date, class: &DayClass) -> RowTimes;
}

/// Clock-in 09:00 plus up to 70 minutes, shift length 9h00m to 9h30m.
pub struct RandomizedClock;

impl ClockPolicy for RandomizedClock {
    fn times(&self, _date: Date, class: &DayClass) -> RowTimes {
        match class {
            DayClass::Workday { .. } => {
                let mut rng = rand::thread_rng();
                let start = 9 * 60 + rng.gen_range(0..=70);
                let duration = rng.gen_range(540..=570);
                RowTimes::from_minutes(start, duration)
            }
            _ => RowTimes::placeholder(),
        }
    }
}

/// Deterministic policy used by tests.
pub struct FixedClock {
    pub start_minutes: u32,
    pub duration_minutes: u32,
}

impl ClockPolicy for FixedClock {
    fn times(&self, _date: Date, class: &DayClass) -> RowTimes {
        match class {
            DayClass::Workday { .. } => {
                RowTimes::from_minutes(self.start_minutes, self.duration_minutes)
            }
            _ => RowTimes::placeholder(),
        }
    }
}

/// One line of the sheet; one per calendar day of the month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimesheetRow {
    pub date: String,
    pub time_in: String,
    pub time_out: String,
    pub hours: String,
    /// "WFO", "WFH", or empty on holiday/weekend/leave rows.
    pub work_location: String,
    pub description: String,
    pub class: DayClass,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("month must be between 1 and 12, got {0}")]
    BadMonth(u8),
    #[error("invalid date {0:?}, expected MM/DD/YYYY")]
    BadDate(String),
    #[error("{0} is outside the selected month")]
    OutsideMonth(String),
    #[error("{0} falls on a weekend or holiday and cannot be selected")]
    NotAvailable(String),
    #[error("{0} is selected for more than one of WFH, sick leave and earned leave")]
    Overlap(String),
    #[error("at least one project description is required")]
    NoProjects,
    #[error("at most {MAX_PROJECTS} project descriptions are allowed")]
    TooManyProjects,
}

/// Validated month selection. Building this performs every input check up
/// front so row generation cannot half-fail.
#[derive(Debug, Clone)]
pub struct SheetParams {
    pub year: i32,
    pub month: Month,
    pub projects: Vec<String>,
    pub leaves: BTreeMap<Date, LeaveKind>,
    pub wfh: BTreeSet<Date>,
    pub overrides: BTreeMap<Date, String>,
}

impl SheetParams {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        year: i32,
        month: u8,
        projects: &[String],
        wfh_dates: &[String],
        sick_dates: &[String],
        earned_dates: &[String],
        overrides: &BTreeMap<String, String>,
        holidays: &HolidayCalendar,
    ) -> Result<Self, ParamError> {
        let month = Month::try_from(month).map_err(|_| ParamError::BadMonth(month))?;

        let projects: Vec<String> = projects
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if projects.is_empty() {
            return Err(ParamError::NoProjects);
        }
        if projects.len() > MAX_PROJECTS {
            return Err(ParamError::TooManyProjects);
        }

        let parse_selected = |raw: &[String]| -> Result<BTreeSet<Date>, ParamError> {
            let mut dates = BTreeSet::new();
            for s in raw {
                let date =
                    calendar::parse_date(s).map_err(|_| ParamError::BadDate(s.clone()))?;
                if date.year() != year || date.month() != month {
                    return Err(ParamError::OutsideMonth(s.clone()));
                }
                if calendar::is_weekend(date) || holidays.is_holiday(date) {
                    return Err(ParamError::NotAvailable(s.clone()));
                }
                dates.insert(date);
            }
            Ok(dates)
        };

        let wfh = parse_selected(wfh_dates)?;
        let sick = parse_selected(sick_dates)?;
        let earned = parse_selected(earned_dates)?;

        if let Some(dup) = sick.intersection(&earned).next() {
            return Err(ParamError::Overlap(calendar::format_date(*dup)));
        }
        let mut leaves = BTreeMap::new();
        for d in &sick {
            leaves.insert(*d, LeaveKind::Sick);
        }
        for d in &earned {
            leaves.insert(*d, LeaveKind::Earned);
        }
        if let Some(dup) = wfh.iter().find(|d| leaves.contains_key(d)) {
            return Err(ParamError::Overlap(calendar::format_date(*dup)));
        }

        let mut parsed_overrides = BTreeMap::new();
        for (s, text) in overrides {
            let date = calendar::parse_date(s).map_err(|_| ParamError::BadDate(s.clone()))?;
            if date.year() != year || date.month() != month {
                return Err(ParamError::OutsideMonth(s.clone()));
            }
            parsed_overrides.insert(date, text.clone());
        }

        Ok(Self {
            year,
            month,
            projects,
            leaves,
            wfh,
            overrides: parsed_overrides,
        })
    }

    /// The default job description: the project list as numbered lines.
    pub fn default_description(&self) -> String {
        self.projects
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {}", i + 1, p))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Produce one row per calendar day of the selected month. Overrides only
/// touch workday rows; holiday, weekend and leave rows always print their
/// label.
pub fn generate(
    params: &SheetParams,
    holidays: &HolidayCalendar,
    clock: &dyn ClockPolicy,
) -> Vec<TimesheetRow> {
    let default_description = params.default_description();
    calendar::month_days(params.year, params.month)
        .into_iter()
        .map(|date| {
            let class = calendar::classify(date, holidays, &params.leaves, &params.wfh);
            let times = clock.times(date, &class);
            let (work_location, description) = match &class {
                DayClass::Workday { location } => {
                    let description = params
                        .overrides
                        .get(&date)
                        .cloned()
                        .unwrap_or_else(|| default_description.clone());
                    (location.label().to_string(), description)
                }
                DayClass::Holiday { name } => (String::new(), name.clone()),
                DayClass::Leave { leave } => (String::new(), leave.label().to_string()),
                DayClass::Weekend => (String::new(), "Week Off".to_string()),
            };
            TimesheetRow {
                date: calendar::format_date(date),
                time_in: times.time_in,
                time_out: times.time_out,
                hours: times.hours,
                work_location,
                description,
                class,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub working_days: u32,
    pub wfo_days: u32,
    pub wfh_days: u32,
    pub sick_days: u32,
    pub earned_days: u32,
}

pub fn summarize(rows: &[TimesheetRow]) -> Summary {
    rows.iter().fold(Summary::default(), |mut summary, row| {
        match &row.class {
            DayClass::Workday { location } => {
                summary.working_days += 1;
                match location {
                    WorkLocation::Office => summary.wfo_days += 1,
                    WorkLocation::Home => summary.wfh_days += 1,
                }
            }
            DayClass::Leave {
                leave: LeaveKind::Sick,
            } => summary.sick_days += 1,
            DayClass::Leave {
                leave: LeaveKind::Earned,
            } => summary.earned_days += 1,
            DayClass::Holiday { .. } | DayClass::Weekend => {}
        }
        summary
    })
}
