use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::timesheet::rows::{Summary, TimesheetRow};

/// Everything a sheet is built from. Dates use the MM/DD/YYYY form the sheet
/// itself shows.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetRequest {
    pub year: i32,
    pub month: u8,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub wfh_dates: Vec<String>,
    #[serde(default)]
    pub sick_leave_dates: Vec<String>,
    #[serde(default)]
    pub earned_leave_dates: Vec<String>,
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub rows: Vec<TimesheetRow>,
    pub summary: Summary,
}

/// PDF export. `rows` round-trips the output of generate so the clock times
/// the user previewed are the ones printed; when absent the sheet is
/// generated fresh. Images are base64, with or without a data URL prefix.
#[derive(Debug, Deserialize)]
pub struct PdfRequest {
    #[serde(flatten)]
    pub sheet: SheetRequest,
    #[serde(default)]
    pub rows: Option<Vec<TimesheetRow>>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct MailRequest {
    #[serde(flatten)]
    pub sheet: SheetRequest,
    #[serde(default)]
    pub rows: Option<Vec<TimesheetRow>>,
    #[serde(default)]
    pub has_screenshots: bool,
}

/// Month facts the frontend date pickers are built from.
#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u8,
    pub month_name: String,
    pub holidays: Vec<HolidayEntry>,
    pub weekends: Vec<String>,
    pub available: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HolidayEntry {
    pub date: String,
    pub name: String,
}
