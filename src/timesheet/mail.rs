//! Builds the pre-filled approval mail as a `mailto:` link. Nothing is sent
//! from the server; the user's own mail client opens the draft.

use time::Month;
use urlencoding::encode;

use super::calendar;
use super::rows::Summary;

pub struct MailParams<'a> {
    pub recipient: &'a str,
    pub cc: &'a [String],
    pub company: &'a str,
    pub manager: &'a str,
    pub year: i32,
    pub month: Month,
    pub summary: Summary,
    pub has_screenshots: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MailDraft {
    pub subject: String,
    pub body: String,
    pub mailto: String,
}

pub fn compose(params: &MailParams) -> MailDraft {
    let month_name = calendar::month_name(params.month);
    let subject = format!(
        "{} || Approval for Timesheet || {}-{}",
        params.company, month_name, params.year
    );
    let attachment_note = if params.has_screenshots {
        " with screenshots"
    } else {
        ""
    };
    let summary = &params.summary;
    let body = format!(
        "Dear {manager},\n\
         \n\
         As per above mentioned I am submitting my timesheet for {month} - {year} and kindly request your approval.\n\
         \n\
         Please find attached my completed timesheet{attachment_note}.\n\
         \n\
         I have carefully recorded all my work hours, including:\n\
         1. Work From Office (WFO) days: {wfo} Days\n\
         2. Work From Home (WFH) days: {wfh} Days\n\
         3. Sick Leave taken: {sick} Days\n\
         4. Earned Leave taken: {earned} Days\n\
         \n\
         Total Working Days: {working} Days\n\
         \n\
         I have ensured that all project work is accurately reflected in the timesheet.",
        manager = params.manager,
        month = month_name,
        year = params.year,
        wfo = summary.wfo_days,
        wfh = summary.wfh_days,
        sick = summary.sick_days,
        earned = summary.earned_days,
        working = summary.working_days,
    );

    let mut mailto = format!("mailto:{}?subject={}", params.recipient, encode(&subject));
    if !params.cc.is_empty() {
        mailto.push_str("&cc=");
        mailto.push_str(&encode(&params.cc.join("; ")));
    }
    mailto.push_str("&body=");
    mailto.push_str(&encode(&body));

    MailDraft {
        subject,
        body,
        mailto,
    }
}
