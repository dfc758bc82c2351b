use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use time::Month;
use tracing::{info, instrument, warn};

use crate::{auth::session::AuthSession, state::AppState, users::repo as users_repo};

use super::dto::{
    CalendarResponse, GenerateResponse, HolidayEntry, MailRequest, PdfRequest, SheetRequest,
};
use super::mail::{self, MailParams};
use super::pdf::{self, EmployeeInfo, SheetPdf};
use super::rows::{generate, summarize, SheetParams, TimesheetRow};
use super::{calendar, images};

// --- public routers ---

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/timesheet/calendar/:year/:month", get(calendar_info))
        .route("/timesheet/generate", post(generate_sheet))
        .route("/timesheet/pdf", post(export_pdf))
        .route("/timesheet/mail", post(mail_draft))
}

// --- handlers ---

#[instrument(skip(state, _auth))]
pub async fn calendar_info(
    State(state): State<AppState>,
    _auth: AuthSession,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<Json<CalendarResponse>, (StatusCode, String)> {
    let parsed = Month::try_from(month).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("month must be between 1 and 12, got {month}"),
        )
    })?;

    let holidays = state
        .holidays
        .holidays_in_month(year, parsed)
        .into_iter()
        .map(|(date, name)| HolidayEntry { date, name })
        .collect();
    let weekends = calendar::weekend_dates(year, parsed)
        .into_iter()
        .map(calendar::format_date)
        .collect();
    let available = calendar::available_dates(year, parsed, &state.holidays)
        .into_iter()
        .map(calendar::format_date)
        .collect();

    Ok(Json(CalendarResponse {
        year,
        month,
        month_name: calendar::month_name(parsed).to_string(),
        holidays,
        weekends,
        available,
    }))
}

#[instrument(skip(state, _auth, payload))]
pub async fn generate_sheet(
    State(state): State<AppState>,
    _auth: AuthSession,
    Json(payload): Json<SheetRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    let params = build_params(&payload, &state)?;
    let rows = generate(&params, &state.holidays, state.clock.as_ref());
    let summary = summarize(&rows);

    Ok(Json(GenerateResponse { rows, summary }))
}

#[instrument(skip(state, auth, payload))]
pub async fn export_pdf(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<PdfRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, (StatusCode, String)> {
    let params = build_params(&payload.sheet, &state)?;
    let rows = resolve_rows(payload.rows, &params, &state);

    let users = users_repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    let user = match users.get(&auth.employee_id) {
        Some(user) => user,
        None => return Err((StatusCode::UNAUTHORIZED, "invalid or expired session".into())),
    };

    let logo = load_logo(&state);
    let signature = match &payload.signature {
        Some(data) => Some(embed_upload(data, "signature")?),
        None => None,
    };
    let screenshots = payload
        .screenshots
        .iter()
        .enumerate()
        .map(|(index, data)| embed_upload(data, &format!("screenshot {}", index + 1)))
        .collect::<Result<Vec<_>, _>>()?;

    let sheet = SheetPdf {
        employee: EmployeeInfo {
            name: user.name.clone(),
            id: auth.employee_id.clone(),
            location: state.config.work_location.clone(),
            manager: state.config.manager_name.clone(),
        },
        year: params.year,
        month: params.month,
        rows,
        logo,
        signature,
        screenshots,
    };

    let filename = pdf::filename(&auth.employee_id, &user.name, params.year, params.month);
    let bytes = pdf::render(sheet).map_err(internal)?;

    info!(
        employee_id = %auth.employee_id,
        %filename,
        bytes = bytes.len(),
        "timesheet pdf exported"
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}

#[instrument(skip(state, _auth, payload))]
pub async fn mail_draft(
    State(state): State<AppState>,
    _auth: AuthSession,
    Json(payload): Json<MailRequest>,
) -> Result<Json<mail::MailDraft>, (StatusCode, String)> {
    let params = build_params(&payload.sheet, &state)?;
    let rows = resolve_rows(payload.rows, &params, &state);
    let summary = summarize(&rows);

    let draft = mail::compose(&MailParams {
        recipient: &state.config.manager_email,
        cc: &state.config.mail_cc,
        company: &state.config.company_name,
        manager: &state.config.manager_name,
        year: params.year,
        month: params.month,
        summary,
        has_screenshots: payload.has_screenshots,
    });

    Ok(Json(draft))
}

// --- helpers ---

fn build_params(payload: &SheetRequest, state: &AppState) -> Result<SheetParams, (StatusCode, String)> {
    SheetParams::build(
        payload.year,
        payload.month,
        &payload.projects,
        &payload.wfh_dates,
        &payload.sick_leave_dates,
        &payload.earned_leave_dates,
        &payload.overrides,
        &state.holidays,
    )
    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

/// Rows previewed by the client win over a fresh generation, so the clock
/// times in the PDF match what the user saw.
fn resolve_rows(
    submitted: Option<Vec<TimesheetRow>>,
    params: &SheetParams,
    state: &AppState,
) -> Vec<TimesheetRow> {
    match submitted {
        Some(rows) if !rows.is_empty() => rows,
        _ => generate(params, &state.holidays, state.clock.as_ref()),
    }
}

fn load_logo(state: &AppState) -> Option<images::EmbeddedImage> {
    let path = state.config.logo_path.as_ref()?;
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "logo file unreadable, exporting without it");
            return None;
        }
    };
    match images::embed(&bytes) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "logo not embeddable, exporting without it");
            None
        }
    }
}

fn embed_upload(data: &str, what: &str) -> Result<images::EmbeddedImage, (StatusCode, String)> {
    let bytes = images::decode_base64(data)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("{what}: {e}")))?;
    images::embed(&bytes).map_err(|e| (StatusCode::BAD_REQUEST, format!("{what}: {e}")))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
