use crate::auth::reset::ResetRequestMap;
use crate::auth::session::SessionMap;
use crate::config::AppConfig;
use crate::store::JsonStore;
use crate::timesheet::calendar::HolidayCalendar;
use crate::timesheet::rows::{ClockPolicy, FixedClock, RandomizedClock};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub config: Arc<AppConfig>,
    pub holidays: Arc<HolidayCalendar>,
    pub sessions: Arc<Mutex<SessionMap>>,
    pub reset_requests: Arc<Mutex<ResetRequestMap>>,
    pub clock: Arc<dyn ClockPolicy>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Arc::new(JsonStore::open(&config.data_dir)?);
        let holidays = Arc::new(load_holidays(&config)?);

        Ok(Self {
            store,
            config,
            holidays,
            sessions: Arc::new(Mutex::new(SessionMap::new())),
            reset_requests: Arc::new(Mutex::new(ResetRequestMap::new())),
            clock: Arc::new(RandomizedClock),
        })
    }

    /// In-memory flavour for handler tests: store rooted at a temp dir,
    /// deterministic clock times, the stock holiday table.
    pub fn fake(data_dir: &Path) -> Self {
        let config = Arc::new(AppConfig {
            data_dir: data_dir.to_path_buf(),
            company_name: "Aideas".into(),
            work_location: "ABB Southfield".into(),
            manager_name: "Nikhil M".into(),
            manager_email: "manager@example.com".into(),
            mail_cc: Vec::new(),
            logo_path: None,
            holidays_file: None,
            admin: crate::config::AdminSeed {
                employee_id: "100269".into(),
                name: "Admin".into(),
                email: "admin@example.com".into(),
                password: "admin".into(),
            },
            reset_request_ttl_hours: 24,
        });
        let store = Arc::new(JsonStore::open(data_dir).expect("store in temp dir"));

        Self {
            store,
            config,
            holidays: Arc::new(HolidayCalendar::with_defaults()),
            sessions: Arc::new(Mutex::new(SessionMap::new())),
            reset_requests: Arc::new(Mutex::new(ResetRequestMap::new())),
            clock: Arc::new(FixedClock {
                start_minutes: 540,
                duration_minutes: 540,
            }),
        }
    }
}

/// Stock holiday table, with the configured overlay file merged on top when
/// one is set. A configured-but-unreadable file is a startup error rather
/// than a silent fallback.
fn load_holidays(config: &AppConfig) -> anyhow::Result<HolidayCalendar> {
    let mut calendar = HolidayCalendar::with_defaults();
    let path = match &config.holidays_file {
        Some(path) => path,
        None => return Ok(calendar),
    };

    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading holidays file {}: {e}", path.display()))?;
    let overlay: BTreeMap<i32, BTreeMap<String, String>> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("parsing holidays file {}: {e}", path.display()))?;

    for (year, days) in overlay {
        for (date, name) in days {
            calendar.insert(year, &date, &name);
        }
    }
    Ok(calendar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_state_seeds_a_deterministic_clock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());

        let date = time::Date::from_calendar_date(2025, time::Month::January, 2).expect("date");
        let class = crate::timesheet::calendar::DayClass::Workday {
            location: crate::timesheet::calendar::WorkLocation::Office,
        };
        let first = state.clock.times(date, &class);
        let second = state.clock.times(date, &class);
        assert_eq!(first, second);
        assert_eq!(first.time_in, "09:00");
    }
}
