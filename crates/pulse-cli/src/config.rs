use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use pulse_core::error::CoreError;
use pulse_core::models::{DashboardConfig, DEFAULT_TEAMS};
use pulse_core::timezone::validate_timezone;
use serde::Deserialize;
use std::time::Duration;

pub const CONFIG_FILE: &str = "pulse.toml";

/// Ten years; longer warning windows are almost certainly typos.
pub const MAX_WARNING_WINDOW_DAYS: i64 = 3650;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Http,
}

/// Where tasks and projects live
#[derive(Deserialize, Debug, Clone)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Sheet API URL; required for the `http` backend
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            database_path: default_database_path(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DashboardSettings {
    #[serde(default = "default_warning_window")]
    pub warning_window_days: i64,
    /// Also reset an owner selection that no longer matches anything
    #[serde(default)]
    pub reset_owner: bool,
    /// IANA zone that decides what "today" is
    #[serde(default = "detect_system_timezone")]
    pub timezone: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            warning_window_days: default_warning_window(),
            reset_owner: false,
            timezone: detect_system_timezone(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    /// Acting user, overridable with `--as`
    pub user_email: Option<String>,
    #[serde(default = "default_teams")]
    pub teams: Vec<String>,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_path() -> String {
    "pulse.db".to_string()
}

fn default_timeout_secs() -> u64 {
    pulse_core::repository::http::DEFAULT_TIMEOUT_SECS
}

fn default_warning_window() -> i64 {
    10
}

fn default_teams() -> Vec<String> {
    DEFAULT_TEAMS.iter().map(|t| t.to_string()).collect()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("PULSE_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    /// Checks settings that would otherwise fail later, mid-command.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.backend.kind == BackendKind::Http
            && self.backend.endpoint.as_deref().map_or(true, |e| e.trim().is_empty())
        {
            return Err(CoreError::Configuration(
                "backend.kind is 'http' but backend.endpoint is not set".to_string(),
            ));
        }
        if self.teams.is_empty() {
            return Err(CoreError::Configuration("at least one team must be configured".to_string()));
        }
        if !(0..=MAX_WARNING_WINDOW_DAYS).contains(&self.dashboard.warning_window_days) {
            return Err(CoreError::Configuration(format!(
                "dashboard.warning_window_days must be between 0 and {}",
                MAX_WARNING_WINDOW_DAYS
            )));
        }
        validate_timezone(&self.dashboard.timezone)?;
        Ok(())
    }

    pub fn dashboard(&self) -> DashboardConfig {
        DashboardConfig {
            teams: self.teams.clone(),
            warning_window_days: self.dashboard.warning_window_days,
            reset_owner: self.dashboard.reset_owner,
        }
    }
}

/// Detects the system timezone, falling back to UTC if detection fails
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(local_tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&local_tz).is_ok() {
            return local_tz;
        }
    }

    "UTC".to_string()
}
