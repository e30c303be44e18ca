use std::{fs, path::Path, time::Duration};

use animation::AnimationConfig;
use client_core::{SessionSettings, DEFAULT_API_ENDPOINT};
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_LAYER_URL: &str =
    "https://livefeeds3.arcgis.com/arcgis/rest/services/GEOGLOWS/GlobalWaterModel_Medium/MapServer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_endpoint: String,
    pub layer_url: String,
    pub animate_speed_ms: u64,
    pub duration_days: u32,
    pub steps_per_day: u32,
    pub auto_load_forecast: bool,
    pub auto_load_retrospective: bool,
    pub use_local_time: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let animation = AnimationConfig::default();
        let session = SessionSettings::default();
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.into(),
            layer_url: DEFAULT_LAYER_URL.into(),
            animate_speed_ms: animation.animate_speed.as_millis() as u64,
            duration_days: animation.duration_days,
            steps_per_day: animation.steps_per_day,
            auto_load_forecast: session.auto_load_forecast,
            auto_load_retrospective: session.auto_load_retrospective,
            use_local_time: false,
        }
    }
}

impl Settings {
    pub fn animation(&self) -> AnimationConfig {
        AnimationConfig {
            duration_days: self.duration_days,
            steps_per_day: self.steps_per_day,
            animate_speed: Duration::from_millis(self.animate_speed_ms),
        }
    }

    pub fn session(&self) -> SessionSettings {
        SessionSettings {
            auto_load_forecast: self.auto_load_forecast,
            auto_load_retrospective: self.auto_load_retrospective,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_endpoint: Option<String>,
    layer_url: Option<String>,
    animate_speed_ms: Option<u64>,
    duration_days: Option<u32>,
    steps_per_day: Option<u32>,
    auto_load_forecast: Option<bool>,
    auto_load_retrospective: Option<bool>,
    use_local_time: Option<bool>,
}

pub fn load_settings(path: &Path) -> Settings {
    load_settings_with_env(path, |key| std::env::var(key).ok())
}

/// Defaults, then the optional TOML file, then `APP__*` environment variables.
pub fn load_settings_with_env(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => warn!(path = %path.display(), %error, "ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("VIEWER_API_ENDPOINT") {
        settings.api_endpoint = v;
    }
    if let Some(v) = env("APP__API_ENDPOINT") {
        settings.api_endpoint = v;
    }
    if let Some(v) = env("APP__LAYER_URL") {
        settings.layer_url = v;
    }
    if let Some(v) = parsed_env(&env, "APP__ANIMATE_SPEED_MS", str::parse::<u64>) {
        settings.animate_speed_ms = v;
    }
    if let Some(v) = parsed_env(&env, "APP__DURATION_DAYS", str::parse::<u32>) {
        settings.duration_days = v;
    }
    if let Some(v) = parsed_env(&env, "APP__STEPS_PER_DAY", str::parse::<u32>) {
        settings.steps_per_day = v;
    }
    if let Some(v) = parsed_env(&env, "APP__AUTO_LOAD_FORECAST", parse_flag) {
        settings.auto_load_forecast = v;
    }
    if let Some(v) = parsed_env(&env, "APP__AUTO_LOAD_RETROSPECTIVE", parse_flag) {
        settings.auto_load_retrospective = v;
    }
    if let Some(v) = parsed_env(&env, "APP__USE_LOCAL_TIME", parse_flag) {
        settings.use_local_time = v;
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_endpoint {
        settings.api_endpoint = v;
    }
    if let Some(v) = file_cfg.layer_url {
        settings.layer_url = v;
    }
    if let Some(v) = file_cfg.animate_speed_ms {
        settings.animate_speed_ms = v;
    }
    if let Some(v) = file_cfg.duration_days {
        settings.duration_days = v;
    }
    if let Some(v) = file_cfg.steps_per_day {
        settings.steps_per_day = v;
    }
    if let Some(v) = file_cfg.auto_load_forecast {
        settings.auto_load_forecast = v;
    }
    if let Some(v) = file_cfg.auto_load_retrospective {
        settings.auto_load_retrospective = v;
    }
    if let Some(v) = file_cfg.use_local_time {
        settings.use_local_time = v;
    }
}

fn parsed_env<T, E>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Option<T> {
    let raw = env(key)?;
    match parse(raw.trim()) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Result<bool, ()> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(()),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
