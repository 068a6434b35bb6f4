use std::{collections::HashMap, fs, path::Path, time::Duration};

use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "session.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionSettings {
    pub dispatch_queue_capacity: usize,
    pub poll_retry_base_ms: u64,
    pub poll_retry_max_ms: u64,
    pub log_filter: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            dispatch_queue_capacity: 256,
            poll_retry_base_ms: 500,
            poll_retry_max_ms: 30_000,
            log_filter: "info".into(),
        }
    }
}

impl SessionSettings {
    pub fn poll_retry_base(&self) -> Duration {
        Duration::from_millis(self.poll_retry_base_ms)
    }

    pub fn poll_retry_max(&self) -> Duration {
        Duration::from_millis(self.poll_retry_max_ms.max(self.poll_retry_base_ms))
    }
}

pub fn load_settings() -> SessionSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> SessionSettings {
    let raw = fs::read_to_string(path).ok();
    settings_from_sources(raw.as_deref(), |key| std::env::var(key).ok())
}

pub fn settings_from_sources(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> SessionSettings {
    let mut settings = SessionSettings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => {
                for (key, value) in &file_cfg {
                    let value = match value {
                        toml::Value::String(v) => v.clone(),
                        other => other.to_string(),
                    };
                    apply_override(&mut settings, key, &value);
                }
            }
            Err(err) => tracing::warn!(%err, "ignoring unparseable session settings file"),
        }
    }

    for key in [
        "dispatch_queue_capacity",
        "poll_retry_base_ms",
        "poll_retry_max_ms",
        "log_filter",
    ] {
        if let Some(value) = env(&format!("APP__{}", key.to_ascii_uppercase())) {
            apply_override(&mut settings, key, &value);
        }
    }

    settings
}

fn apply_override(settings: &mut SessionSettings, key: &str, value: &str) {
    match key {
        "dispatch_queue_capacity" => {
            if let Ok(parsed) = value.parse::<usize>() {
                if parsed > 0 {
                    settings.dispatch_queue_capacity = parsed;
                }
            }
        }
        "poll_retry_base_ms" => {
            if let Ok(parsed) = value.parse() {
                settings.poll_retry_base_ms = parsed;
            }
        }
        "poll_retry_max_ms" => {
            if let Ok(parsed) = value.parse() {
                settings.poll_retry_max_ms = parsed;
            }
        }
        "log_filter" => settings.log_filter = value.to_string(),
        _ => tracing::debug!(key, "unknown session setting"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
