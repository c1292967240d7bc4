use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub session_token: Option<String>,
    pub operator_id: i64,
    pub operator_name: String,
    pub page_size: usize,
    pub viewport_width: u32,
    pub bootstrap_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/api/".into(),
            session_token: None,
            operator_id: 1,
            operator_name: "admin".into(),
            page_size: 10,
            viewport_width: 1280,
            bootstrap_timeout_secs: 10,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_url: Option<String>,
    session_token: Option<String>,
    operator_id: Option<i64>,
    operator_name: Option<String>,
    page_size: Option<usize>,
    viewport_width: Option<u32>,
    bootstrap_timeout_secs: Option<u64>,
    log_filter: Option<String>,
}

/// Defaults, then the config file, then environment overrides. An explicit
/// `config_path` must exist; the default file is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    if required || path.exists() {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg = parse_file_settings(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        apply_file_settings(&mut settings, file_cfg);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.api_url = normalize_api_url(&settings.api_url);
    Ok(settings)
}

fn parse_file_settings(raw: &str) -> anyhow::Result<FileSettings> {
    Ok(toml::from_str(raw)?)
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if file_cfg.session_token.is_some() {
        settings.session_token = file_cfg.session_token;
    }
    if let Some(v) = file_cfg.operator_id {
        settings.operator_id = v;
    }
    if let Some(v) = file_cfg.operator_name {
        settings.operator_name = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.viewport_width {
        settings.viewport_width = v;
    }
    if let Some(v) = file_cfg.bootstrap_timeout_secs {
        settings.bootstrap_timeout_secs = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("CONSOLE_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("APP__SESSION_TOKEN") {
        settings.session_token = Some(v).filter(|token| !token.trim().is_empty());
    }

    if let Some(v) = lookup("APP__OPERATOR_ID") {
        if let Ok(parsed) = v.parse::<i64>() {
            settings.operator_id = parsed;
        }
    }
    if let Some(v) = lookup("APP__OPERATOR_NAME") {
        settings.operator_name = v;
    }

    if let Some(v) = lookup("APP__PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.page_size = parsed;
        }
    }
    if let Some(v) = lookup("APP__VIEWPORT_WIDTH") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.viewport_width = parsed;
        }
    }
    if let Some(v) = lookup("APP__BOOTSTRAP_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.bootstrap_timeout_secs = parsed;
        }
    }

    if let Some(v) = lookup("RUST_LOG") {
        settings.log_filter = v;
    }
}

/// Endpoint paths are joined relative to the api url, so it must end in `/`.
pub fn normalize_api_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Settings::default().api_url;
    }
    if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
