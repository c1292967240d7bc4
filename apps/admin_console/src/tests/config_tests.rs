use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn normalizes_api_url_trailing_slash() {
    assert_eq!(
        normalize_api_url("https://clinic.example/api"),
        "https://clinic.example/api/"
    );
    assert_eq!(
        normalize_api_url(" https://clinic.example/api/ "),
        "https://clinic.example/api/"
    );
    assert_eq!(normalize_api_url(""), Settings::default().api_url);
}

#[test]
fn file_values_override_defaults() {
    let file_cfg = parse_file_settings(
        r#"
api_url = "https://clinic.example/api"
session_token = "abc"
page_size = 25
viewport_width = 400
"#,
    )
    .expect("parse");
    let mut settings = Settings::default();
    apply_file_settings(&mut settings, file_cfg);

    assert_eq!(settings.api_url, "https://clinic.example/api");
    assert_eq!(settings.session_token.as_deref(), Some("abc"));
    assert_eq!(settings.page_size, 25);
    assert_eq!(settings.viewport_width, 400);
    assert_eq!(settings.operator_name, "admin");
}

#[test]
fn rejects_unknown_file_keys() {
    assert!(parse_file_settings("bind_addr = \"0.0.0.0\"").is_err());
}

#[test]
fn env_overrides_win_and_ignore_unparseable_numbers() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        lookup_from(&[
            ("CONSOLE_API_URL", "http://a/"),
            ("APP__API_URL", "http://b/"),
            ("APP__SESSION_TOKEN", "tok"),
            ("APP__PAGE_SIZE", "not-a-number"),
            ("APP__BOOTSTRAP_TIMEOUT_SECS", "3"),
            ("RUST_LOG", "debug"),
        ]),
    );

    assert_eq!(settings.api_url, "http://b/");
    assert_eq!(settings.session_token.as_deref(), Some("tok"));
    assert_eq!(settings.page_size, 10);
    assert_eq!(settings.bootstrap_timeout_secs, 3);
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn blank_session_token_clears_session() {
    let mut settings = Settings {
        session_token: Some("from-file".into()),
        ..Settings::default()
    };
    apply_env_overrides(&mut settings, lookup_from(&[("APP__SESSION_TOKEN", "  ")]));
    assert_eq!(settings.session_token, None);
}

#[test]
fn explicit_missing_config_file_is_an_error() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let missing = env::temp_dir().join(format!("admin_console_missing_{suffix}.toml"));

    let err = load_settings(Some(&missing)).expect_err("missing file");
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn loads_explicit_config_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("admin_console_config_{suffix}.toml"));
    fs::write(&path, "operator_name = \"maria\"\npage_size = 5\n").expect("write config");

    let settings = load_settings(Some(&path)).expect("load");
    assert_eq!(settings.operator_name, "maria");
    assert!(settings.api_url.ends_with('/'));

    fs::remove_file(path).expect("cleanup");
}
