use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn defaults_apply_without_file_or_env() {
    assert_eq!(settings_from_sources(None, no_env), SessionSettings::default());
}

#[test]
fn file_values_override_defaults() {
    let raw = r#"
dispatch_queue_capacity = 64
poll_retry_base_ms = "250"
log_filter = "client_core=debug"
"#;
    let settings = settings_from_sources(Some(raw), no_env);
    assert_eq!(settings.dispatch_queue_capacity, 64);
    assert_eq!(settings.poll_retry_base_ms, 250);
    assert_eq!(settings.poll_retry_max_ms, 30_000);
    assert_eq!(settings.log_filter, "client_core=debug");
}

#[test]
fn env_overrides_file() {
    let raw = "poll_retry_max_ms = 1000\n";
    let settings = settings_from_sources(Some(raw), |key| {
        (key == "APP__POLL_RETRY_MAX_MS").then(|| "5000".to_string())
    });
    assert_eq!(settings.poll_retry_max_ms, 5000);
}

#[test]
fn unparseable_values_keep_the_previous_value() {
    let raw = "dispatch_queue_capacity = \"lots\"\n";
    let settings = settings_from_sources(Some(raw), |key| {
        (key == "APP__DISPATCH_QUEUE_CAPACITY").then(|| "0".to_string())
    });
    assert_eq!(settings.dispatch_queue_capacity, 256);
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let settings = settings_from_sources(Some("this is = = not toml"), no_env);
    assert_eq!(settings, SessionSettings::default());
}

#[test]
fn retry_max_never_drops_below_base() {
    let settings = SessionSettings {
        poll_retry_base_ms: 2000,
        poll_retry_max_ms: 100,
        ..SessionSettings::default()
    };
    assert_eq!(settings.poll_retry_max(), Duration::from_millis(2000));
}
