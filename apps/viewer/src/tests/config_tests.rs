use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("river_viewer_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("viewer.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_yields_defaults() {
    let settings = load_settings_with_env(Path::new("/nonexistent/viewer.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.api_endpoint, "https://geoglows.ecmwf.int/api/v2");
    assert_eq!(settings.animation(), AnimationConfig::default());
    assert!(settings.auto_load_forecast);
    assert!(!settings.auto_load_retrospective);
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        r#"
api_endpoint = "http://localhost:9000/api"
animate_speed_ms = 250
steps_per_day = 24
auto_load_retrospective = true
"#,
    );

    let settings = load_settings_with_env(&path, no_env);
    assert_eq!(settings.api_endpoint, "http://localhost:9000/api");
    assert_eq!(settings.animation().animate_speed, Duration::from_millis(250));
    assert_eq!(settings.animation().step_count(), Ok(240));
    assert!(settings.session().auto_load_retrospective);
    assert_eq!(settings.layer_url, DEFAULT_LAYER_URL);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn environment_overrides_file_and_skips_bad_values() {
    let path = temp_config("duration_days = 5\nuse_local_time = false\n");
    let env: HashMap<&str, &str> = HashMap::from([
        ("APP__DURATION_DAYS", "3"),
        ("APP__USE_LOCAL_TIME", "yes"),
        ("APP__STEPS_PER_DAY", "many"),
        ("VIEWER_API_ENDPOINT", "http://legacy"),
        ("APP__API_ENDPOINT", "http://preferred"),
    ]);

    let settings = load_settings_with_env(&path, |key| env.get(key).map(|v| v.to_string()));
    assert_eq!(settings.duration_days, 3);
    assert!(settings.use_local_time);
    assert_eq!(settings.steps_per_day, 8);
    assert_eq!(settings.api_endpoint, "http://preferred");

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn unparsable_file_is_ignored() {
    let path = temp_config("duration_days = \"ten\"\n");
    assert_eq!(load_settings_with_env(&path, no_env), Settings::default());
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}
