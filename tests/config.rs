#![forbid(unsafe_code)]
use creneaux::{Config, WorkingHours};
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn partial_file_keeps_defaults() {
    let config: Config =
        serde_json::from_str(r#"{"schedule":{"check_teacher_on_create":false}}"#).unwrap();
    assert!(!config.schedule.check_teacher_on_create);
    assert!(config.schedule.enforce_working_hours_on_create);
    assert_eq!(config.schedule.lock_timeout, Duration::from_secs(5));
    assert_eq!(config.working_hours, WorkingHours::default());
}

#[test]
fn lock_timeout_is_read_in_milliseconds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("creneaux.config.json");
    std::fs::write(&path, r#"{"schedule":{"lock_timeout_ms":250}}"#).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.schedule.lock_timeout, Duration::from_millis(250));
    assert!(Config::load(dir.path().join("absent.json")).is_err());
}
