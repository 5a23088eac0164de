#![forbid(unsafe_code)]
mod common;

use common::{admin, clock, group_draft};
use creneaux::{JsonStorage, ScheduleInput, SchedError, Scheduler};
use tempfile::tempdir;

#[test]
fn lessons_survive_reopening_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("creneaux.json");

    let id = {
        let s = Scheduler::with_clock(JsonStorage::open(&path).unwrap(), clock());
        s.schedule_lesson(&admin(), ScheduleInput::create(group_draft("r1", "t1@ecole.fr", "09:00", "10:00")))
            .unwrap()
    };

    let s = Scheduler::with_clock(JsonStorage::open(&path).unwrap(), clock());
    assert_eq!(s.repository().lesson(&id).unwrap().room.as_str(), "r1");
    let err = s
        .schedule_lesson(&admin(), ScheduleInput::create(group_draft("r1", "t2@ecole.fr", "09:15", "09:45")))
        .unwrap_err();
    assert!(matches!(err, SchedError::RoomConflict { .. }));
}

#[test]
fn missing_file_is_an_empty_store() {
    let dir = tempdir().unwrap();
    let store = JsonStorage::open(dir.path().join("absent.json")).unwrap();
    let s = Scheduler::with_clock(store, clock());
    assert!(s.repository().all_lessons().unwrap().is_empty());
    assert!(!dir.path().join("absent.json").exists());
}

#[test]
fn corrupted_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = JsonStorage::open(&path).unwrap_err();
    assert!(err.to_string().starts_with("parsing "));
}

#[test]
fn file_holds_documents_by_collection() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("creneaux.json");
    let s = Scheduler::with_clock(JsonStorage::open(&path).unwrap(), clock());
    let room = s.repository().create_room("Salle 1", None).unwrap();

    let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(raw["rooms"][room.as_str()]["name"], "Salle 1");
}
