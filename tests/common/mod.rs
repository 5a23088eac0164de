#![allow(dead_code)]
use chrono::NaiveDate;
use creneaux::{
    Collection, Document, DocumentStore, Filter, FixedClock, LessonDraft, MemoryStore,
    Scheduler, SessionContext, StoreError, Stored,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn day() -> NaiveDate {
    // samedi
    NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
}

pub fn clock() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2025, 2, 14).unwrap().and_hms_opt(8, 0, 0).unwrap())
}

pub fn admin() -> SessionContext {
    SessionContext::administrator("admin@ecole.fr")
}

pub fn scheduler() -> Scheduler<CountingStore, FixedClock> {
    Scheduler::with_clock(CountingStore::default(), clock())
}

pub fn group_draft(room: &str, teacher: &str, start: &str, end: &str) -> LessonDraft {
    LessonDraft {
        subject: "piano".into(),
        teacher: teacher.into(),
        group: Some("g1".into()),
        student: None,
        room: room.into(),
        date: day(),
        time_start: start.into(),
        time_end: end.into(),
    }
}

pub fn student_draft(room: &str, teacher: &str, start: &str, end: &str) -> LessonDraft {
    LessonDraft {
        group: None,
        student: Some("eleve@ecole.fr".into()),
        ..group_draft(room, teacher, start, end)
    }
}

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Écrit directement un cours de groupe sous un identifiant connu.
pub fn put_lesson<S: DocumentStore>(store: &S, id: &str, room: &str, teacher: &str, start: &str, end: &str) {
    store
        .put(
            Collection::Lessons,
            id,
            doc(json!({
                "subjectId": "piano",
                "teacherId": teacher,
                "groupId": "g1",
                "roomId": room,
                "date": "2025-02-15",
                "timeStart": start,
                "timeEnd": end,
            })),
        )
        .unwrap();
}

/// Stockage mémoire qui compte les écritures.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl DocumentStore for CountingStore {
    fn query(&self, collection: Collection, filters: &[Filter]) -> Result<Vec<Stored>, StoreError> {
        self.inner.query(collection, filters)
    }

    fn create(&self, collection: Collection, doc: Document) -> Result<String, StoreError> {
        self.wrote();
        self.inner.create(collection, doc)
    }

    fn put(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError> {
        self.wrote();
        self.inner.put(collection, id, doc)
    }

    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        self.wrote();
        self.inner.update(collection, id, patch)
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id)
    }
}
