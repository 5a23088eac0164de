#![forbid(unsafe_code)]
mod common;

use common::doc;
use creneaux::{Collection, Document, DocumentStore, Filter, MemoryStore, StoreError};
use serde_json::json;

#[test]
fn query_is_conjunctive_equality() {
    let store = MemoryStore::new();
    store
        .create(Collection::Lessons, doc(json!({"date": "2025-02-15", "roomId": "r1"})))
        .unwrap();
    store
        .create(Collection::Lessons, doc(json!({"date": "2025-02-15", "roomId": "r2"})))
        .unwrap();
    store
        .create(Collection::Lessons, doc(json!({"date": "2025-02-16", "roomId": "r1"})))
        .unwrap();

    let hits = store
        .query(
            Collection::Lessons,
            &[Filter::eq("date", "2025-02-15"), Filter::eq("roomId", "r1")],
        )
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(store.query(Collection::Lessons, &[]).unwrap().len(), 3);
    assert!(store.query(Collection::Rooms, &[]).unwrap().is_empty());
}

#[test]
fn update_merges_and_null_removes() {
    let store = MemoryStore::new();
    let id = store
        .create(Collection::Lessons, doc(json!({"groupId": "g1", "roomId": "r1"})))
        .unwrap();
    store
        .update(
            Collection::Lessons,
            &id,
            doc(json!({"groupId": null, "studentId": "a@b.c"})),
        )
        .unwrap();
    let stored = store.get(Collection::Lessons, &id).unwrap().unwrap();
    assert_eq!(stored, doc(json!({"roomId": "r1", "studentId": "a@b.c"})));
}

#[test]
fn update_of_missing_document_is_not_found() {
    let store = MemoryStore::new();
    let err = store
        .update(Collection::Lessons, "nope", Document::new())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(err.to_string(), "lessons/nope not found");
}
