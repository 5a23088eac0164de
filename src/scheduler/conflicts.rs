use super::{Candidate, Conflict, ConflictAxis};
use crate::model::Lesson;
use crate::repository::{LessonKey, RepoError, Repository};
use crate::storage::DocumentStore;
use crate::time::Interval;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Premier cours existant qui chevauche le candidat sur l'axe demandé.
///
/// Le cours exclu (modification) et les cours sans heures exploitables sont
/// ignorés.
pub(super) fn find_conflict<S: DocumentStore>(
    repo: &Repository<S>,
    candidate: &Candidate,
    axis: ConflictAxis,
) -> Result<Option<Lesson>, RepoError> {
    let key = match axis {
        ConflictAxis::Room => LessonKey::Room(&candidate.room),
        ConflictAxis::Teacher => match &candidate.teacher {
            Some(teacher) => LessonKey::Teacher(teacher),
            None => return Ok(None),
        },
    };

    let existing = repo.lessons_where(candidate.date, key)?;
    Ok(existing.into_iter().find(|lesson| {
        if candidate.exclude.as_ref() == Some(&lesson.id) {
            return false;
        }
        lesson
            .interval()
            .is_some_and(|slot| slot.overlaps(&candidate.slot))
    }))
}

/// Audit du planning stocké : toutes les paires en chevauchement par
/// `(date, salle)` puis par `(date, professeur)`.
pub(super) fn detect_conflicts<S: DocumentStore>(repo: &Repository<S>) -> Result<Vec<Conflict>, RepoError> {
    let lessons = repo.all_lessons()?;

    let mut by_room: BTreeMap<(NaiveDate, &str), Vec<(&Lesson, Interval)>> = BTreeMap::new();
    let mut by_teacher: BTreeMap<(NaiveDate, &str), Vec<(&Lesson, Interval)>> = BTreeMap::new();
    for lesson in &lessons {
        let Some(slot) = lesson.interval() else {
            continue;
        };
        by_room
            .entry((lesson.date, lesson.room.as_str()))
            .or_default()
            .push((lesson, slot));
        by_teacher
            .entry((lesson.date, lesson.teacher.as_str()))
            .or_default()
            .push((lesson, slot));
    }

    let mut out = Vec::new();
    for (axis, groups) in [(ConflictAxis::Room, by_room), (ConflictAxis::Teacher, by_teacher)] {
        for ((date, resource), mut slots) in groups {
            slots.sort_by_key(|(_, slot)| slot.start());
            for (idx, (a, slot_a)) in slots.iter().enumerate() {
                for (b, slot_b) in slots.iter().skip(idx + 1) {
                    if !slot_a.overlaps(slot_b) {
                        continue;
                    }
                    out.push(Conflict {
                        axis,
                        date,
                        resource: resource.to_string(),
                        lesson_a: a.id.clone(),
                        lesson_b: b.id.clone(),
                        overlap_minutes: overlap_minutes(slot_a, slot_b),
                    });
                }
            }
        }
    }

    Ok(out)
}

fn overlap_minutes(a: &Interval, b: &Interval) -> u16 {
    let start = a.start().max(b.start());
    let end = a.end().min(b.end());
    end.minutes().saturating_sub(start.minutes())
}
