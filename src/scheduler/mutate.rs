use super::locks::SlotKey;
use super::{conflicts, validate, Candidate, ConflictAxis, SchedError, ScheduleInput, Scheduler};
use crate::clock::Clock;
use crate::model::{LessonId, LessonStatus, SessionContext};
use crate::repository::LessonFields;
use crate::storage::DocumentStore;
use tracing::{debug, info};

pub(super) fn schedule_lesson<S: DocumentStore, C: Clock>(
    scheduler: &Scheduler<S, C>,
    session: &SessionContext,
    input: ScheduleInput,
) -> Result<LessonId, SchedError> {
    validate::ensure_administrator(session)?;

    let ScheduleInput { draft, editing } = input;
    let selectors = validate::check_fields(&draft)?;
    let slot = validate::check_times(&draft)?;
    let date = draft.date;
    let is_edit = editing.is_some();

    if is_edit || scheduler.opts.enforce_working_hours_on_create {
        validate::check_working_hours(&scheduler.hours, date, &slot)?;
    }
    validate::check_not_past(scheduler.clock.now(), date, &slot)?;

    let prior = match &editing {
        Some(id) => Some(scheduler.repo.lesson(id)?),
        None => None,
    };

    let check_teacher = is_edit || scheduler.opts.check_teacher_on_create;
    let mut keys = vec![SlotKey::Room(selectors.room.clone(), date)];
    if check_teacher {
        keys.push(SlotKey::Teacher(selectors.teacher.clone(), date));
    }
    // contrôle et écriture sous le même verrou
    let _guard = scheduler.locks.acquire(keys, scheduler.opts.lock_timeout)?;

    let candidate = Candidate {
        room: selectors.room.clone(),
        teacher: Some(selectors.teacher.clone()),
        date,
        slot,
        exclude: editing.clone(),
    };
    if let Some(hit) = conflicts::find_conflict(&scheduler.repo, &candidate, ConflictAxis::Room)? {
        debug!(lesson = %hit.id, room = %candidate.room, %date, "room conflict");
        return Err(SchedError::RoomConflict {
            room: candidate.room,
            date,
            slot: hit.interval().unwrap_or(slot),
            lesson: hit.id,
        });
    }
    if check_teacher {
        if let Some(hit) = conflicts::find_conflict(&scheduler.repo, &candidate, ConflictAxis::Teacher)? {
            debug!(lesson = %hit.id, teacher = %selectors.teacher, %date, "teacher conflict");
            return Err(SchedError::TeacherConflict {
                teacher: selectors.teacher,
                date,
                slot: hit.interval().unwrap_or(slot),
                lesson: hit.id,
            });
        }
    }

    let rescheduled = prior.as_ref().is_some_and(|p| {
        p.date != date || p.time_start != Some(slot.start()) || p.time_end != Some(slot.end())
    });
    let status = (rescheduled && selectors.audience.is_individual())
        .then_some(LessonStatus::AwaitingConfirmation);

    let fields = LessonFields {
        subject: selectors.subject,
        teacher: selectors.teacher,
        audience: selectors.audience,
        room: selectors.room,
        date,
        slot,
        status,
    };

    match editing {
        Some(id) => {
            scheduler.repo.update_lesson(&id, &fields)?;
            info!(lesson = %id, room = %fields.room, %date, %slot, rescheduled, "lesson updated");
            Ok(id)
        }
        None => {
            let id = scheduler.repo.create_lesson(&fields)?;
            info!(lesson = %id, room = %fields.room, %date, %slot, "lesson created");
            Ok(id)
        }
    }
}

/// Confirme (`true`) ou annule (`false`) un cours ; seule `confirmed` change.
pub(super) fn set_confirmed<S: DocumentStore, C: Clock>(
    scheduler: &Scheduler<S, C>,
    session: &SessionContext,
    id: &LessonId,
    confirmed: bool,
) -> Result<(), SchedError> {
    validate::ensure_administrator(session)?;
    scheduler.repo.set_confirmed(id, confirmed)?;
    info!(lesson = %id, confirmed, by = %session.user, "lesson confirmation changed");
    Ok(())
}
