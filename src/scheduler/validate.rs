//! Étapes de validation exécutées avant tout accès en écriture.

use super::{Field, LessonDraft, SchedError};
use crate::hours::WorkingHours;
use crate::model::{Audience, GroupId, RoomId, SessionContext, SubjectId, UserId};
use crate::time::{Interval, TimeError, TimeOfDay};
use chrono::{NaiveDate, NaiveDateTime};

/// Sélecteurs validés d'un brouillon.
pub(super) struct Selectors {
    pub subject: SubjectId,
    pub teacher: UserId,
    pub audience: Audience,
    pub room: RoomId,
}

pub(super) fn ensure_administrator(session: &SessionContext) -> Result<(), SchedError> {
    if session.is_administrator() {
        Ok(())
    } else {
        Err(SchedError::NotPermitted)
    }
}

fn present(value: &str, field: Field) -> Result<&str, SchedError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SchedError::MissingField(field));
    }
    Ok(value)
}

fn optional(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

pub(super) fn check_fields(draft: &LessonDraft) -> Result<Selectors, SchedError> {
    let subject = present(&draft.subject, Field::Subject)?;
    let teacher = present(&draft.teacher, Field::Teacher)?;
    let audience = match (optional(draft.group.as_ref()), optional(draft.student.as_ref())) {
        (Some(group), None) => Audience::Group(GroupId::new(group)),
        (None, Some(student)) => Audience::Student(UserId::new(student)),
        _ => return Err(SchedError::MissingField(Field::Audience)),
    };
    let room = present(&draft.room, Field::Room)?;
    Ok(Selectors {
        subject: SubjectId::new(subject),
        teacher: UserId::new(teacher),
        audience,
        room: RoomId::new(room),
    })
}

pub(super) fn check_times(draft: &LessonDraft) -> Result<Interval, SchedError> {
    let start = TimeOfDay::parse(&draft.time_start)
        .map_err(|_| SchedError::InvalidTimeFormat(draft.time_start.clone()))?;
    let end = TimeOfDay::parse(&draft.time_end)
        .map_err(|_| SchedError::InvalidTimeFormat(draft.time_end.clone()))?;
    Interval::new(start, end).map_err(|err| match err {
        TimeError::InvalidRange { start, end } => SchedError::InvalidTimeRange { start, end },
        TimeError::InvalidFormat(raw) => SchedError::InvalidTimeFormat(raw),
    })
}

pub(super) fn check_working_hours(
    hours: &WorkingHours,
    date: NaiveDate,
    slot: &Interval,
) -> Result<(), SchedError> {
    if hours.allows(date, slot) {
        Ok(())
    } else {
        Err(SchedError::OutsideWorkingHours { date, slot: *slot })
    }
}

/// Refuse un jour déjà passé, ou un créneau d'aujourd'hui dont le début ou la
/// fin précède l'heure courante (à la seconde près).
pub(super) fn check_not_past(now: NaiveDateTime, date: NaiveDate, slot: &Interval) -> Result<(), SchedError> {
    let today = now.date();
    let past = if date < today {
        true
    } else if date == today {
        let elapsed = |t: TimeOfDay| t.to_naive_time() < now.time();
        elapsed(slot.start()) || elapsed(slot.end())
    } else {
        false
    };
    if past {
        Err(SchedError::PastTime { date, slot: *slot })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: &str, end: &str) -> Interval {
        Interval::parse(start, end).unwrap()
    }

    fn draft() -> LessonDraft {
        LessonDraft {
            subject: "piano".into(),
            teacher: "Prof@Ecole.fr".into(),
            group: Some("g1".into()),
            student: None,
            room: "r1".into(),
            date: NaiveDate::from_ymd_opt(2025, 2, 15).unwrap(),
            time_start: "09:00".into(),
            time_end: "10:00".into(),
        }
    }

    #[test]
    fn audience_must_be_exactly_one() {
        let mut both = draft();
        both.student = Some("eleve@ecole.fr".into());
        assert!(matches!(
            check_fields(&both),
            Err(SchedError::MissingField(Field::Audience))
        ));

        let mut neither = draft();
        neither.group = Some("  ".into());
        assert!(matches!(
            check_fields(&neither),
            Err(SchedError::MissingField(Field::Audience))
        ));
    }

    #[test]
    fn first_missing_selector_is_reported() {
        let mut d = draft();
        d.teacher.clear();
        d.room.clear();
        assert!(matches!(
            check_fields(&d),
            Err(SchedError::MissingField(Field::Teacher))
        ));
    }

    #[test]
    fn teacher_email_is_normalised() {
        assert_eq!(check_fields(&draft()).unwrap().teacher.as_str(), "prof@ecole.fr");
    }

    #[test]
    fn empty_time_is_a_format_error() {
        let mut d = draft();
        d.time_end.clear();
        assert!(matches!(check_times(&d), Err(SchedError::InvalidTimeFormat(_))));
    }

    #[test]
    fn past_gate_uses_wall_clock_on_same_day() {
        let day = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        let now = day.and_hms_opt(9, 30, 0).unwrap();
        assert!(check_not_past(now, day, &iv("09:00", "10:00")).is_err());
        assert!(check_not_past(now, day, &iv("09:30", "10:00")).is_ok());
        let later = day.and_hms_opt(9, 30, 30).unwrap();
        assert!(check_not_past(later, day, &iv("09:30", "10:00")).is_err());
        assert!(check_not_past(now, day.pred_opt().unwrap(), &iv("11:00", "12:00")).is_err());
        assert!(check_not_past(now, day.succ_opt().unwrap(), &iv("07:00", "08:00")).is_ok());
    }
}
