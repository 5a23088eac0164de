use crate::model::{Audience, Lesson, LessonId, RoomId, UserId};
use crate::repository::RepoError;
use crate::storage::StoreError;
use crate::time::{Interval, TimeOfDay};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Options de planification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleOptions {
    /// Applique les horaires d'ouverture aussi à la création (toujours appliqués en modification).
    pub enforce_working_hours_on_create: bool,
    /// Vérifie aussi le professeur à la création (toujours vérifié en modification).
    pub check_teacher_on_create: bool,
    /// Ne propose que les professeurs dont le compte est confirmé.
    pub require_confirmed_teacher: bool,
    /// Attente maximale d'un créneau verrouillé par une autre planification.
    #[serde(rename = "lock_timeout_ms", with = "millis")]
    pub lock_timeout: Duration,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            enforce_working_hours_on_create: true,
            check_teacher_on_create: true,
            require_confirmed_teacher: false,
            lock_timeout: Duration::from_secs(5),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictAxis {
    Room,
    Teacher,
}

impl fmt::Display for ConflictAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictAxis::Room => "room",
            ConflictAxis::Teacher => "teacher",
        })
    }
}

/// Cours candidat soumis au contrôle de conflits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub room: RoomId,
    pub teacher: Option<UserId>,
    pub date: NaiveDate,
    pub slot: Interval,
    /// Cours en cours de modification, ignoré lors du contrôle.
    pub exclude: Option<LessonId>,
}

/// Paire de cours en chevauchement trouvée par l'audit du planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub axis: ConflictAxis,
    pub date: NaiveDate,
    /// Salle ou professeur disputé.
    pub resource: String,
    pub lesson_a: LessonId,
    pub lesson_b: LessonId,
    pub overlap_minutes: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Subject,
    Teacher,
    Audience,
    Room,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Subject => "subject",
            Field::Teacher => "teacher",
            Field::Audience => "group or student (exactly one)",
            Field::Room => "room",
        })
    }
}

/// Saisie brute d'un formulaire de cours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub subject: String,
    pub teacher: String,
    pub group: Option<String>,
    pub student: Option<String>,
    pub room: String,
    pub date: NaiveDate,
    pub time_start: String,
    pub time_end: String,
}

impl From<&Lesson> for LessonDraft {
    fn from(lesson: &Lesson) -> Self {
        let (group, student) = match &lesson.audience {
            Audience::Group(g) => (Some(g.to_string()), None),
            Audience::Student(s) => (None, Some(s.to_string())),
        };
        let time = |t: Option<TimeOfDay>| t.map(|t| t.to_string()).unwrap_or_default();
        Self {
            subject: lesson.subject.to_string(),
            teacher: lesson.teacher.to_string(),
            group,
            student,
            room: lesson.room.to_string(),
            date: lesson.date,
            time_start: time(lesson.time_start),
            time_end: time(lesson.time_end),
        }
    }
}

/// Demande de création (`editing = None`) ou de modification d'un cours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleInput {
    pub draft: LessonDraft,
    pub editing: Option<LessonId>,
}

impl ScheduleInput {
    pub fn create(draft: LessonDraft) -> Self {
        Self {
            draft,
            editing: None,
        }
    }

    pub fn edit(id: LessonId, draft: LessonDraft) -> Self {
        Self {
            draft,
            editing: Some(id),
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("not permitted: only administrators can change lessons")]
    NotPermitted,
    #[error("missing field: {0}")]
    MissingField(Field),
    #[error("invalid time format: {0:?} (expected HH:MM)")]
    InvalidTimeFormat(String),
    #[error("invalid time range: {start}-{end} (end must be after start)")]
    InvalidTimeRange { start: TimeOfDay, end: TimeOfDay },
    #[error("{slot} on {date} ({}) is outside working hours", .date.weekday())]
    OutsideWorkingHours { date: NaiveDate, slot: Interval },
    #[error("{slot} on {date} is already in the past")]
    PastTime { date: NaiveDate, slot: Interval },
    #[error("room {room} is already booked {slot} on {date} (lesson {lesson})")]
    RoomConflict {
        room: RoomId,
        date: NaiveDate,
        slot: Interval,
        lesson: LessonId,
    },
    #[error("teacher {teacher} already teaches {slot} on {date} (lesson {lesson})")]
    TeacherConflict {
        teacher: UserId,
        date: NaiveDate,
        slot: Interval,
        lesson: LessonId,
    },
    #[error("schedule busy ({0}), try again")]
    Busy(String),
    #[error(transparent)]
    Repository(#[from] RepoError),
}

impl SchedError {
    /// Erreurs transitoires : la même demande peut réussir plus tard.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SchedError::Busy(_) | SchedError::Repository(RepoError::Store(StoreError::Unavailable(_)))
        )
    }
}
