//! Chaîne de sélection dépendante : matière → professeur → groupe/élève → salle.
//!
//! Chaque étape n'est ouverte que si la précédente est choisie, et toute
//! modification en amont efface les choix et les listes d'options en aval.

use crate::model::{Audience, Group, Room, RoomId, Subject, SubjectId, User, UserId};
use crate::repository::{RepoError, Repository};
use crate::scheduler::LessonDraft;
use crate::storage::DocumentStore;
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Subject,
    Teacher,
    Audience,
    Room,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Subject => "subject",
            Step::Teacher => "teacher",
            Step::Audience => "group or student",
            Step::Room => "room",
        })
    }
}

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("choose a {0} first")]
    Locked(Step),
    #[error("{value} is not an available {step}")]
    NotOffered { step: Step, value: String },
    #[error(transparent)]
    Repository(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct SelectionChain {
    confirmed_teachers_only: bool,
    subject: Option<SubjectId>,
    teacher: Option<UserId>,
    audience: Option<Audience>,
    room: Option<RoomId>,
    subjects: Vec<Subject>,
    teachers: Vec<User>,
    groups: Vec<Group>,
    students: Vec<User>,
    rooms: Vec<Room>,
}

impl SelectionChain {
    /// Ouvre la chaîne avec la liste des matières.
    pub fn load<S: DocumentStore>(
        repo: &Repository<S>,
        confirmed_teachers_only: bool,
    ) -> Result<Self, RepoError> {
        Ok(Self {
            confirmed_teachers_only,
            subjects: repo.subjects()?,
            ..Self::default()
        })
    }

    pub fn subject(&self) -> Option<&SubjectId> {
        self.subject.as_ref()
    }
    pub fn teacher(&self) -> Option<&UserId> {
        self.teacher.as_ref()
    }
    pub fn audience(&self) -> Option<&Audience> {
        self.audience.as_ref()
    }
    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }
    pub fn teachers(&self) -> &[User] {
        &self.teachers
    }
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }
    pub fn students(&self) -> &[User] {
        &self.students
    }
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Efface `step` et tout ce qui en dépend (choix et options).
    fn clear_from(&mut self, step: Step) {
        if step <= Step::Subject {
            self.subject = None;
            self.teachers.clear();
        }
        if step <= Step::Teacher {
            self.teacher = None;
            self.groups.clear();
            self.students.clear();
        }
        if step <= Step::Audience {
            self.audience = None;
            self.rooms.clear();
        }
        self.room = None;
    }

    fn require(&self, step: Step) -> Result<(), SelectionError> {
        let chosen = match step {
            Step::Subject => self.subject.is_some(),
            Step::Teacher => self.teacher.is_some(),
            Step::Audience => self.audience.is_some(),
            Step::Room => self.room.is_some(),
        };
        if chosen {
            Ok(())
        } else {
            Err(SelectionError::Locked(step))
        }
    }

    pub fn select_subject<S: DocumentStore>(
        &mut self,
        repo: &Repository<S>,
        subject: Option<SubjectId>,
    ) -> Result<(), SelectionError> {
        if let Some(id) = &subject {
            if !self.subjects.iter().any(|s| &s.id == id) {
                return Err(not_offered(Step::Subject, id));
            }
        }
        self.clear_from(Step::Subject);
        if let Some(id) = subject {
            self.teachers = repo.teachers_for(&id, self.confirmed_teachers_only)?;
            self.subject = Some(id);
        }
        Ok(())
    }

    pub fn select_teacher<S: DocumentStore>(
        &mut self,
        repo: &Repository<S>,
        teacher: Option<UserId>,
    ) -> Result<(), SelectionError> {
        self.require(Step::Subject)?;
        if let Some(id) = &teacher {
            if !self.teachers.iter().any(|t| &t.id == id) {
                return Err(not_offered(Step::Teacher, id));
            }
        }
        self.clear_from(Step::Teacher);
        if let Some(id) = teacher {
            self.groups = repo.groups()?;
            self.students = repo.students()?;
            self.teacher = Some(id);
        }
        Ok(())
    }

    pub fn select_audience<S: DocumentStore>(
        &mut self,
        repo: &Repository<S>,
        audience: Option<Audience>,
    ) -> Result<(), SelectionError> {
        self.require(Step::Teacher)?;
        match &audience {
            Some(Audience::Group(id)) if !self.groups.iter().any(|g| &g.id == id) => {
                return Err(not_offered(Step::Audience, id));
            }
            Some(Audience::Student(id)) if !self.students.iter().any(|s| &s.id == id) => {
                return Err(not_offered(Step::Audience, id));
            }
            _ => {}
        }
        self.clear_from(Step::Audience);
        if let Some(audience) = audience {
            self.rooms = repo.rooms()?;
            self.audience = Some(audience);
        }
        Ok(())
    }

    pub fn select_room(&mut self, room: Option<RoomId>) -> Result<(), SelectionError> {
        self.require(Step::Audience)?;
        if let Some(id) = &room {
            if !self.rooms.iter().any(|r| &r.id == id) {
                return Err(not_offered(Step::Room, id));
            }
        }
        self.room = room;
        Ok(())
    }

    /// Brouillon prêt pour le planificateur ; les étapes non choisies restent vides.
    pub fn draft(&self, date: NaiveDate, time_start: &str, time_end: &str) -> LessonDraft {
        let (group, student) = match &self.audience {
            Some(Audience::Group(g)) => (Some(g.to_string()), None),
            Some(Audience::Student(s)) => (None, Some(s.to_string())),
            None => (None, None),
        };
        LessonDraft {
            subject: self.subject.as_ref().map(ToString::to_string).unwrap_or_default(),
            teacher: self.teacher.as_ref().map(ToString::to_string).unwrap_or_default(),
            group,
            student,
            room: self.room.as_ref().map(ToString::to_string).unwrap_or_default(),
            date,
            time_start: time_start.to_string(),
            time_end: time_end.to_string(),
        }
    }
}

fn not_offered(step: Step, value: &dyn fmt::Display) -> SelectionError {
    SelectionError::NotOffered {
        step,
        value: value.to_string(),
    }
}
