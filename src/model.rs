use crate::time::{Interval, TimeOfDay};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant opaque attribué par le dépôt à la création d'un cours.
    LessonId
);
string_id!(SubjectId);
string_id!(RoomId);
string_id!(GroupId);

/// Identifiant d'utilisateur : l'adresse e-mail en minuscules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new<S: AsRef<str>>(email: S) -> Self {
        Self(email.as_ref().trim().to_lowercase())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Élève (ou parent).
    Default,
    Teacher,
    Administrator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Default => "default",
            Role::Teacher => "teacher",
            Role::Administrator => "administrator",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "default" => Some(Role::Default),
            "teacher" => Some(Role::Teacher),
            "administrator" => Some(Role::Administrator),
            _ => None,
        }
    }
}

/// Public d'un cours : un groupe entier ou un seul élève, jamais les deux.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Audience {
    Group(GroupId),
    Student(UserId),
}

impl Audience {
    pub fn is_individual(&self) -> bool {
        matches!(self, Audience::Student(_))
    }
}

/// Marqueur de suivi des cours individuels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonStatus {
    AwaitingConfirmation,
    Other(String),
}

impl LessonStatus {
    pub const AWAITING_CONFIRMATION: &'static str = "awaiting_confirmation";

    pub fn as_str(&self) -> &str {
        match self {
            LessonStatus::AwaitingConfirmation => Self::AWAITING_CONFIRMATION,
            LessonStatus::Other(s) => s,
        }
    }
}

impl From<String> for LessonStatus {
    fn from(raw: String) -> Self {
        if raw == Self::AWAITING_CONFIRMATION {
            LessonStatus::AwaitingConfirmation
        } else {
            LessonStatus::Other(raw)
        }
    }
}

/// Cours planifié (date et heures en temps local de l'établissement).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: LessonId,
    pub subject: SubjectId,
    pub teacher: UserId,
    pub audience: Audience,
    pub room: RoomId,
    pub date: NaiveDate,
    pub time_start: Option<TimeOfDay>,
    pub time_end: Option<TimeOfDay>,
    /// Absent : en attente ; `true` : confirmé ; `false` : annulé.
    pub confirmed: Option<bool>,
    pub status: Option<LessonStatus>,
}

impl Lesson {
    /// `None` pour les enregistrements sans heures exploitables.
    pub fn interval(&self) -> Option<Interval> {
        let (start, end) = self.time_start.zip(self.time_end)?;
        Interval::new(start, end).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    /// Matière enseignée (professeurs).
    pub subject: Option<SubjectId>,
    /// Groupe de rattachement (élèves).
    pub group: Option<GroupId>,
    pub photo: Option<String>,
    pub confirmed: Option<bool>,
}

impl User {
    pub fn new<E: AsRef<str>, F: Into<String>, L: Into<String>>(
        email: E,
        first_name: F,
        last_name: L,
        role: Role,
    ) -> Self {
        Self {
            id: UserId::new(email),
            first_name: first_name.into(),
            last_name: last_name.into(),
            middle_name: None,
            phone: None,
            role,
            subject: None,
            group: None,
            photo: None,
            confirmed: None,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Session explicite transmise aux cas d'usage (pas d'état global).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user: UserId,
    pub role: Role,
}

impl SessionContext {
    pub fn new(user: UserId, role: Role) -> Self {
        Self { user, role }
    }

    pub fn administrator<S: AsRef<str>>(email: S) -> Self {
        Self::new(UserId::new(email), Role::Administrator)
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }
}
