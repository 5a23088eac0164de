//! Frontière typée entre le stockage de documents et le domaine.
//!
//! Les documents sont validés à la lecture : un champ de mauvais type, un rôle
//! inconnu ou un cours à la fois de groupe et individuel donnent
//! [`RecordError::Malformed`] au lieu de valeurs à moitié remplies.

use crate::model::{
    Audience, Group, GroupId, Lesson, LessonId, LessonStatus, Role, Room, RoomId, Subject,
    SubjectId, User, UserId,
};
use crate::storage::{Collection, Document, DocumentStore, Filter, StoreError, Stored};
use crate::time::{Interval, TimeOfDay};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("malformed {collection}/{id}: {reason}")]
    Malformed {
        collection: Collection,
        id: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum RepoError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Champ d'un cours utilisé comme axe de recherche.
#[derive(Debug, Clone, Copy)]
pub enum LessonKey<'a> {
    Room(&'a RoomId),
    Teacher(&'a UserId),
}

/// Contenu écrit pour un cours (création ou modification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonFields {
    pub subject: SubjectId,
    pub teacher: UserId,
    pub audience: Audience,
    pub room: RoomId,
    pub date: NaiveDate,
    pub slot: Interval,
    /// `None` laisse le statut existant inchangé.
    pub status: Option<LessonStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonRecord {
    subject_id: Option<String>,
    teacher_id: Option<String>,
    group_id: Option<String>,
    student_id: Option<String>,
    room_id: Option<String>,
    date: Option<String>,
    time_start: Option<String>,
    time_end: Option<String>,
    confirmed: Option<bool>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedRecord {
    name: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    middle_name: Option<String>,
    phone: Option<String>,
    role: Option<String>,
    subject_id: Option<String>,
    group_id: Option<String>,
    photo: Option<String>,
    confirmed: Option<bool>,
}

/// Une chaîne vide vaut absence (les formulaires stockent `""`).
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

struct Decoder<'a> {
    collection: Collection,
    id: &'a str,
}

impl Decoder<'_> {
    fn malformed(&self, reason: impl Into<String>) -> RecordError {
        RecordError::Malformed {
            collection: self.collection,
            id: self.id.to_string(),
            reason: reason.into(),
        }
    }

    fn parse<T: DeserializeOwned>(&self, doc: &Document) -> Result<T, RecordError> {
        serde_json::from_value(Value::Object(doc.clone())).map_err(|e| self.malformed(e.to_string()))
    }

    fn required(&self, value: Option<String>, field: &str) -> Result<String, RecordError> {
        non_empty(value).ok_or_else(|| self.malformed(format!("missing {field}")))
    }
}

fn decode_lesson(id: &str, doc: &Document) -> Result<Lesson, RecordError> {
    let d = Decoder {
        collection: Collection::Lessons,
        id,
    };
    let rec: LessonRecord = d.parse(doc)?;

    let audience = match (non_empty(rec.group_id), non_empty(rec.student_id)) {
        (Some(group), None) => Audience::Group(GroupId::new(group)),
        (None, Some(student)) => Audience::Student(UserId::new(student)),
        (Some(_), Some(_)) => return Err(d.malformed("both groupId and studentId set")),
        (None, None) => return Err(d.malformed("neither groupId nor studentId set")),
    };
    let raw_date = d.required(rec.date, "date")?;
    let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
        .map_err(|_| d.malformed(format!("invalid date {raw_date:?}")))?;
    // heures absentes ou illisibles : cours conservé, simplement sans créneau
    let time = |raw: Option<String>| non_empty(raw).and_then(|s| TimeOfDay::parse(&s).ok());

    Ok(Lesson {
        id: LessonId::new(id),
        subject: SubjectId::new(d.required(rec.subject_id, "subjectId")?),
        teacher: UserId::new(d.required(rec.teacher_id, "teacherId")?),
        audience,
        room: RoomId::new(d.required(rec.room_id, "roomId")?),
        date,
        time_start: time(rec.time_start),
        time_end: time(rec.time_end),
        confirmed: rec.confirmed,
        status: non_empty(rec.status).map(LessonStatus::from),
    })
}

fn encode_lesson(fields: &LessonFields) -> Document {
    let (group, student) = match &fields.audience {
        Audience::Group(g) => (Value::from(g.as_str()), Value::Null),
        Audience::Student(s) => (Value::Null, Value::from(s.as_str())),
    };
    let mut doc = Document::new();
    doc.insert("subjectId".into(), fields.subject.as_str().into());
    doc.insert("teacherId".into(), fields.teacher.as_str().into());
    doc.insert("groupId".into(), group);
    doc.insert("studentId".into(), student);
    doc.insert("roomId".into(), fields.room.as_str().into());
    doc.insert("date".into(), fields.date.format(DATE_FORMAT).to_string().into());
    doc.insert("timeStart".into(), fields.slot.start().to_string().into());
    doc.insert("timeEnd".into(), fields.slot.end().to_string().into());
    if let Some(status) = &fields.status {
        doc.insert("status".into(), status.as_str().into());
    }
    doc
}

fn decode_room(id: &str, doc: &Document) -> Result<Room, RecordError> {
    let d = Decoder {
        collection: Collection::Rooms,
        id,
    };
    let rec: NamedRecord = d.parse(doc)?;
    Ok(Room {
        id: RoomId::new(id),
        name: d.required(rec.name, "name")?,
        color: non_empty(rec.color),
    })
}

fn decode_subject(id: &str, doc: &Document) -> Result<Subject, RecordError> {
    let d = Decoder {
        collection: Collection::Subjects,
        id,
    };
    let rec: NamedRecord = d.parse(doc)?;
    Ok(Subject {
        id: SubjectId::new(id),
        name: d.required(rec.name, "name")?,
    })
}

fn decode_group(id: &str, doc: &Document) -> Result<Group, RecordError> {
    let d = Decoder {
        collection: Collection::Groups,
        id,
    };
    let rec: NamedRecord = d.parse(doc)?;
    Ok(Group {
        id: GroupId::new(id),
        name: d.required(rec.name, "name")?,
    })
}

fn decode_user(id: &str, doc: &Document) -> Result<User, RecordError> {
    let d = Decoder {
        collection: Collection::Users,
        id,
    };
    let rec: UserRecord = d.parse(doc)?;
    let raw_role = d.required(rec.role, "role")?;
    let role = Role::parse(&raw_role).ok_or_else(|| d.malformed(format!("unknown role {raw_role:?}")))?;
    Ok(User {
        id: UserId::new(id),
        first_name: rec.first_name,
        last_name: rec.last_name,
        middle_name: non_empty(rec.middle_name),
        phone: non_empty(rec.phone),
        role,
        subject: non_empty(rec.subject_id).map(SubjectId::new),
        group: non_empty(rec.group_id).map(GroupId::new),
        photo: non_empty(rec.photo),
        confirmed: rec.confirmed,
    })
}

fn encode_user(user: &User) -> Document {
    let mut doc = Document::new();
    doc.insert("firstName".into(), user.first_name.as_str().into());
    doc.insert("lastName".into(), user.last_name.as_str().into());
    doc.insert("role".into(), user.role.as_str().into());
    let optional = [
        ("middleName", user.middle_name.as_deref()),
        ("phone", user.phone.as_deref()),
        ("subjectId", user.subject.as_ref().map(SubjectId::as_str)),
        ("groupId", user.group.as_ref().map(GroupId::as_str)),
        ("photo", user.photo.as_deref()),
    ];
    for (field, value) in optional {
        if let Some(value) = value {
            doc.insert(field.into(), value.into());
        }
    }
    if let Some(confirmed) = user.confirmed {
        doc.insert("confirmed".into(), confirmed.into());
    }
    doc
}

fn object(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Décode une liste en ignorant (avec un avertissement) les documents invalides.
fn decode_lenient<T>(
    stored: Vec<Stored>,
    decode: fn(&str, &Document) -> Result<T, RecordError>,
) -> Vec<T> {
    stored
        .into_iter()
        .filter_map(|s| match decode(&s.id, &s.doc) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "skipping malformed record");
                None
            }
        })
        .collect()
}

/// Accès typé aux collections du stockage.
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
}

impl<S: DocumentStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cours d'une date pour une salle ou un professeur ; les documents
    /// invalides sont ignorés.
    ///
    /// Le professeur est comparé après décodage : un `teacherId` stocké avec
    /// des majuscules désigne le même compte que sa forme en minuscules.
    pub fn lessons_where(&self, date: NaiveDate, key: LessonKey<'_>) -> Result<Vec<Lesson>, RepoError> {
        let mut filters = vec![Filter::eq("date", date.format(DATE_FORMAT).to_string())];
        if let LessonKey::Room(room) = key {
            filters.push(Filter::eq("roomId", room.as_str()));
        }
        let stored = self.store.query(Collection::Lessons, &filters)?;
        let hits = stored.len();
        let mut lessons = decode_lenient(stored, decode_lesson);
        if let LessonKey::Teacher(teacher) = key {
            lessons.retain(|l| &l.teacher == teacher);
        }
        debug!(%date, ?key, hits, kept = lessons.len(), "lesson query");
        Ok(lessons)
    }

    pub fn lessons_on(&self, date: NaiveDate) -> Result<Vec<Lesson>, RepoError> {
        let filters = [Filter::eq("date", date.format(DATE_FORMAT).to_string())];
        let mut lessons = decode_lenient(self.store.query(Collection::Lessons, &filters)?, decode_lesson);
        lessons.sort_by_key(|l| (l.time_start, l.room.clone()));
        Ok(lessons)
    }

    pub fn all_lessons(&self) -> Result<Vec<Lesson>, RepoError> {
        let mut lessons = decode_lenient(self.store.query(Collection::Lessons, &[])?, decode_lesson);
        lessons.sort_by_key(|l| (l.date, l.time_start, l.room.clone()));
        Ok(lessons)
    }

    /// Lecture stricte : un document invalide est une erreur.
    pub fn lesson(&self, id: &LessonId) -> Result<Lesson, RepoError> {
        let doc = self
            .store
            .get(Collection::Lessons, id.as_str())?
            .ok_or_else(|| StoreError::NotFound {
                collection: Collection::Lessons,
                id: id.to_string(),
            })?;
        Ok(decode_lesson(id.as_str(), &doc)?)
    }

    pub fn create_lesson(&self, fields: &LessonFields) -> Result<LessonId, RepoError> {
        let mut doc = encode_lesson(fields);
        doc.retain(|_, v| !v.is_null());
        let id = self.store.create(Collection::Lessons, doc)?;
        Ok(LessonId::new(id))
    }

    pub fn update_lesson(&self, id: &LessonId, fields: &LessonFields) -> Result<(), RepoError> {
        self.store
            .update(Collection::Lessons, id.as_str(), encode_lesson(fields))?;
        Ok(())
    }

    pub fn set_confirmed(&self, id: &LessonId, confirmed: bool) -> Result<(), RepoError> {
        self.store.update(
            Collection::Lessons,
            id.as_str(),
            object(json!({ "confirmed": confirmed })),
        )?;
        Ok(())
    }

    pub fn rooms(&self) -> Result<Vec<Room>, RepoError> {
        let mut rooms = decode_lenient(self.store.query(Collection::Rooms, &[])?, decode_room);
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }

    pub fn subjects(&self) -> Result<Vec<Subject>, RepoError> {
        let mut subjects = decode_lenient(self.store.query(Collection::Subjects, &[])?, decode_subject);
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    pub fn groups(&self) -> Result<Vec<Group>, RepoError> {
        let mut groups = decode_lenient(self.store.query(Collection::Groups, &[])?, decode_group);
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    /// Professeurs d'une matière, éventuellement limités aux comptes confirmés.
    pub fn teachers_for(&self, subject: &SubjectId, confirmed_only: bool) -> Result<Vec<User>, RepoError> {
        let mut filters = vec![
            Filter::eq("role", Role::Teacher.as_str()),
            Filter::eq("subjectId", subject.as_str()),
        ];
        if confirmed_only {
            filters.push(Filter::eq("confirmed", true));
        }
        self.users_where(&filters)
    }

    pub fn students(&self) -> Result<Vec<User>, RepoError> {
        self.users_where(&[Filter::eq("role", Role::Default.as_str())])
    }

    fn users_where(&self, filters: &[Filter]) -> Result<Vec<User>, RepoError> {
        let mut users = decode_lenient(self.store.query(Collection::Users, filters)?, decode_user);
        users.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(users)
    }

    pub fn user(&self, id: &UserId) -> Result<Option<User>, RepoError> {
        match self.store.get(Collection::Users, id.as_str())? {
            Some(doc) => Ok(Some(decode_user(id.as_str(), &doc)?)),
            None => Ok(None),
        }
    }

    /// Écrit l'utilisateur sous son e-mail en minuscules.
    pub fn put_user(&self, user: &User) -> Result<(), RepoError> {
        self.store
            .put(Collection::Users, user.id.as_str(), encode_user(user))?;
        Ok(())
    }

    pub fn create_room(&self, name: &str, color: Option<&str>) -> Result<RoomId, RepoError> {
        let mut doc = object(json!({ "name": name }));
        if let Some(color) = color {
            doc.insert("color".into(), color.into());
        }
        Ok(RoomId::new(self.store.create(Collection::Rooms, doc)?))
    }

    pub fn create_subject(&self, name: &str) -> Result<SubjectId, RepoError> {
        let id = self
            .store
            .create(Collection::Subjects, object(json!({ "name": name })))?;
        Ok(SubjectId::new(id))
    }

    pub fn create_group(&self, name: &str) -> Result<GroupId, RepoError> {
        let id = self
            .store
            .create(Collection::Groups, object(json!({ "name": name })))?;
        Ok(GroupId::new(id))
    }
}
