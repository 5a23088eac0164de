#![forbid(unsafe_code)]
//! Créneaux : moteur de planification de cours sans double réservation.
//!
//! - Créneaux horaires `HH:MM` en temps local de l'établissement.
//! - Contrôle de conflits par salle et par professeur, même jour.
//! - Horaires d'ouverture par jour de semaine.
//! - Stockage de documents injecté (mémoire ou fichier JSON).

pub mod clock;
pub mod config;
pub mod hours;
pub mod io;
pub mod model;
pub mod repository;
pub mod scheduler;
pub mod selection;
pub mod storage;
pub mod time;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use hours::WorkingHours;
pub use model::{
    Audience, Group, GroupId, Lesson, LessonId, LessonStatus, Role, Room, RoomId, SessionContext,
    Subject, SubjectId, User, UserId,
};
pub use repository::{LessonFields, LessonKey, RecordError, RepoError, Repository};
pub use scheduler::{
    Candidate, Conflict, ConflictAxis, Field, LessonDraft, SchedError, ScheduleInput,
    ScheduleOptions, Scheduler,
};
pub use selection::{SelectionChain, SelectionError, Step};
pub use storage::{
    Collection, Document, DocumentStore, Filter, JsonStorage, MemoryStore, StoreError, Stored,
};
pub use time::{parse_time_to_minutes, Interval, TimeError, TimeOfDay};
