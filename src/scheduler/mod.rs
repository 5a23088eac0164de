mod conflicts;
mod locks;
mod mutate;
mod types;
mod validate;

pub use types::{
    Candidate, Conflict, ConflictAxis, Field, LessonDraft, SchedError, ScheduleInput,
    ScheduleOptions,
};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::hours::WorkingHours;
use crate::model::{Lesson, LessonId, SessionContext};
use crate::repository::{RepoError, Repository};
use crate::selection::SelectionChain;
use crate::storage::DocumentStore;
use locks::SlotLocks;

/// Scheduler : moteur unique de contrôle de conflits et de planification des cours.
///
/// Partageable entre threads : deux planifications concurrentes sur la même
/// salle ou le même professeur, le même jour, sont sérialisées.
#[derive(Debug)]
pub struct Scheduler<S, C = SystemClock> {
    repo: Repository<S>,
    hours: WorkingHours,
    opts: ScheduleOptions,
    clock: C,
    locks: SlotLocks,
}

impl<S: DocumentStore> Scheduler<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: DocumentStore, C: Clock> Scheduler<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            repo: Repository::new(store),
            hours: WorkingHours::default(),
            opts: ScheduleOptions::default(),
            clock,
            locks: SlotLocks::default(),
        }
    }

    pub fn with_working_hours(mut self, hours: WorkingHours) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_options(mut self, opts: ScheduleOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn configured(self, config: &Config) -> Self {
        self.with_working_hours(config.working_hours.clone())
            .with_options(config.schedule.clone())
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repo
    }

    pub fn working_hours(&self) -> &WorkingHours {
        &self.hours
    }

    pub fn options(&self) -> &ScheduleOptions {
        &self.opts
    }

    /// Nouvelle chaîne de sélection ; les professeurs non confirmés sont
    /// écartés si `require_confirmed_teacher` est actif.
    pub fn selection_chain(&self) -> Result<SelectionChain, RepoError> {
        SelectionChain::load(&self.repo, self.opts.require_confirmed_teacher)
    }

    /// Contrôle un seul axe (salle ou professeur) pour un candidat.
    pub fn find_conflict(
        &self,
        candidate: &Candidate,
        axis: ConflictAxis,
    ) -> Result<Option<Lesson>, RepoError> {
        conflicts::find_conflict(&self.repo, candidate, axis)
    }

    /// Valide, contrôle les conflits puis écrit le cours (une seule écriture).
    pub fn schedule_lesson(
        &self,
        session: &SessionContext,
        input: ScheduleInput,
    ) -> Result<LessonId, SchedError> {
        mutate::schedule_lesson(self, session, input)
    }

    pub fn confirm_lesson(&self, session: &SessionContext, id: &LessonId) -> Result<(), SchedError> {
        mutate::set_confirmed(self, session, id, true)
    }

    pub fn cancel_lesson(&self, session: &SessionContext, id: &LessonId) -> Result<(), SchedError> {
        mutate::set_confirmed(self, session, id, false)
    }

    pub fn detect_conflicts(&self) -> Result<Vec<Conflict>, RepoError> {
        conflicts::detect_conflicts(&self.repo)
    }
}
