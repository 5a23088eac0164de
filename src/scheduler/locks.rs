use super::SchedError;
use crate::model::{RoomId, UserId};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Ressource réservée le temps d'un contrôle + écriture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SlotKey {
    Room(RoomId, NaiveDate),
    Teacher(UserId, NaiveDate),
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Room(room, date) => write!(f, "room {room} on {date}"),
            SlotKey::Teacher(teacher, date) => write!(f, "teacher {teacher} on {date}"),
        }
    }
}

/// Table de verrous applicatifs par `(salle, date)` et `(professeur, date)`.
///
/// Toutes les clés d'une tentative sont prises d'un seul coup : pas d'ordre
/// d'acquisition, donc pas d'interblocage entre deux planifications.
#[derive(Debug, Default)]
pub(crate) struct SlotLocks {
    held: Mutex<HashSet<SlotKey>>,
    released: Condvar,
}

impl SlotLocks {
    pub(crate) fn acquire(&self, keys: Vec<SlotKey>, timeout: Duration) -> Result<SlotGuard<'_>, SchedError> {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(busy) = keys.iter().find(|k| held.contains(*k)) {
            let now = Instant::now();
            if now >= deadline {
                return Err(SchedError::Busy(busy.to_string()));
            }
            debug!(key = %busy, "waiting for slot lock");
            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            held = guard;
        }
        held.extend(keys.iter().cloned());
        Ok(SlotGuard { locks: self, keys })
    }
}

/// Libère les clés à la destruction.
pub(crate) struct SlotGuard<'a> {
    locks: &'a SlotLocks,
    keys: Vec<SlotKey>,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().unwrap_or_else(PoisonError::into_inner);
        for key in &self.keys {
            held.remove(key);
        }
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
    }

    #[test]
    fn held_key_times_out_as_busy() {
        let locks = SlotLocks::default();
        let room = SlotKey::Room(RoomId::new("r1"), day());
        let _guard = locks.acquire(vec![room.clone()], Duration::ZERO).unwrap();

        let err = locks
            .acquire(vec![room], Duration::from_millis(20))
            .err()
            .unwrap();
        assert!(matches!(err, SchedError::Busy(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn disjoint_keys_do_not_block() {
        let locks = SlotLocks::default();
        let _a = locks
            .acquire(vec![SlotKey::Room(RoomId::new("r1"), day())], Duration::ZERO)
            .unwrap();
        let _b = locks
            .acquire(
                vec![
                    SlotKey::Room(RoomId::new("r2"), day()),
                    SlotKey::Teacher(UserId::new("t@x.org"), day()),
                ],
                Duration::ZERO,
            )
            .unwrap();
    }

    #[test]
    fn dropping_guard_releases_keys() {
        let locks = SlotLocks::default();
        let key = SlotKey::Teacher(UserId::new("t@x.org"), day());
        drop(locks.acquire(vec![key.clone()], Duration::ZERO).unwrap());
        assert!(locks.acquire(vec![key], Duration::ZERO).is_ok());
    }

    #[test]
    fn waiter_proceeds_once_released() {
        let locks = SlotLocks::default();
        let key = SlotKey::Room(RoomId::new("r1"), day());
        let guard = locks.acquire(vec![key.clone()], Duration::ZERO).unwrap();
        std::thread::scope(|scope| {
            let waiter = scope.spawn(|| locks.acquire(vec![key.clone()], Duration::from_secs(5)).is_ok());
            std::thread::sleep(Duration::from_millis(20));
            drop(guard);
            assert!(waiter.join().unwrap());
        });
    }
}
