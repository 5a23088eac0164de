//! Collaborateur « base de documents » : requêtes par égalité, création,
//! mise à jour partielle et lecture par identifiant.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Lessons,
    Subjects,
    Groups,
    Rooms,
    Users,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Lessons => "lessons",
            Collection::Subjects => "subjects",
            Collection::Groups => "groups",
            Collection::Rooms => "rooms",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: Collection, id: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Filtre d'égalité sur un champ de premier niveau.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq<F: Into<String>, V: Into<Value>>(field: F, value: V) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field) == Some(&self.value)
    }
}

/// Document stocké avec son identifiant.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored {
    pub id: String,
    pub doc: Document,
}

pub trait DocumentStore: Send + Sync {
    /// Documents satisfaisant tous les filtres (aucun filtre : toute la collection).
    fn query(&self, collection: Collection, filters: &[Filter]) -> Result<Vec<Stored>, StoreError>;
    /// Crée un document et renvoie l'identifiant attribué.
    fn create(&self, collection: Collection, doc: Document) -> Result<String, StoreError>;
    /// Écrit (ou remplace) un document sous un identifiant choisi.
    fn put(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError>;
    /// Fusion superficielle ; une valeur `null` retire le champ.
    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError>;
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct Snapshot(BTreeMap<String, BTreeMap<String, Document>>);

impl Snapshot {
    fn query(&self, collection: Collection, filters: &[Filter]) -> Vec<Stored> {
        self.0
            .get(collection.as_str())
            .into_iter()
            .flatten()
            .filter(|(_, doc)| filters.iter().all(|f| f.matches(doc)))
            .map(|(id, doc)| Stored {
                id: id.clone(),
                doc: doc.clone(),
            })
            .collect()
    }

    fn put(&mut self, collection: Collection, id: &str, doc: Document) {
        self.0
            .entry(collection.as_str().to_string())
            .or_default()
            .insert(id.to_string(), doc);
    }

    fn merge(&mut self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        let doc = self
            .0
            .get_mut(collection.as_str())
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        for (field, value) in patch {
            if value.is_null() {
                doc.remove(&field);
            } else {
                doc.insert(field, value);
            }
        }
        Ok(())
    }

    fn get(&self, collection: Collection, id: &str) -> Option<Document> {
        self.0.get(collection.as_str())?.get(id).cloned()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

/// Stockage en mémoire, partagé entre threads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Snapshot>, StoreError> {
        self.data.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Snapshot>, StoreError> {
        self.data.write().map_err(poisoned)
    }
}

impl DocumentStore for MemoryStore {
    fn query(&self, collection: Collection, filters: &[Filter]) -> Result<Vec<Stored>, StoreError> {
        Ok(self.read()?.query(collection, filters))
    }

    fn create(&self, collection: Collection, doc: Document) -> Result<String, StoreError> {
        let id = new_id();
        self.write()?.put(collection, &id, doc);
        Ok(id)
    }

    fn put(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError> {
        self.write()?.put(collection, id, doc);
        Ok(())
    }

    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        self.write()?.merge(collection, id, patch)
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.read()?.get(collection, id))
    }
}

/// Stockage fichier : un instantané JSON réécrit de manière atomique à chaque écriture.
#[derive(Debug)]
pub struct JsonStorage {
    path: PathBuf,
    data: RwLock<Snapshot>,
}

impl JsonStorage {
    /// Ouvre (ou prépare) le fichier ; un fichier absent donne un stockage vide.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = if path.exists() {
            let data = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_slice(&data)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            Snapshot::default()
        };
        Ok(Self {
            path,
            data: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }

    /// Applique `change` sur une copie, persiste, puis publie la copie.
    /// Un échec d'écriture disque laisse l'état en mémoire intact.
    fn commit<T>(
        &self,
        change: impl FnOnce(&mut Snapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.data.write().map_err(poisoned)?;
        let mut next = guard.clone();
        let out = change(&mut next)?;
        self.save(&next)?;
        *guard = next;
        Ok(out)
    }
}

impl DocumentStore for JsonStorage {
    fn query(&self, collection: Collection, filters: &[Filter]) -> Result<Vec<Stored>, StoreError> {
        Ok(self.data.read().map_err(poisoned)?.query(collection, filters))
    }

    fn create(&self, collection: Collection, doc: Document) -> Result<String, StoreError> {
        let id = new_id();
        self.commit(|snap| {
            snap.put(collection, &id, doc);
            Ok(())
        })?;
        Ok(id)
    }

    fn put(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError> {
        self.commit(|snap| {
            snap.put(collection, id, doc);
            Ok(())
        })
    }

    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        self.commit(|snap| snap.merge(collection, id, patch))
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.data.read().map_err(poisoned)?.get(collection, id))
    }
}
