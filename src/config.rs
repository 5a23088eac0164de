use crate::hours::WorkingHours;
use crate::scheduler::ScheduleOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration fichier (JSON) ; chaque champ a une valeur par défaut.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub working_hours: WorkingHours,
    pub schedule: ScheduleOptions,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_slice(&data).with_context(|| format!("parsing config {}", path.display()))
    }
}
