use crate::model::{Audience, Lesson};
use crate::repository::DATE_FORMAT;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Ligne d'import de catalogue (salles, matières, groupes) : `name[,color]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub name: String,
    pub color: Option<String>,
}

pub fn import_catalog_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<CatalogRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid catalog row (empty name)");
        }
        let color = rec
            .get(1)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        out.push(CatalogRow {
            name: name.to_string(),
            color,
        });
    }
    Ok(out)
}

/// Vue plate d'un cours pour les exports.
#[derive(Debug, Clone, Serialize)]
pub struct LessonRow {
    pub id: String,
    pub date: String,
    pub time_start: String,
    pub time_end: String,
    pub room: String,
    pub teacher: String,
    pub subject: String,
    pub group: String,
    pub student: String,
    pub confirmed: String,
    pub status: String,
}

impl From<&Lesson> for LessonRow {
    fn from(lesson: &Lesson) -> Self {
        let (group, student) = match &lesson.audience {
            Audience::Group(g) => (g.to_string(), String::new()),
            Audience::Student(s) => (String::new(), s.to_string()),
        };
        let confirmed = match lesson.confirmed {
            None => "pending",
            Some(true) => "confirmed",
            Some(false) => "cancelled",
        };
        Self {
            id: lesson.id.to_string(),
            date: lesson.date.format(DATE_FORMAT).to_string(),
            time_start: lesson.time_start.map(|t| t.to_string()).unwrap_or_default(),
            time_end: lesson.time_end.map(|t| t.to_string()).unwrap_or_default(),
            room: lesson.room.to_string(),
            teacher: lesson.teacher.to_string(),
            subject: lesson.subject.to_string(),
            group,
            student,
            confirmed: confirmed.to_string(),
            status: lesson
                .status
                .as_ref()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Export JSON des cours (jolie mise en forme)
pub fn export_lessons_json<P: AsRef<Path>>(path: P, lessons: &[Lesson]) -> anyhow::Result<()> {
    let rows: Vec<LessonRow> = lessons.iter().map(LessonRow::from).collect();
    let s = serde_json::to_string_pretty(&rows)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV des cours, en-tête repris des noms de champs de [`LessonRow`].
pub fn export_lessons_csv<P: AsRef<Path>>(path: P, lessons: &[Lesson]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    for lesson in lessons {
        w.serialize(LessonRow::from(lesson))?;
    }
    w.flush()?;
    Ok(())
}
