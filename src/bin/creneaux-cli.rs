#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use creneaux::{
    io,
    model::{LessonId, Role, SessionContext, User, UserId},
    repository::DATE_FORMAT,
    scheduler::{ConflictAxis, LessonDraft, ScheduleInput, Scheduler},
    storage::JsonStorage,
    Config,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification des cours (salles, professeurs, groupes)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du stockage
    #[arg(long, global = true, default_value = "creneaux.json")]
    store: String,

    /// Fichier JSON de configuration (horaires, options)
    #[arg(long, global = true)]
    config: Option<String>,

    /// E-mail de l'utilisateur qui agit (doit être administrateur pour planifier)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CatalogKind {
    Rooms,
    Subjects,
    Groups,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ajouter une salle
    AddRoom {
        #[arg(long)]
        name: String,
        #[arg(long)]
        color: Option<String>,
    },

    /// Ajouter une matière
    AddSubject {
        #[arg(long)]
        name: String,
    },

    /// Ajouter un groupe
    AddGroup {
        #[arg(long)]
        name: String,
    },

    /// Ajouter (ou remplacer) un utilisateur, identifié par son e-mail
    AddUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// default | teacher | administrator
        #[arg(long, default_value = "default", value_parser = parse_role)]
        role: Role,
        /// Matière enseignée (professeurs)
        #[arg(long)]
        subject: Option<String>,
        /// Groupe (élèves)
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        confirmed: bool,
    },

    /// Importer un catalogue depuis un CSV `name[,color]`
    ImportCatalog {
        #[arg(long, value_enum)]
        kind: CatalogKind,
        #[arg(long)]
        csv: String,
    },

    /// Planifier un nouveau cours
    Schedule {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        teacher: String,
        #[arg(long, conflicts_with = "student")]
        group: Option<String>,
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        room: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        start: String,
        /// HH:MM
        #[arg(long)]
        end: String,
    },

    /// Modifier un cours existant (seuls les champs fournis changent)
    Edit {
        #[arg(long)]
        lesson: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long, conflicts_with = "student")]
        group: Option<String>,
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        room: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// Confirmer un cours
    Confirm {
        #[arg(long)]
        lesson: String,
    },

    /// Annuler un cours
    Cancel {
        #[arg(long)]
        lesson: String,
    },

    /// Lister et optionnellement exporter
    List {
        /// Limiter à une date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Vérifier les conflits du planning stocké
    Check {
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },
}

fn parse_role(raw: &str) -> std::result::Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role {raw:?}"))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("invalid date {raw:?} (expected YYYY-MM-DD)"))
}

/// Session de l'utilisateur `--user`, rôle lu dans le stockage.
fn session(scheduler: &Scheduler<JsonStorage>, user: Option<&str>) -> Result<SessionContext> {
    let Some(email) = user else {
        bail!("--user is required for this command");
    };
    let id = UserId::new(email);
    let found = scheduler
        .repository()
        .user(&id)?
        .with_context(|| format!("unknown user: {id}"))?;
    Ok(SessionContext::new(found.id, found.role))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let storage = JsonStorage::open(&cli.store)?;
    let scheduler = Scheduler::new(storage).configured(&config);
    let repo = scheduler.repository();
    let user = cli.user.as_deref();

    let code = match cli.cmd {
        Commands::AddRoom { name, color } => {
            println!("{}", repo.create_room(&name, color.as_deref())?);
            0
        }
        Commands::AddSubject { name } => {
            println!("{}", repo.create_subject(&name)?);
            0
        }
        Commands::AddGroup { name } => {
            println!("{}", repo.create_group(&name)?);
            0
        }
        Commands::AddUser {
            email,
            first_name,
            last_name,
            role,
            subject,
            group,
            confirmed,
        } => {
            let mut u = User::new(&email, first_name, last_name, role);
            u.subject = subject.map(creneaux::SubjectId::new);
            u.group = group.map(creneaux::GroupId::new);
            u.confirmed = confirmed.then_some(true);
            repo.put_user(&u)?;
            println!("{}", u.id);
            0
        }
        Commands::ImportCatalog { kind, csv } => {
            let rows = io::import_catalog_csv(csv)?;
            for row in &rows {
                let id = match kind {
                    CatalogKind::Rooms => repo.create_room(&row.name, row.color.as_deref())?.to_string(),
                    CatalogKind::Subjects => repo.create_subject(&row.name)?.to_string(),
                    CatalogKind::Groups => repo.create_group(&row.name)?.to_string(),
                };
                println!("{id} | {}", row.name);
            }
            0
        }
        Commands::Schedule {
            subject,
            teacher,
            group,
            student,
            room,
            date,
            start,
            end,
        } => {
            let session = session(&scheduler, user)?;
            let draft = LessonDraft {
                subject,
                teacher,
                group,
                student,
                room,
                date: parse_date(&date)?,
                time_start: start,
                time_end: end,
            };
            let id = scheduler.schedule_lesson(&session, ScheduleInput::create(draft))?;
            println!("{id}");
            0
        }
        Commands::Edit {
            lesson,
            subject,
            teacher,
            group,
            student,
            room,
            date,
            start,
            end,
        } => {
            let session = session(&scheduler, user)?;
            let id = LessonId::new(lesson);
            let mut draft = LessonDraft::from(&repo.lesson(&id)?);
            if let Some(v) = subject {
                draft.subject = v;
            }
            if let Some(v) = teacher {
                draft.teacher = v;
            }
            if group.is_some() || student.is_some() {
                draft.group = group;
                draft.student = student;
            }
            if let Some(v) = room {
                draft.room = v;
            }
            if let Some(v) = date {
                draft.date = parse_date(&v)?;
            }
            if let Some(v) = start {
                draft.time_start = v;
            }
            if let Some(v) = end {
                draft.time_end = v;
            }
            scheduler.schedule_lesson(&session, ScheduleInput::edit(id.clone(), draft))?;
            println!("{id}");
            0
        }
        Commands::Confirm { lesson } => {
            let session = session(&scheduler, user)?;
            scheduler.confirm_lesson(&session, &LessonId::new(lesson))?;
            0
        }
        Commands::Cancel { lesson } => {
            let session = session(&scheduler, user)?;
            scheduler.cancel_lesson(&session, &LessonId::new(lesson))?;
            0
        }
        Commands::List {
            date,
            out_json,
            out_csv,
        } => {
            let lessons = match date {
                Some(d) => repo.lessons_on(parse_date(&d)?)?,
                None => repo.all_lessons()?,
            };
            if let Some(path) = out_json {
                io::export_lessons_json(path, &lessons)?;
            }
            if let Some(path) = out_csv {
                io::export_lessons_csv(path, &lessons)?;
            }
            for l in &lessons {
                let row = io::LessonRow::from(l);
                let audience = if row.group.is_empty() { &row.student } else { &row.group };
                println!(
                    "{} | {} {}-{} | {} | {} | {} | {}",
                    row.id, row.date, row.time_start, row.time_end, row.room, row.teacher, audience, row.confirmed
                );
            }
            0
        }
        Commands::Check { report } => {
            let conflicts = scheduler.detect_conflicts()?;
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                for c in &conflicts {
                    eprintln!(
                        "{} {} {}: {} / {} ({} min)",
                        c.date, c.axis, c.resource, c.lesson_a, c.lesson_b, c.overlap_minutes
                    );
                }
                if let Some(path) = report {
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["date", "axis", "resource", "lesson_a", "lesson_b", "overlap_minutes"])?;
                    for c in &conflicts {
                        w.write_record([
                            c.date.format(DATE_FORMAT).to_string().as_str(),
                            match c.axis {
                                ConflictAxis::Room => "room",
                                ConflictAxis::Teacher => "teacher",
                            },
                            c.resource.as_str(),
                            c.lesson_a.as_str(),
                            c.lesson_b.as_str(),
                            c.overlap_minutes.to_string().as_str(),
                        ])?;
                    }
                    w.flush()?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
    };

    std::process::exit(code);
}
