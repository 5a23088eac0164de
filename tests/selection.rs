#![forbid(unsafe_code)]
mod common;

use common::{admin, day, scheduler};
use creneaux::{
    Audience, GroupId, Repository, Role, RoomId, ScheduleInput, ScheduleOptions, SelectionChain,
    SelectionError, Step, SubjectId, User, UserId,
};

struct Catalog {
    piano: SubjectId,
    solfege: SubjectId,
    group: GroupId,
    room: RoomId,
}

fn seed<S: creneaux::DocumentStore>(repo: &Repository<S>) -> Catalog {
    let piano = repo.create_subject("Piano").unwrap();
    let solfege = repo.create_subject("Solfège").unwrap();
    let group = repo.create_group("Débutants").unwrap();
    let room = repo.create_room("Salle 1", Some("#ff8800")).unwrap();

    let mut anne = User::new("anne@ecole.fr", "Anne", "Martin", Role::Teacher);
    anne.subject = Some(piano.clone());
    anne.confirmed = Some(true);
    let mut paul = User::new("paul@ecole.fr", "Paul", "Durand", Role::Teacher);
    paul.subject = Some(piano.clone());
    let mut zoe = User::new("zoe@ecole.fr", "Zoé", "Petit", Role::Teacher);
    zoe.subject = Some(solfege.clone());
    let mut eleve = User::new("eleve@ecole.fr", "Léa", "Bernard", Role::Default);
    eleve.group = Some(group.clone());
    for user in [anne, paul, zoe, eleve] {
        repo.put_user(&user).unwrap();
    }

    Catalog {
        piano,
        solfege,
        group,
        room,
    }
}

#[test]
fn each_step_unlocks_the_next() {
    let s = scheduler();
    let repo = s.repository();
    let cat = seed(repo);
    let mut chain = SelectionChain::load(repo, false).unwrap();
    assert_eq!(chain.subjects().len(), 2);

    assert!(matches!(
        chain.select_teacher(repo, Some(UserId::new("anne@ecole.fr"))),
        Err(SelectionError::Locked(Step::Subject))
    ));

    chain.select_subject(repo, Some(cat.piano.clone())).unwrap();
    let names: Vec<_> = chain.teachers().iter().map(User::display_name).collect();
    assert_eq!(names, ["Paul Durand", "Anne Martin"]);
    assert!(chain.groups().is_empty());

    chain
        .select_teacher(repo, Some(UserId::new("Anne@Ecole.fr")))
        .unwrap();
    assert_eq!(chain.groups().len(), 1);
    assert_eq!(chain.students().len(), 1);
    assert!(chain.rooms().is_empty());

    chain
        .select_audience(repo, Some(Audience::Group(cat.group.clone())))
        .unwrap();
    assert_eq!(chain.rooms()[0].color.as_deref(), Some("#ff8800"));
    chain.select_room(Some(cat.room.clone())).unwrap();

    let draft = chain.draft(day(), "09:00", "10:00");
    assert_eq!(draft.teacher, "anne@ecole.fr");
    s.schedule_lesson(&admin(), ScheduleInput::create(draft)).unwrap();
}

#[test]
fn changing_subject_clears_everything_downstream() {
    let s = scheduler();
    let repo = s.repository();
    let cat = seed(repo);
    let mut chain = SelectionChain::load(repo, false).unwrap();

    chain.select_subject(repo, Some(cat.piano.clone())).unwrap();
    chain
        .select_teacher(repo, Some(UserId::new("anne@ecole.fr")))
        .unwrap();
    chain
        .select_audience(repo, Some(Audience::Student(UserId::new("eleve@ecole.fr"))))
        .unwrap();
    chain.select_room(Some(cat.room.clone())).unwrap();

    chain.select_subject(repo, Some(cat.solfege.clone())).unwrap();
    assert_eq!(chain.subject(), Some(&cat.solfege));
    assert_eq!(chain.teacher(), None);
    assert_eq!(chain.audience(), None);
    assert_eq!(chain.room(), None);
    assert!(chain.groups().is_empty() && chain.students().is_empty() && chain.rooms().is_empty());
    assert_eq!(chain.teachers().len(), 1);

    let draft = chain.draft(day(), "09:00", "10:00");
    assert!(draft.teacher.is_empty() && draft.room.is_empty());
    assert_eq!((draft.group, draft.student), (None, None));
}

#[test]
fn clearing_teacher_keeps_subject() {
    let s = scheduler();
    let repo = s.repository();
    let cat = seed(repo);
    let mut chain = SelectionChain::load(repo, false).unwrap();

    chain.select_subject(repo, Some(cat.piano.clone())).unwrap();
    chain
        .select_teacher(repo, Some(UserId::new("paul@ecole.fr")))
        .unwrap();
    chain.select_teacher(repo, None).unwrap();

    assert_eq!(chain.subject(), Some(&cat.piano));
    assert_eq!(chain.teachers().len(), 2);
    assert!(chain.groups().is_empty());
    assert!(matches!(
        chain.select_audience(repo, Some(Audience::Group(cat.group))),
        Err(SelectionError::Locked(Step::Teacher))
    ));
}

#[test]
fn unoffered_values_are_refused_without_losing_state() {
    let s = scheduler();
    let repo = s.repository();
    let cat = seed(repo);
    let mut chain = SelectionChain::load(repo, true).unwrap();

    chain.select_subject(repo, Some(cat.piano.clone())).unwrap();
    // Paul n'est pas confirmé
    assert_eq!(chain.teachers().len(), 1);
    let err = chain
        .select_teacher(repo, Some(UserId::new("paul@ecole.fr")))
        .unwrap_err();
    assert_eq!(err.to_string(), "paul@ecole.fr is not an available teacher");
    assert_eq!(chain.teachers().len(), 1);

    assert!(matches!(
        chain.select_subject(repo, Some(SubjectId::new("nope"))),
        Err(SelectionError::NotOffered { step: Step::Subject, .. })
    ));
    assert_eq!(chain.subject(), Some(&cat.piano));
}

#[test]
fn scheduler_option_limits_chain_to_confirmed_teachers() {
    let s = scheduler().with_options(ScheduleOptions {
        require_confirmed_teacher: true,
        ..ScheduleOptions::default()
    });
    let cat = seed(s.repository());
    let mut chain = s.selection_chain().unwrap();
    chain.select_subject(s.repository(), Some(cat.piano)).unwrap();
    let names: Vec<_> = chain.teachers().iter().map(User::display_name).collect();
    assert_eq!(names, ["Anne Martin"]);
}
