//! History ledger persistence through the file-backed store.

use classbuddy_store::{
    FileStore, HISTORY_CAPACITY, HISTORY_KEY, HistoryLedger, KeyValueStore, LessonPlan,
    LessonSection,
};

fn plan(subject: &str, minutes: u32) -> LessonPlan {
    LessonPlan {
        subject: subject.to_string(),
        objective: format!("Objetivo de {subject}"),
        total_duration: minutes,
        sections: vec![LessonSection {
            title: "Desenvolvimento".to_string(),
            content: "Conteúdo completo".to_string(),
            duration: minutes,
            activities: Some(vec!["Debate".to_string()]),
        }],
        methodology: Some("Aula expositiva dialogada".to_string()),
        evaluation: None,
        resources: Some(vec!["Quadro".to_string()]),
    }
}

fn open(dir: &std::path::Path) -> HistoryLedger {
    HistoryLedger::open(Box::new(FileStore::new(dir)))
}

#[test]
fn entries_survive_reopening() {
    let tmp = tempfile::TempDir::new().unwrap();

    let saved = {
        let mut ledger = open(tmp.path());
        ledger.save(&plan("História", 50)).unwrap();
        ledger.save(&plan("Geografia", 45)).unwrap()
    };

    let reopened = open(tmp.path());
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.list()[0], saved);
    assert_eq!(reopened.list()[1].lesson_plan.subject, "História");
}

#[test]
fn twenty_one_saves_keep_twenty_newest_on_disk() {
    let tmp = tempfile::TempDir::new().unwrap();
    {
        let mut ledger = open(tmp.path());
        for i in 0..21 {
            ledger.save(&plan(&format!("aula-{i}"), 30)).unwrap();
        }
    }

    let reopened = open(tmp.path());
    assert_eq!(reopened.len(), HISTORY_CAPACITY);
    assert_eq!(reopened.list()[0].lesson_plan.subject, "aula-20");
    assert!(
        reopened
            .list()
            .iter()
            .all(|s| s.lesson_plan.subject != "aula-0"),
        "oldest entry should have been evicted"
    );
}

#[test]
fn delete_is_persisted() {
    let tmp = tempfile::TempDir::new().unwrap();
    let keep;
    {
        let mut ledger = open(tmp.path());
        let gone = ledger.save(&plan("Artes", 40)).unwrap();
        keep = ledger.save(&plan("Música", 40)).unwrap();
        ledger.delete(&gone.id).unwrap();
    }

    let reopened = open(tmp.path());
    assert_eq!(reopened.list(), std::slice::from_ref(&keep));
}

#[test]
fn clear_removes_persisted_key() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut ledger = open(tmp.path());
    ledger.save(&plan("Biologia", 60)).unwrap();
    assert!(tmp.path().join(format!("{HISTORY_KEY}.json")).is_file());

    ledger.clear().unwrap();
    assert!(ledger.list().is_empty());

    let store = FileStore::new(tmp.path());
    assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
    assert!(open(tmp.path()).is_empty());
}
