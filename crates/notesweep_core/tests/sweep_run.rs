use notesweep_core::db::open_db_in_memory;
use notesweep_core::{
    CategoryRules, ClassifyError, Classifier, ExtractionMode, NewTask, NoteStore,
    PersistFailurePolicy, RewriteMode, SectionTag, SqliteNoteStore, SweepConfig, SweepError,
    SweepService, TaskStore, TaskStoreError,
};
use std::cell::{Cell, RefCell};

fn test_config() -> SweepConfig {
    SweepConfig {
        anthropic_api_key: "test-key".to_string(),
        anthropic_model: "claude-3-haiku-20240307".to_string(),
        notion_token: "test-token".to_string(),
        tasks_database_id: "test-db".to_string(),
        note_title_tag: "#Tasks".to_string(),
        section_tags: vec![
            SectionTag::parse("#work").unwrap(),
            SectionTag::parse("#personal").unwrap(),
        ],
        rules: CategoryRules {
            direct: vec![(SectionTag::parse("#work").unwrap(), "💼 Work".to_string())],
            assisted: vec![
                "❤️ Mental Health".to_string(),
                "🌱 Personal".to_string(),
                "🏠 Home".to_string(),
            ],
            fallback: "🌱 Personal".to_string(),
        },
        extraction_mode: ExtractionMode::HashtagScopedBullets,
        rewrite_mode: RewriteMode::SelectiveRebuild,
        persist_failure_policy: PersistFailurePolicy::Continue,
        context: None,
    }
}

struct ScriptedClassifier {
    answers: RefCell<Vec<Result<String, ClassifyError>>>,
    calls: Cell<usize>,
}

impl ScriptedClassifier {
    fn new(answers: Vec<Result<String, ClassifyError>>) -> Self {
        Self {
            answers: RefCell::new(answers),
            calls: Cell::new(0),
        }
    }
}

impl Classifier for ScriptedClassifier {
    fn classify(&self, _prompt: &str) -> Result<String, ClassifyError> {
        self.calls.set(self.calls.get() + 1);
        self.answers.borrow_mut().remove(0)
    }
}

struct RecordingTaskStore {
    created: RefCell<Vec<NewTask>>,
    fail_first: Cell<usize>,
    calls: Cell<usize>,
}

impl RecordingTaskStore {
    fn new() -> Self {
        Self {
            created: RefCell::new(Vec::new()),
            fail_first: Cell::new(0),
            calls: Cell::new(0),
        }
    }

    fn failing_first(count: usize) -> Self {
        let store = Self::new();
        store.fail_first.set(count);
        store
    }
}

impl TaskStore for RecordingTaskStore {
    fn create_task(&self, task: &NewTask) -> Result<(), TaskStoreError> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if call < self.fail_first.get() {
            return Err(TaskStoreError::Rejected {
                status: 500,
                message: "store unavailable".to_string(),
            });
        }
        self.created.borrow_mut().push(task.clone());
        Ok(())
    }
}

#[test]
fn full_run_persists_categorizes_and_rewrites() {
    let conn = open_db_in_memory().unwrap();
    let note_store = SqliteNoteStore::new(&conn);
    let id = note_store
        .create_note(
            "#Tasks inbox",
            "#work\n- send report\n#personal\n- meditate\n// keep\n\u{FFFC}",
        )
        .unwrap();

    let config = test_config();
    let task_store = RecordingTaskStore::new();
    let classifier = ScriptedClassifier::new(vec![Ok("❤️ Mental Health".to_string())]);
    let service = SweepService::new(&config, &note_store, &task_store, &classifier);

    let summary = service.run().unwrap();
    assert_eq!(summary.notes_seen, 1);
    assert_eq!(summary.tasks_extracted, 2);
    assert_eq!(summary.tasks_persisted, 2);
    assert_eq!(summary.tasks_fallback, 0);
    assert_eq!(summary.persist_failures, 0);
    assert_eq!(summary.notes_rewritten, 1);

    // The direct #work mapping never reaches the classifier.
    assert_eq!(classifier.calls.get(), 1);

    let created = task_store.created.borrow();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].text, "send report");
    assert_eq!(created[0].category, "💼 Work");
    assert_eq!(created[1].text, "meditate");
    assert_eq!(created[1].category, "❤️ Mental Health");
    for task in created.iter() {
        assert_eq!(task.status, "🔴 To Do");
        assert_eq!(task.due_date.len(), 10);
        assert_eq!(task.due_date.matches('-').count(), 2);
    }

    // Rewritten under the processed section's header; only the comment
    // survives from the original body.
    assert_eq!(
        note_store.fetch_note_body(id).unwrap(),
        "<div><h1>Work</h1></div>\n<div>// keep</div>"
    );
    let renamed = note_store.list_candidate_notes("Work").unwrap();
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].id, id);
}

#[test]
fn classifier_failure_falls_back_and_run_continues() {
    let conn = open_db_in_memory().unwrap();
    let note_store = SqliteNoteStore::new(&conn);
    note_store
        .create_note("#Tasks today", "#personal\n- meditate\n- vacuum")
        .unwrap();

    let config = test_config();
    let task_store = RecordingTaskStore::new();
    let classifier = ScriptedClassifier::new(vec![
        Err(ClassifyError::Transport("connection refused".to_string())),
        Ok("🏠 Home".to_string()),
    ]);
    let service = SweepService::new(&config, &note_store, &task_store, &classifier);

    let summary = service.run().unwrap();
    assert_eq!(summary.tasks_persisted, 2);
    assert_eq!(summary.tasks_fallback, 1);

    let created = task_store.created.borrow();
    assert_eq!(created[0].text, "meditate");
    assert_eq!(created[0].category, "🌱 Personal");
    assert_eq!(created[1].category, "🏠 Home");
}

#[test]
fn persist_failure_with_continue_policy_skips_only_that_task() {
    let conn = open_db_in_memory().unwrap();
    let note_store = SqliteNoteStore::new(&conn);
    let id = note_store
        .create_note("#Tasks chores", "#work\n- laundry\n- dishes")
        .unwrap();

    let config = test_config();
    let task_store = RecordingTaskStore::failing_first(1);
    let classifier = ScriptedClassifier::new(vec![]);
    let service = SweepService::new(&config, &note_store, &task_store, &classifier);

    let summary = service.run().unwrap();
    assert_eq!(summary.tasks_extracted, 2);
    assert_eq!(summary.tasks_persisted, 1);
    assert_eq!(summary.persist_failures, 1);
    assert_eq!(summary.notes_rewritten, 1);

    // The failed task's line must survive the rewrite as still pending.
    let body = note_store.fetch_note_body(id).unwrap();
    assert!(body.contains("<div>- laundry</div>"));
    assert!(!body.contains("dishes"));
}

#[test]
fn persist_failure_with_abort_policy_stops_the_run_before_rewrite() {
    let conn = open_db_in_memory().unwrap();
    let note_store = SqliteNoteStore::new(&conn);
    let original_body = "#work\n- laundry";
    let id = note_store.create_note("#Tasks chores", original_body).unwrap();

    let mut config = test_config();
    config.persist_failure_policy = PersistFailurePolicy::Abort;
    let task_store = RecordingTaskStore::failing_first(1);
    let classifier = ScriptedClassifier::new(vec![]);
    let service = SweepService::new(&config, &note_store, &task_store, &classifier);

    let err = service.run().unwrap_err();
    assert!(matches!(err, SweepError::TaskPersist { .. }));
    assert_eq!(note_store.fetch_note_body(id).unwrap(), original_body);
}

#[test]
fn noop_rewrite_mode_persists_but_leaves_notes_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let note_store = SqliteNoteStore::new(&conn);
    let original_body = "#work\n- laundry";
    let id = note_store.create_note("#Tasks chores", original_body).unwrap();

    let mut config = test_config();
    config.rewrite_mode = RewriteMode::NoOp;
    let task_store = RecordingTaskStore::new();
    let classifier = ScriptedClassifier::new(vec![]);
    let service = SweepService::new(&config, &note_store, &task_store, &classifier);

    let summary = service.run().unwrap();
    assert_eq!(summary.tasks_persisted, 1);
    assert_eq!(summary.notes_rewritten, 0);
    assert_eq!(note_store.fetch_note_body(id).unwrap(), original_body);
}

#[test]
fn flat_extraction_run_uses_the_implied_section() {
    let conn = open_db_in_memory().unwrap();
    let note_store = SqliteNoteStore::new(&conn);
    let id = note_store
        .create_note(
            "#personal errands",
            "#personal errands\n- water plants\ncall dentist\n// private",
        )
        .unwrap();

    let mut config = test_config();
    config.note_title_tag = "#personal".to_string();
    config.extraction_mode = ExtractionMode::FlatNonEmptyLine;
    let task_store = RecordingTaskStore::new();
    let classifier = ScriptedClassifier::new(vec![
        Ok("🏠 Home".to_string()),
        Ok("❤️ Mental Health".to_string()),
    ]);
    let service = SweepService::new(&config, &note_store, &task_store, &classifier);

    let summary = service.run().unwrap();
    assert_eq!(summary.tasks_extracted, 2);
    assert_eq!(summary.tasks_persisted, 2);

    // Title echo and comment survive; tasks are gone; the header comes
    // from the implied #personal tag.
    let body = note_store.fetch_note_body(id).unwrap();
    assert_eq!(
        body,
        "<div><h1>Personal</h1></div>\n<div>#personal errands</div>\n<div>// private</div>"
    );
}

#[test]
fn empty_candidate_set_is_a_clean_run() {
    let conn = open_db_in_memory().unwrap();
    let note_store = SqliteNoteStore::new(&conn);
    note_store.create_note("Diary", "nothing to sweep").unwrap();

    let config = test_config();
    let task_store = RecordingTaskStore::new();
    let classifier = ScriptedClassifier::new(vec![]);
    let service = SweepService::new(&config, &note_store, &task_store, &classifier);

    let summary = service.run().unwrap();
    assert_eq!(summary.notes_seen, 0);
    assert!(task_store.created.borrow().is_empty());
}
