//! Sweep run orchestration.
//!
//! # Responsibility
//! - Process candidate notes one at a time, strictly sequentially.
//! - Classify and persist each note's tasks in document order, then
//!   rewrite the note according to the configured mode.
//! - Apply the error policy per stage: discovery is fatal, fetch
//!   degrades to empty content, classification degrades to fallback,
//!   persistence honors the configured policy, rewrite failure is
//!   reported and skipped.
//!
//! # Invariants
//! - Only confirmed-persisted task records reach the rewriter.
//! - A rewrite/update failure never rolls back persisted tasks.
//! - The pipeline holds no state across runs.

use crate::classify::{Categorizer, CategoryOutcome, Classifier};
use crate::config::{PersistFailurePolicy, SweepConfig};
use crate::extract::extract_tasks;
use crate::model::task::TaskRecord;
use crate::provider::{NewTask, TaskStore, TaskStoreError};
use crate::repo::note_repo::{NoteStore, NoteStoreError, NoteSummary};
use crate::rewrite::{selective_rebuild, RewriteMode};
use crate::scan::ScanContext;
use chrono::Local;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Workflow status every new task starts in.
const NEW_TASK_STATUS: &str = "🔴 To Do";

/// Fatal sweep failure; non-fatal conditions are narrated and counted.
#[derive(Debug)]
pub enum SweepError {
    /// Candidate note discovery failed; nothing was processed.
    Discovery(NoteStoreError),
    /// A task persistence call failed under the abort policy.
    TaskPersist {
        task_text: String,
        source: TaskStoreError,
    },
}

impl Display for SweepError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovery(err) => write!(f, "note discovery failed: {err}"),
            Self::TaskPersist { task_text, source } => {
                write!(f, "persisting task \"{task_text}\" failed: {source}")
            }
        }
    }
}

impl Error for SweepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Discovery(err) => Some(err),
            Self::TaskPersist { source, .. } => Some(source),
        }
    }
}

/// Per-run result counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub notes_seen: usize,
    pub tasks_extracted: usize,
    pub tasks_persisted: usize,
    pub tasks_fallback: usize,
    pub persist_failures: usize,
    pub notes_rewritten: usize,
}

/// Sequential sweep pipeline over collaborator contracts.
pub struct SweepService<'a, N: NoteStore, T: TaskStore> {
    config: &'a SweepConfig,
    note_store: &'a N,
    task_store: &'a T,
    classifier: &'a dyn Classifier,
}

impl<'a, N: NoteStore, T: TaskStore> SweepService<'a, N, T> {
    pub fn new(
        config: &'a SweepConfig,
        note_store: &'a N,
        task_store: &'a T,
        classifier: &'a dyn Classifier,
    ) -> Self {
        Self {
            config,
            note_store,
            task_store,
            classifier,
        }
    }

    /// Runs one full sweep over all candidate notes.
    pub fn run(&self) -> Result<RunSummary, SweepError> {
        info!(
            "starting sweep: title filter `{}`, extraction {}, rewrite {}",
            self.config.note_title_tag,
            self.config.extraction_mode.as_config_value(),
            self.config.rewrite_mode.as_config_value()
        );

        let notes = self
            .note_store
            .list_candidate_notes(&self.config.note_title_tag)
            .map_err(SweepError::Discovery)?;

        if notes.is_empty() {
            info!("no candidate notes found; nothing to process");
            return Ok(RunSummary::default());
        }
        info!("found {} candidate note(s)", notes.len());

        let mut summary = RunSummary::default();
        for note in &notes {
            summary.notes_seen += 1;
            self.process_note(note, &mut summary)?;
        }

        info!(
            "sweep finished: {} note(s), {} task(s) extracted, {} persisted, {} fallback, {} persist failure(s), {} note(s) rewritten",
            summary.notes_seen,
            summary.tasks_extracted,
            summary.tasks_persisted,
            summary.tasks_fallback,
            summary.persist_failures,
            summary.notes_rewritten
        );
        Ok(summary)
    }

    fn process_note(
        &self,
        note: &NoteSummary,
        summary: &mut RunSummary,
    ) -> Result<(), SweepError> {
        let body = match self.note_store.fetch_note_body(note.id) {
            Ok(body) => body,
            Err(err) => {
                warn!("note `{}`: body fetch failed ({err}); treating as empty", note.name);
                String::new()
            }
        };

        let ctx = ScanContext {
            title: &note.name,
            section_tags: &self.config.section_tags,
        };
        let implied_section = self.config.implied_section_for_title(&note.name);
        let tasks = extract_tasks(&body, &ctx, self.config.extraction_mode, implied_section);

        info!("note `{}`: {} task(s) extracted", note.name, tasks.len());
        if tasks.is_empty() {
            return Ok(());
        }

        let categorizer = Categorizer::new(
            &self.config.rules,
            self.config.context.as_deref(),
            self.classifier,
        );
        let due_date = Local::now().format("%Y-%m-%d").to_string();

        let mut persisted: Vec<TaskRecord> = Vec::new();
        for mut task in tasks {
            summary.tasks_extracted += 1;

            let outcome = categorizer.categorize(&mut task);
            if outcome == CategoryOutcome::FellBack {
                summary.tasks_fallback += 1;
            }
            let category = task
                .category
                .clone()
                .unwrap_or_else(|| self.config.rules.fallback.clone());
            info!(
                "task \"{}\" -> {} ({})",
                task.text,
                category,
                outcome_label(outcome)
            );

            let request = NewTask {
                text: task.text.clone(),
                category,
                due_date: due_date.clone(),
                status: NEW_TASK_STATUS.to_string(),
            };
            match self.task_store.create_task(&request) {
                Ok(()) => {
                    summary.tasks_persisted += 1;
                    persisted.push(task);
                }
                Err(err) => match self.config.persist_failure_policy {
                    PersistFailurePolicy::Abort => {
                        return Err(SweepError::TaskPersist {
                            task_text: task.text,
                            source: err,
                        });
                    }
                    PersistFailurePolicy::Continue => {
                        summary.persist_failures += 1;
                        error!("failed to persist \"{}\": {err}; continuing", task.text);
                    }
                },
            }
        }

        if persisted.is_empty() {
            return Ok(());
        }
        self.rewrite_note(note, &body, &ctx, &persisted, summary);
        Ok(())
    }

    fn rewrite_note(
        &self,
        note: &NoteSummary,
        body: &str,
        ctx: &ScanContext<'_>,
        persisted: &[TaskRecord],
        summary: &mut RunSummary,
    ) {
        match self.config.rewrite_mode {
            RewriteMode::NoOp => {
                info!("note `{}`: left unchanged (no-op rewrite)", note.name);
            }
            RewriteMode::SelectiveRebuild => {
                let header = persisted
                    .iter()
                    .find_map(|task| task.section.as_ref())
                    .map(|tag| tag.display_name())
                    .unwrap_or_else(|| note.name.trim().trim_start_matches('#').to_string());

                let rebuilt = selective_rebuild(body, ctx, persisted, &header);
                let updated = self
                    .note_store
                    .update_note_body(note.id, &rebuilt.body)
                    .and_then(|()| self.note_store.update_note_title(note.id, &rebuilt.title));
                match updated {
                    Ok(()) => {
                        summary.notes_rewritten += 1;
                        info!(
                            "note `{}`: rewritten under header `{}`, {} task line(s) removed",
                            note.name,
                            header,
                            persisted.len()
                        );
                    }
                    Err(err) => {
                        // Persisted tasks stay persisted; the note keeps its
                        // pending lines until a later run.
                        error!("note `{}`: rewrite failed ({err}); tasks remain persisted", note.name);
                    }
                }
            }
        }
    }
}

fn outcome_label(outcome: CategoryOutcome) -> &'static str {
    match outcome {
        CategoryOutcome::Direct => "rule",
        CategoryOutcome::Classified => "model",
        CategoryOutcome::FellBack => "fallback",
    }
}
