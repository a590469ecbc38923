//! Task categorization: rule-based mapping plus delegated classification.
//!
//! # Responsibility
//! - Assign every task record exactly one category from the closed set.
//! - Build the classification prompt and validate the response.
//! - Degrade to the fallback category on any failure; never abort a run
//!   from this stage.
//!
//! # Invariants
//! - A section with a direct mapping never triggers an external call.
//! - Response validation is exact and case-sensitive against the
//!   model-assisted category set.
//! - There is no retry; one failed call means one fallback assignment.

use crate::model::task::{SectionTag, TaskRecord};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error from a single classification call.
#[derive(Debug)]
pub enum ClassifyError {
    /// Request could not be sent or the response not read.
    Transport(String),
    /// Service answered with a non-success status.
    Rejected { status: u16, message: String },
    /// Response arrived but did not contain usable text.
    Malformed(String),
}

impl Display for ClassifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "classification transport error: {message}"),
            Self::Rejected { status, message } => {
                write!(f, "classification rejected with status {status}: {message}")
            }
            Self::Malformed(message) => write!(f, "malformed classification response: {message}"),
        }
    }
}

impl Error for ClassifyError {}

/// External single-shot classification collaborator.
///
/// No session state persists across calls; the categorizer owns prompt
/// construction and response validation entirely.
pub trait Classifier {
    fn classify(&self, prompt: &str) -> Result<String, ClassifyError>;
}

/// Deployment category policy: the closed set and its assignment rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRules {
    /// Deterministic section-to-category assignments (no external call).
    pub direct: Vec<(SectionTag, String)>,
    /// Categories the external classifier may answer with.
    pub assisted: Vec<String>,
    /// Category assigned when classification fails or answers outside
    /// the assisted set.
    pub fallback: String,
}

impl CategoryRules {
    /// Returns the direct category for a section, when one is mapped.
    pub fn direct_category(&self, section: &SectionTag) -> Option<&str> {
        self.direct
            .iter()
            .find(|(tag, _)| tag == section)
            .map(|(_, category)| category.as_str())
    }

    /// Exact, case-sensitive membership check against the assisted set.
    pub fn is_assisted_category(&self, value: &str) -> bool {
        self.assisted.iter().any(|category| category == value)
    }
}

/// How a task received its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOutcome {
    /// Deterministic section mapping.
    Direct,
    /// Validated answer from the external classifier.
    Classified,
    /// Fallback category after a failed or unrecognized answer.
    FellBack,
}

/// Categorizer stage over a classification collaborator.
pub struct Categorizer<'a> {
    rules: &'a CategoryRules,
    context: Option<&'a str>,
    classifier: &'a dyn Classifier,
}

impl<'a> Categorizer<'a> {
    pub fn new(
        rules: &'a CategoryRules,
        context: Option<&'a str>,
        classifier: &'a dyn Classifier,
    ) -> Self {
        Self {
            rules,
            context,
            classifier,
        }
    }

    /// Assigns the final category for one record.
    ///
    /// Never fails: classification errors and unrecognized answers both
    /// degrade to the configured fallback category.
    pub fn categorize(&self, task: &mut TaskRecord) -> CategoryOutcome {
        if let Some(category) = task
            .section
            .as_ref()
            .and_then(|section| self.rules.direct_category(section))
        {
            task.category = Some(category.to_string());
            return CategoryOutcome::Direct;
        }

        let prompt = build_prompt(self.context, &self.rules.assisted, &task.text);
        match self.classifier.classify(&prompt) {
            Ok(answer) => {
                let answer = answer.trim().to_string();
                if self.rules.is_assisted_category(&answer) {
                    debug!("event=classify module=classify status=ok answer={answer}");
                    task.category = Some(answer);
                    CategoryOutcome::Classified
                } else {
                    warn!(
                        "event=classify module=classify status=unrecognized answer=`{answer}` fallback={}",
                        self.rules.fallback
                    );
                    task.category = Some(self.rules.fallback.clone());
                    CategoryOutcome::FellBack
                }
            }
            Err(err) => {
                warn!(
                    "event=classify module=classify status=error error={err} fallback={}",
                    self.rules.fallback
                );
                task.category = Some(self.rules.fallback.clone());
                CategoryOutcome::FellBack
            }
        }
    }
}

/// Builds the single-shot classification prompt.
///
/// Layout: optional static context block, the fixed instruction with the
/// assisted category list, then the task text.
pub fn build_prompt(context: Option<&str>, categories: &[String], task_text: &str) -> String {
    let mut prompt = String::new();

    if let Some(context) = context {
        let context = context.trim();
        if !context.is_empty() {
            prompt.push_str("CONTEXT FOR BETTER CLASSIFICATION:\n");
            prompt.push_str(context);
            prompt.push_str("\n\n---\n\n");
        }
    }

    prompt.push_str("Classify this task into exactly ONE of these categories:\n\nCATEGORIES:\n");
    for category in categories {
        prompt.push_str("- ");
        prompt.push_str(category);
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "\nTASK: \"{task_text}\"\n\nReturn ONLY the category exactly as listed, nothing else."
    ));

    prompt
}
