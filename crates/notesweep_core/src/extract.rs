//! Task extraction over the scanner's annotation stream.
//!
//! # Responsibility
//! - Turn classified lines into ordered [`TaskRecord`]s under one of two
//!   extraction modes.
//! - Own the "current section" cursor semantics for hashtag scoping.
//!
//! # Invariants
//! - Emitted records appear in document line order.
//! - No record carries empty trimmed text.
//! - Bullets seen before any section marker are silently ignored in
//!   hashtag-scoped mode; that is normal input, not an error.

use crate::model::task::{SectionTag, TaskRecord};
use crate::scan::{scan_lines, LineKind, ScanContext};

/// Which lines of a document count as tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Bullet lines under a recognized `#tag` marker.
    HashtagScopedBullets,
    /// Every non-empty line that is not structural (blank, comment,
    /// sentinel, title echo); the whole document shares one implied
    /// section.
    FlatNonEmptyLine,
}

impl ExtractionMode {
    /// Parses a configuration value; returns `None` for unknown input.
    pub fn from_config_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hashtag-scoped-bullets" => Some(Self::HashtagScopedBullets),
            "flat-non-empty-line" => Some(Self::FlatNonEmptyLine),
            _ => None,
        }
    }

    /// Canonical configuration spelling.
    pub fn as_config_value(self) -> &'static str {
        match self {
            Self::HashtagScopedBullets => "hashtag-scoped-bullets",
            Self::FlatNonEmptyLine => "flat-non-empty-line",
        }
    }
}

/// Extracts ordered task records from a document body.
///
/// `implied_section` is only consulted in flat mode, where the whole
/// document belongs to the section implied by the note's own title.
pub fn extract_tasks(
    body: &str,
    ctx: &ScanContext<'_>,
    mode: ExtractionMode,
    implied_section: Option<&SectionTag>,
) -> Vec<TaskRecord> {
    match mode {
        ExtractionMode::HashtagScopedBullets => extract_scoped_bullets(body, ctx),
        ExtractionMode::FlatNonEmptyLine => extract_flat(body, ctx, implied_section),
    }
}

fn extract_scoped_bullets(body: &str, ctx: &ScanContext<'_>) -> Vec<TaskRecord> {
    let mut tasks = Vec::new();
    let mut current_section: Option<SectionTag> = None;

    for kind in scan_lines(body, ctx) {
        match kind {
            LineKind::SectionMarker(tag) => {
                current_section = Some(tag);
            }
            LineKind::Bullet(text) => {
                if text.is_empty() {
                    continue;
                }
                if let Some(section) = current_section.as_ref() {
                    tasks.push(TaskRecord::new(text, Some(section.clone())));
                }
            }
            _ => {}
        }
    }

    tasks
}

fn extract_flat(
    body: &str,
    ctx: &ScanContext<'_>,
    implied_section: Option<&SectionTag>,
) -> Vec<TaskRecord> {
    let mut tasks = Vec::new();

    for kind in scan_lines(body, ctx) {
        let text = match kind {
            LineKind::Bullet(text) | LineKind::Plain(text) => text,
            _ => continue,
        };
        if text.is_empty() {
            continue;
        }
        tasks.push(TaskRecord::new(text, implied_section.cloned()));
    }

    tasks
}
