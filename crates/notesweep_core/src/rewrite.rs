//! Idempotent document rewriting after successful extraction.
//!
//! # Responsibility
//! - Compute the kept-line sequence: drop persisted task source lines,
//!   recognized section markers and sentinel lines; keep everything else
//!   verbatim.
//! - Render the kept lines back into the note store's block
//!   representation under a single reconstructed header.
//!
//! # Invariants
//! - One source line is consumed per persisted record, first unconsumed
//!   occurrence wins.
//! - A line that produced no confirmed-persisted record is never dropped.
//! - Re-running the kept-line computation on rendered output with an
//!   empty persisted set drops nothing.

use crate::model::task::TaskRecord;
use crate::scan::{classify_line, LineKind, ScanContext};
use std::collections::HashMap;

/// What happens to a source document after its tasks are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteMode {
    /// Leave the source document completely unchanged.
    NoOp,
    /// Rebuild the document with processed lines removed.
    SelectiveRebuild,
}

impl RewriteMode {
    /// Parses a configuration value; returns `None` for unknown input.
    pub fn from_config_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "no-op" => Some(Self::NoOp),
            "selective-rebuild" => Some(Self::SelectiveRebuild),
            _ => None,
        }
    }

    /// Canonical configuration spelling.
    pub fn as_config_value(self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::SelectiveRebuild => "selective-rebuild",
        }
    }
}

/// Rebuilt note produced by selective rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuiltNote {
    /// New note title: the reconstructed header text, not the literal
    /// original title.
    pub title: String,
    /// New block-rendered body.
    pub body: String,
}

/// Computes the kept-line sequence for selective rebuild.
///
/// Lines are returned verbatim (untrimmed) in source order. Dropped
/// lines are exactly: one occurrence per persisted record whose
/// extracted text matches, every recognized section marker, and every
/// sentinel line.
pub fn kept_lines<'a>(
    body: &'a str,
    ctx: &ScanContext<'_>,
    persisted: &[TaskRecord],
) -> Vec<&'a str> {
    let mut unconsumed: HashMap<&str, usize> = HashMap::new();
    for task in persisted {
        *unconsumed.entry(task.text.as_str()).or_insert(0) += 1;
    }

    let mut kept = Vec::new();
    for line in body.lines() {
        match classify_line(line, ctx) {
            LineKind::SectionMarker(_) | LineKind::Sentinel => {}
            LineKind::Bullet(text) | LineKind::Plain(text) => {
                match unconsumed.get_mut(text.as_str()) {
                    Some(count) if *count > 0 => *count -= 1,
                    _ => kept.push(line),
                }
            }
            LineKind::Blank | LineKind::Comment | LineKind::TitleEcho => kept.push(line),
        }
    }

    kept
}

/// Renders kept lines into the note store's block representation.
///
/// One header element, then one block per kept line; blank lines become
/// an explicit line-break block.
pub fn render_note_body(header: &str, kept: &[&str]) -> String {
    let mut body = format!("<div><h1>{header}</h1></div>");
    for line in kept {
        body.push('\n');
        if line.trim().is_empty() {
            body.push_str("<div><br></div>");
        } else {
            body.push_str(&format!("<div>{line}</div>"));
        }
    }
    body
}

/// Rebuilds a document after its persisted tasks were confirmed.
///
/// The header (and new title) is reconstructed from the processed
/// section tag, not copied from the original title text.
pub fn selective_rebuild(
    body: &str,
    ctx: &ScanContext<'_>,
    persisted: &[TaskRecord],
    header: &str,
) -> RebuiltNote {
    let kept = kept_lines(body, ctx, persisted);
    RebuiltNote {
        title: header.to_string(),
        body: render_note_body(header, &kept),
    }
}

#[cfg(test)]
mod tests {
    use super::{kept_lines, selective_rebuild, RewriteMode};
    use crate::model::task::{SectionTag, TaskRecord};
    use crate::scan::ScanContext;

    fn tags() -> Vec<SectionTag> {
        vec![
            SectionTag::parse("#work").unwrap(),
            SectionTag::parse("#personal").unwrap(),
        ]
    }

    fn persisted(texts: &[&str]) -> Vec<TaskRecord> {
        texts
            .iter()
            .map(|text| TaskRecord {
                text: (*text).to_string(),
                section: Some(SectionTag::parse("#work").unwrap()),
                category: Some("💼 Work".to_string()),
            })
            .collect()
    }

    #[test]
    fn mode_parsing_round_trips() {
        for mode in [RewriteMode::NoOp, RewriteMode::SelectiveRebuild] {
            assert_eq!(
                RewriteMode::from_config_value(mode.as_config_value()),
                Some(mode)
            );
        }
        assert_eq!(RewriteMode::from_config_value("partial"), None);
    }

    #[test]
    fn rebuild_drops_persisted_markers_and_sentinels_only() {
        let tags = tags();
        let ctx = ScanContext {
            title: "#Tasks",
            section_tags: &tags,
        };
        let body = "#Work\n- laundry\n// keep this";
        let rebuilt = selective_rebuild(body, &ctx, &persisted(&["laundry"]), "Work");
        assert_eq!(rebuilt.title, "Work");
        assert_eq!(
            rebuilt.body,
            "<div><h1>Work</h1></div>\n<div>// keep this</div>"
        );
    }

    #[test]
    fn unpersisted_task_lines_are_retained_verbatim() {
        let tags = tags();
        let ctx = ScanContext {
            title: "#Tasks",
            section_tags: &tags,
        };
        let body = "#work\n- done task\n- still pending\n\nloose text";
        let kept = kept_lines(body, &ctx, &persisted(&["done task"]));
        assert_eq!(kept, vec!["- still pending", "", "loose text"]);
    }

    #[test]
    fn duplicate_text_consumes_first_unconsumed_occurrence() {
        let tags = tags();
        let ctx = ScanContext {
            title: "#Tasks",
            section_tags: &tags,
        };
        let body = "#work\n- call mom\n- call mom\n- call mom";

        // One persisted record: only the first occurrence goes.
        let kept = kept_lines(body, &ctx, &persisted(&["call mom"]));
        assert_eq!(kept, vec!["- call mom", "- call mom"]);

        // Two persisted records: first two occurrences go.
        let kept = kept_lines(body, &ctx, &persisted(&["call mom", "call mom"]));
        assert_eq!(kept, vec!["- call mom"]);
    }

    #[test]
    fn rebuild_on_own_output_with_empty_set_is_a_fixed_point() {
        let tags = tags();
        let ctx = ScanContext {
            title: "#Tasks",
            section_tags: &tags,
        };
        let body = "#work\n- laundry\n// keep this\n\ntrailing note\n\u{FFFC}";
        let rebuilt = selective_rebuild(body, &ctx, &persisted(&["laundry"]), "Work");

        let second_ctx = ScanContext {
            title: &rebuilt.title,
            section_tags: &tags,
        };
        let kept_again = kept_lines(&rebuilt.body, &second_ctx, &[]);
        assert_eq!(
            kept_again,
            rebuilt.body.lines().collect::<Vec<_>>(),
            "no further lines may be dropped"
        );
    }

    #[test]
    fn no_data_loss_every_kept_line_is_verbatim_source() {
        let tags = tags();
        let ctx = ScanContext {
            title: "Mixed",
            section_tags: &tags,
        };
        let body = "Mixed\n#personal\n- swept away\nplain survivor\n// comment\n\n\u{FFFC}";
        let source_lines: Vec<&str> = body.lines().collect();
        let kept = kept_lines(body, &ctx, &persisted(&["swept away"]));
        for line in &kept {
            assert!(source_lines.contains(line));
        }
        assert_eq!(kept, vec!["Mixed", "plain survivor", "// comment", ""]);
    }

    #[test]
    fn blank_kept_lines_render_as_line_break_blocks() {
        let tags = tags();
        let ctx = ScanContext {
            title: "Inbox",
            section_tags: &tags,
        };
        let rebuilt = selective_rebuild("before\n\nafter", &ctx, &[], "Inbox");
        assert_eq!(
            rebuilt.body,
            "<div><h1>Inbox</h1></div>\n<div>before</div>\n<div><br></div>\n<div>after</div>"
        );
    }
}
