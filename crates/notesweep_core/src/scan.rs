//! Note line scanner.
//!
//! # Responsibility
//! - Classify every raw document line into one structural kind.
//! - Keep the classification priority stable for extractor and rewriter.
//!
//! # Invariants
//! - Sentinel detection runs before every other rule; the glyph can
//!   appear standalone or lead a line with trailing payload.
//! - Section markers match whole trimmed lines only, never a tag that
//!   appears mid-sentence or behind a bullet marker.
//! - `Bullet` text has exactly one leading marker stripped.

use crate::model::task::SectionTag;
use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder glyph the host note editor stores for embedded
/// attachments: U+FFFC OBJECT REPLACEMENT CHARACTER.
pub const ATTACHMENT_SENTINEL: char = '\u{FFFC}';

/// Two-character prefix marking a line as a comment.
pub const COMMENT_PREFIX: &str = "//";

/// Single-glyph bullet markers recognized on task lines.
const BULLET_GLYPHS: &[char] = &['•', '-', '*'];

static ORDINAL_BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s+").expect("valid ordinal bullet regex"));

/// Structural classification of one document line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Whole-line match against a recognized `#tag`.
    SectionMarker(SectionTag),
    /// Bullet-marked line; payload is the marker-stripped trimmed text.
    Bullet(String),
    /// Any other non-structural line; payload is the trimmed text.
    Plain(String),
    /// Trimming yields the empty string.
    Blank,
    /// Trimmed line starts with [`COMMENT_PREFIX`].
    Comment,
    /// Attachment placeholder line.
    Sentinel,
    /// Trimmed line equals the document's own title, case-insensitively.
    TitleEcho,
}

/// Per-document inputs the scanner needs besides the line itself.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    /// The document's own title, used for title-echo detection.
    pub title: &'a str,
    /// Recognized section tags for marker detection.
    pub section_tags: &'a [SectionTag],
}

/// Classifies one raw line.
///
/// Rule priority: sentinel, section marker, comment, title echo, blank,
/// bullet, plain. Sentinel must come first because the glyph can sit
/// inside otherwise ordinary-looking whitespace; marker detection must
/// come before bullet detection so `#work` is never read as task text.
pub fn classify_line(line: &str, ctx: &ScanContext<'_>) -> LineKind {
    let trimmed = line.trim();

    if is_sentinel(trimmed) {
        return LineKind::Sentinel;
    }

    if let Some(tag) = ctx
        .section_tags
        .iter()
        .find(|tag| tag.matches_line(trimmed))
    {
        return LineKind::SectionMarker(tag.clone());
    }

    if trimmed.starts_with(COMMENT_PREFIX) {
        return LineKind::Comment;
    }

    let title = ctx.title.trim();
    if !trimmed.is_empty() && !title.is_empty() && eq_case_insensitive(trimmed, title) {
        return LineKind::TitleEcho;
    }

    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    if let Some(text) = strip_bullet_marker(trimmed) {
        return LineKind::Bullet(text.to_string());
    }

    LineKind::Plain(trimmed.to_string())
}

/// Classifies every line of a document body, in order.
pub fn scan_lines(body: &str, ctx: &ScanContext<'_>) -> Vec<LineKind> {
    body.lines().map(|line| classify_line(line, ctx)).collect()
}

fn is_sentinel(trimmed: &str) -> bool {
    trimmed.starts_with(ATTACHMENT_SENTINEL)
}

fn eq_case_insensitive(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

/// Strips exactly one bullet marker and surrounding whitespace.
///
/// Returns `None` when the line carries no recognized marker.
fn strip_bullet_marker(trimmed: &str) -> Option<&str> {
    let mut chars = trimmed.chars();
    if let Some(first) = chars.next() {
        if BULLET_GLYPHS.contains(&first) {
            return Some(chars.as_str().trim());
        }
    }

    ORDINAL_BULLET_RE
        .find(trimmed)
        .map(|marker| trimmed[marker.end()..].trim())
}
