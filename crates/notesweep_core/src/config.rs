//! Run configuration loaded once at process start.
//!
//! # Responsibility
//! - Collect credentials, category policy, extraction/rewrite modes and
//!   optional context text into one explicit struct.
//! - Validate configuration before any collaborator is constructed.
//!
//! # Invariants
//! - Core stages receive configuration by reference; no ambient global
//!   state exists inside the core.
//! - A missing context file is a normal state, never an error.

use crate::classify::CategoryRules;
use crate::extract::ExtractionMode;
use crate::model::task::{SectionTag, SectionTagError};
use crate::rewrite::RewriteMode;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Environment variable names read by [`SweepConfig::from_env`].
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_NOTION_TOKEN: &str = "NOTION_TOKEN";
pub const ENV_TASKS_DATABASE_ID: &str = "TASKS_DATABASE_ID";
pub const ENV_EXTRACTION_MODE: &str = "NOTESWEEP_EXTRACTION_MODE";
pub const ENV_REWRITE_MODE: &str = "NOTESWEEP_REWRITE_MODE";
pub const ENV_PERSIST_FAILURE_POLICY: &str = "NOTESWEEP_ON_PERSIST_FAILURE";
pub const ENV_CONTEXT_FILE: &str = "NOTESWEEP_CONTEXT_FILE";

const DEFAULT_CONTEXT_FILE: &str = "context.md";
const DEFAULT_NOTE_TITLE_TAG: &str = "#Tasks";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";

/// What a single task-persistence failure does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistFailurePolicy {
    /// Abort the entire run immediately.
    Abort,
    /// Log the failure and continue with the remaining tasks.
    Continue,
}

impl PersistFailurePolicy {
    /// Parses a configuration value; returns `None` for unknown input.
    pub fn from_config_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Some(Self::Abort),
            "continue" => Some(Self::Continue),
            _ => None,
        }
    }

    /// Canonical configuration spelling.
    pub fn as_config_value(self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Continue => "continue",
        }
    }
}

/// Configuration error raised at startup, before any work happens.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is absent or blank.
    MissingVar(&'static str),
    /// An optional variable carries an unsupported value.
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Section tag defaults or overrides failed to parse.
    InvalidSectionTag(SectionTagError),
    /// Category policy is structurally unusable.
    InvalidCategoryRules(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVar(var) => write!(f, "required environment variable `{var}` is not set"),
            Self::InvalidValue {
                var,
                value,
                expected,
            } => write!(f, "`{var}` has unsupported value `{value}`; expected {expected}"),
            Self::InvalidSectionTag(err) => write!(f, "{err}"),
            Self::InvalidCategoryRules(message) => write!(f, "invalid category rules: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSectionTag(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SectionTagError> for ConfigError {
    fn from(value: SectionTagError) -> Self {
        Self::InvalidSectionTag(value)
    }
}

/// Full run configuration, constructed once and passed by reference.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Anthropic Messages API key.
    pub anthropic_api_key: String,
    /// Model id used for classification calls.
    pub anthropic_model: String,
    /// Notion integration token.
    pub notion_token: String,
    /// Target Notion database for created tasks.
    pub tasks_database_id: String,
    /// Substring a note title must carry to be a sweep candidate.
    pub note_title_tag: String,
    /// Recognized section tags, canonical order = configuration order.
    pub section_tags: Vec<SectionTag>,
    /// Category policy: direct mappings, assisted set, fallback.
    pub rules: CategoryRules,
    /// Which lines count as tasks.
    pub extraction_mode: ExtractionMode,
    /// What happens to swept documents.
    pub rewrite_mode: RewriteMode,
    /// Whether one persistence failure aborts the run.
    pub persist_failure_policy: PersistFailurePolicy,
    /// Optional static context block for classification prompts.
    pub context: Option<String>,
}

impl SweepConfig {
    /// Loads configuration from the environment.
    ///
    /// Credentials are required; modes fall back to defaults
    /// (`hashtag-scoped-bullets`, `selective-rebuild`, `continue`); the
    /// context file is read when present and silently skipped otherwise.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            anthropic_api_key: require_var(ENV_ANTHROPIC_API_KEY)?,
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            notion_token: require_var(ENV_NOTION_TOKEN)?,
            tasks_database_id: require_var(ENV_TASKS_DATABASE_ID)?,
            note_title_tag: DEFAULT_NOTE_TITLE_TAG.to_string(),
            section_tags: default_section_tags()?,
            rules: default_category_rules()?,
            extraction_mode: parse_var(
                ENV_EXTRACTION_MODE,
                ExtractionMode::HashtagScopedBullets,
                ExtractionMode::from_config_value,
                "hashtag-scoped-bullets|flat-non-empty-line",
            )?,
            rewrite_mode: parse_var(
                ENV_REWRITE_MODE,
                RewriteMode::SelectiveRebuild,
                RewriteMode::from_config_value,
                "no-op|selective-rebuild",
            )?,
            persist_failure_policy: parse_var(
                ENV_PERSIST_FAILURE_POLICY,
                PersistFailurePolicy::Continue,
                PersistFailurePolicy::from_config_value,
                "abort|continue",
            )?,
            context: load_context_text(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks structural invariants of the loaded configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.assisted.is_empty() {
            return Err(ConfigError::InvalidCategoryRules(
                "assisted category set cannot be empty",
            ));
        }
        if self.rules.fallback.trim().is_empty() {
            return Err(ConfigError::InvalidCategoryRules(
                "fallback category cannot be blank",
            ));
        }
        if self.section_tags.is_empty() {
            return Err(ConfigError::InvalidCategoryRules(
                "at least one section tag must be configured",
            ));
        }
        Ok(())
    }

    /// Finds the section tag a note title implies, for flat extraction.
    pub fn implied_section_for_title(&self, title: &str) -> Option<&SectionTag> {
        let lowered = title.to_lowercase();
        self.section_tags
            .iter()
            .find(|tag| lowered.contains(tag.as_str()))
    }
}

fn require_var(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var)),
    }
}

fn parse_var<T>(
    var: &'static str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            parse(&value).ok_or(ConfigError::InvalidValue {
                var,
                value,
                expected,
            })
        }
        _ => Ok(default),
    }
}

/// Deployment default: `#work` maps directly, `#personal` is
/// model-assisted.
fn default_section_tags() -> Result<Vec<SectionTag>, SectionTagError> {
    Ok(vec![
        SectionTag::parse("#work")?,
        SectionTag::parse("#personal")?,
    ])
}

fn default_category_rules() -> Result<CategoryRules, SectionTagError> {
    Ok(CategoryRules {
        direct: vec![(SectionTag::parse("#work")?, "💼 Work".to_string())],
        assisted: vec![
            "🏃‍♂️ Physical Health".to_string(),
            "🌱 Personal".to_string(),
            "🍻 Interpersonal".to_string(),
            "❤️ Mental Health".to_string(),
            "🏠 Home".to_string(),
        ],
        fallback: "🌱 Personal".to_string(),
    })
}

/// Reads the optional static context block.
///
/// Any read failure, including a missing file, degrades to "no context".
fn load_context_text() -> Option<String> {
    let path = std::env::var(ENV_CONTEXT_FILE).unwrap_or_else(|_| DEFAULT_CONTEXT_FILE.to_string());
    match std::fs::read_to_string(Path::new(&path)) {
        Ok(text) if !text.trim().is_empty() => {
            info!("event=context_load module=config status=ok path={path}");
            Some(text)
        }
        _ => {
            info!("event=context_load module=config status=absent path={path}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{default_category_rules, default_section_tags, PersistFailurePolicy, SweepConfig};
    use crate::extract::ExtractionMode;
    use crate::rewrite::RewriteMode;

    fn test_config() -> SweepConfig {
        SweepConfig {
            anthropic_api_key: "key".to_string(),
            anthropic_model: "claude-3-haiku-20240307".to_string(),
            notion_token: "token".to_string(),
            tasks_database_id: "db".to_string(),
            note_title_tag: "#Tasks".to_string(),
            section_tags: default_section_tags().unwrap(),
            rules: default_category_rules().unwrap(),
            extraction_mode: ExtractionMode::HashtagScopedBullets,
            rewrite_mode: RewriteMode::SelectiveRebuild,
            persist_failure_policy: PersistFailurePolicy::Continue,
            context: None,
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        test_config().validate().expect("defaults should validate");
    }

    #[test]
    fn validate_rejects_empty_assisted_set_and_blank_fallback() {
        let mut config = test_config();
        config.rules.assisted.clear();
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.rules.fallback = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn persist_policy_parsing_round_trips() {
        for policy in [PersistFailurePolicy::Abort, PersistFailurePolicy::Continue] {
            assert_eq!(
                PersistFailurePolicy::from_config_value(policy.as_config_value()),
                Some(policy)
            );
        }
        assert_eq!(PersistFailurePolicy::from_config_value("retry"), None);
    }

    #[test]
    fn implied_section_matches_title_case_insensitively() {
        let config = test_config();
        let implied = config.implied_section_for_title("#Personal errands");
        assert_eq!(implied.map(|tag| tag.as_str()), Some("#personal"));
        assert!(config.implied_section_for_title("Shopping list").is_none());
    }
}
