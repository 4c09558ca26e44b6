//! Error types for presentation extraction and querying.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The container could not be turned into a presentation.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The caller supplied an invalid request.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Fatal build errors. A presentation is either fully built or not at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The bytes are not a readable ZIP container.
    #[error("Not a valid presentation archive: {0}")]
    InvalidArchive(String),

    /// A part the model cannot be built without is absent.
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// A part exists but is not well-formed XML.
    #[error("Malformed XML in part {part}: {message}")]
    MalformedXml { part: String, message: String },
}

/// Caller errors, raised before any extraction or evaluation starts.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Search criteria must be a JSON object.
    #[error("Search criteria must be an object, got {found}")]
    CriteriaNotObject { found: String },

    /// A top-level criteria group that the grammar does not know.
    #[error("Unknown criteria group '{group}' (allowed: {allowed})")]
    UnknownGroup { group: String, allowed: String },

    /// An operator that is not allowed for the group.
    #[error("Unknown operator '{operator}' in '{group}' (allowed: {allowed})")]
    UnknownOperator {
        group: String,
        operator: String,
        allowed: String,
    },

    /// An operator value of the wrong JSON type.
    #[error("'{group}.{operator}' expects {expected}, got {found}")]
    InvalidValue {
        group: String,
        operator: String,
        expected: String,
        found: String,
    },

    /// A regular expression that does not compile.
    #[error("Invalid regular expression '{pattern}' in {context}: {message}")]
    InvalidRegex {
        context: String,
        pattern: String,
        message: String,
    },

    /// A formatting kind outside the supported set.
    #[error("Unknown formatting kind '{kind}' (allowed: {allowed})")]
    UnknownFormattingKind {
        #[serde(rename = "formatting_kind")]
        kind: String,
        allowed: String,
    },

    /// A projection field the query engine cannot produce.
    #[error("Unknown return field '{field}' (allowed: {allowed})")]
    UnknownReturnField { field: String, allowed: String },

    /// A table output format the extractor cannot produce.
    #[error("Unknown output format '{format}' (allowed: {allowed})")]
    UnknownOutputFormat { format: String, allowed: String },

    /// A slide number that does not exist in the presentation.
    #[error("Slide number {number} is out of range (1-{total})")]
    SlideOutOfRange { number: i64, total: usize },

    /// A slide selection that cannot be parsed.
    #[error("Invalid slide selection '{selection}': {reason}")]
    InvalidSlideSelection { selection: String, reason: String },
}

/// Kinds of non-fatal problems found while building a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A run's hyperlink relationship id has no target.
    UnresolvedHyperlink,
    /// A slide layout relationship points at a missing part.
    MissingLayout,
    /// A notes relationship points at a missing or unreadable part.
    MissingNotes,
    /// A slide was listed by more than one section.
    DuplicateSectionMembership,
    /// A section refers to a slide id the presentation does not list.
    UnknownSectionSlide,
    /// A merge-continuation cell with no spanning origin.
    OrphanMergedCell,
}

/// A non-fatal problem; the affected field is emitted empty and processing continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionWarning {
    /// Slide the warning belongs to, if any.
    pub slide_number: Option<usize>,
    pub kind: WarningKind,
    pub message: String,
}

impl ResolutionWarning {
    /// Create a warning attached to a slide.
    pub fn for_slide(slide_number: usize, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            slide_number: Some(slide_number),
            kind,
            message: message.into(),
        }
    }

    /// Create a presentation-level warning.
    pub fn global(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            slide_number: None,
            kind,
            message: message.into(),
        }
    }
}

/// Describe a JSON value's type for validation messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
    .to_string()
}
