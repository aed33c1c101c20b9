//! Structured error types for the export pipeline.
//!
//! [`ExportError`] is what callers of an export see. Precondition and
//! password failures carry field-specific detail; everything that goes wrong
//! inside the pipeline is collapsed into one generic message, with the real
//! cause kept as the error `source()` for logging.

use std::io;

use thiserror::Error;

use crate::security::PasswordViolation;

/// The failure signal returned by the outermost export calls.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No mounted element with the requested id.
    #[error("Capture target '{0}' not found")]
    MissingCaptureTarget(String),

    /// A required document field is blank.
    #[error("Please enter your {0} before exporting")]
    MissingField(&'static str),

    /// The password config breaks one or more rules.
    #[error("Invalid password settings: {}", join_violations(.0))]
    PasswordPolicy(Vec<PasswordViolation>),

    /// An export is already running for this session.
    #[error("An export is already in progress")]
    AlreadyGenerating,

    #[error("Failed to generate PDF. Please try again.")]
    Generation(#[source] PipelineFailure),

    #[error("Failed to publish portfolio. Please try again.")]
    Publish(#[source] PipelineFailure),
}

fn join_violations(violations: &[PasswordViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ExportError {
    /// Itemized messages for a password policy failure, empty otherwise.
    pub fn violations(&self) -> Vec<String> {
        match self {
            ExportError::PasswordPolicy(v) => v.iter().map(|v| v.to_string()).collect(),
            _ => Vec::new(),
        }
    }
}

/// What actually went wrong inside the pipeline. Diagnostic only.
#[derive(Error, Debug)]
pub enum PipelineFailure {
    #[error("capture failed: {0}")]
    Capture(String),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("document assembly failed: {0}")]
    Assembly(String),

    #[error("saving the file failed: {0}")]
    Save(#[from] io::Error),
}

/// A document snapshot that failed to parse.
#[derive(Error, Debug)]
#[error("Failed to parse resume data: {source}{}", format_hint(.hint))]
pub struct SnapshotError {
    pub source: serde_json::Error,
    pub hint: String,
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the resume schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input. Is the JSON truncated?".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        SnapshotError { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_generation_message_hides_cause() {
        let err = ExportError::Generation(PipelineFailure::Assembly("xref overflow".to_string()));
        assert_eq!(err.to_string(), "Failed to generate PDF. Please try again.");
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("xref overflow"));
    }

    #[test]
    fn test_password_policy_lists_violations() {
        let err = ExportError::PasswordPolicy(vec![
            PasswordViolation::UserTooShort,
            PasswordViolation::Identical,
        ]);
        assert_eq!(err.violations().len(), 2);
        assert!(err.to_string().contains("User and owner passwords must be different"));
    }

    #[test]
    fn test_snapshot_error_has_hint() {
        let err: SnapshotError = serde_json::from_str::<crate::model::ResumeData>("{\"fullName\": ")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("Hint:"));
    }
}
