use thiserror::Error;

/// Errors that can occur while building, mutating or configuring a document graph.
///
/// Only the fail-fast paths (construction, graph mutation, lifecycle and
/// configuration) produce these. Detection, resolution and scoring report
/// partial results instead of failing.
#[derive(Error, Debug)]
pub enum DocGraphError {
    #[error("validation error: {message} (field: {field})")]
    Validation { field: String, message: String },

    #[error("structure error: {message}")]
    Structure { message: String },

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: String, id: String },

    #[error("state error: {message}")]
    State { message: String },

    #[error("build error: {message} (document: {document_id})")]
    Build { document_id: String, message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocGraphError {
    /// Shorthand for a [`DocGraphError::Validation`] naming the violated field.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        DocGraphError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`DocGraphError::Structure`].
    pub fn structure(message: impl Into<String>) -> Self {
        DocGraphError::Structure {
            message: message.into(),
        }
    }
}

/// Convenience alias for results using `DocGraphError`.
pub type Result<T> = std::result::Result<T, DocGraphError>;
