use crate::models::VerificationStatus;
use crate::routes::Route;
use std::fmt;
use uuid::Uuid;

/// A single rejected form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("not signed in")]
    NotAuthenticated { redirect: Route },

    #[error("access denied, admin privileges required")]
    AccessDenied { redirect: Route },

    #[error("listing {id} is already {status}")]
    InvalidTransition { id: Uuid, status: VerificationStatus },

    #[error("{what} not found")]
    NotFound { what: String },

    /// Error body returned by the hosted backend
    #[error("backend returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("request aborted, view was closed")]
    Cancelled,

    #[error("configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
