//! Errors surfaced by backend calls.

use reqwest::StatusCode;
use thiserror::Error;

use crate::validation::collection_name_problem;

/// Failure of a single backend exchange.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Rejected client-side before any request was sent.
    #[error("invalid collection name '{name}': {reason}")]
    Validation { name: String, reason: &'static str },

    /// The backend answered 401: the session is missing or expired.
    #[error("session expired, please log in again")]
    Unauthorized,

    /// The backend could not be reached.
    #[error("error contacting backend")]
    Transport(#[from] reqwest::Error),

    /// Well-formed response carrying an `error` field.
    #[error("{0}")]
    Application(String),

    /// Any other non-success status.
    #[error("backend returned {0}")]
    Status(StatusCode),

    /// A success response without the expected fields.
    #[error("unexpected response from backend")]
    UnexpectedResponse,
}

impl GatewayError {
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Reject collection names the backend would refuse.
    pub fn check_collection_name(name: &str) -> Result<(), Self> {
        match collection_name_problem(name) {
            Some(reason) => Err(Self::Validation {
                name: name.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}
