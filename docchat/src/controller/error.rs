//! Controller error types.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::models::DocumentError;

/// Why a controller operation did not go through.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("select a collection first")]
    NoActiveCollection,

    #[error("question is empty")]
    EmptyQuestion,

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("failed to access session store")]
    Store(#[from] std::io::Error),

    /// The backend rejected the session; the controller is now logged out.
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    /// The response belongs to a session that is no longer current.
    #[error("response arrived after the session changed")]
    Stale,

    #[error(transparent)]
    Gateway(GatewayError),
}
