//! Chat controller: login state, collections and the transcript.

mod chat;
mod error;

pub use chat::ChatController;
pub use error::ControllerError;

/// Assistant text appended when a question could not be answered.
pub const BACKEND_ERROR_TEXT: &str = "Error contacting backend";

/// Notice shown after the backend rejected the session.
pub const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please log in again.";
