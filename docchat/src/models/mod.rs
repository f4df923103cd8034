//! Data models for docchat entities.

mod document;
mod message;
mod session;
mod transcript;

pub use document::{Document, DocumentError};
pub use message::{Message, MessageRole};
pub use session::SessionToken;
pub use transcript::Transcript;
