//! Backend gateway: the HTTP calls the chat client makes.
//!
//! Endpoints (relative to the backend base address):
//! - POST /create_session - form `username`, `password` -> `{session_id}`
//! - GET /list_collections - `{collections: [..]}`
//! - POST /upload_pdf - multipart `file`, `collection_name` -> `{message}`
//! - POST /query - JSON `{question, collection_name}` -> `{answer}` or `{error}`
//! - GET / - health banner `{message}`
//!
//! Every authenticated call carries the token in a `session_id` header.
//! Nothing is retried.

mod error;
mod http;

use async_trait::async_trait;

use crate::models::{Document, SessionToken};

pub use error::GatewayError;
pub use http::HttpGateway;

/// Text shown when `/query` returns neither an answer nor an error.
pub const NO_ANSWER: &str = "No answer";

/// Outcome of a question the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryReply {
    /// The generated answer.
    Answer(String),
    /// Application-level error reported inside a successful response.
    Error(String),
    /// Neither field was present.
    NoAnswer,
}

impl QueryReply {
    /// Text to show as the assistant message.
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) | Self::Error(text) => text,
            Self::NoAnswer => NO_ANSWER,
        }
    }
}

/// Calls the chat client makes against the backend.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Exchange credentials for a session token.
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<SessionToken, GatewayError>;

    /// Names of the collections visible to `session`.
    async fn list_collections(&self, session: &SessionToken) -> Result<Vec<String>, GatewayError>;

    /// Upload a PDF into `collection_name`, returning the backend's confirmation.
    ///
    /// The name is validated before anything is sent.
    async fn upload_document(
        &self,
        session: &SessionToken,
        document: Document,
        collection_name: &str,
    ) -> Result<String, GatewayError>;

    /// Ask a question against one collection.
    async fn submit_question(
        &self,
        session: &SessionToken,
        question: &str,
        collection_name: &str,
    ) -> Result<QueryReply, GatewayError>;

    /// Backend health banner.
    async fn health(&self) -> Result<String, GatewayError>;
}
