//! Login state machine and chat flow.
//!
//! The controller is either logged out or logged in with a session token.
//! Every login, logout and expiry bumps a generation counter; requests carry
//! a [`Ticket`] taken when they were issued, and completions whose ticket is
//! no longer current are discarded instead of being applied to the new
//! session.

use std::path::Path;

use tracing::{debug, info, warn};

use super::{ControllerError, BACKEND_ERROR_TEXT, SESSION_EXPIRED_NOTICE};
use crate::gateway::{Gateway, GatewayError, QueryReply};
use crate::models::{Document, Message, SessionToken, Transcript};
use crate::session::SessionStore;

/// Whether the client holds a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn(SessionToken),
}

/// Proof of the session a request was issued under.
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    session: SessionToken,
}

/// A question whose user message is already in the transcript.
#[derive(Debug, Clone)]
pub struct PendingQuestion {
    pub ticket: Ticket,
    pub question: String,
    pub collection: String,
}

/// Orchestrates the gateway, the session store and the transcript.
pub struct ChatController<G, S> {
    gateway: G,
    store: S,
    state: SessionState,
    generation: u64,
    transcript: Transcript,
    collections: Vec<String>,
    active_collection: Option<String>,
    notice: Option<String>,
}

impl<G: Gateway, S: SessionStore> ChatController<G, S> {
    /// Create a logged-out controller. Call [`start`](Self::start) to pick up a persisted session.
    pub const fn new(gateway: G, store: S) -> Self {
        Self {
            gateway,
            store,
            state: SessionState::LoggedOut,
            generation: 0,
            transcript: Transcript::new(),
            collections: Vec::new(),
            active_collection: None,
            notice: None,
        }
    }

    // === Accessors ===

    pub const fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn(_))
    }

    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    pub fn active_collection(&self) -> Option<&str> {
        self.active_collection.as_deref()
    }

    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Take the pending user notice (e.g. session expiry), if any.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    // === Session lifecycle ===

    /// Resume a persisted session, if there is one.
    ///
    /// The controller starts logged in optimistically and lists collections;
    /// if the backend rejects the token it falls back to logged out and sets
    /// the expiry notice.
    pub async fn start(&mut self) -> Result<(), ControllerError> {
        let Some(token) = self.store.load()? else {
            debug!("no persisted session");
            return Ok(());
        };

        info!("resuming persisted session");
        self.enter(token);
        match self.refresh_collections().await {
            Ok(_) | Err(ControllerError::SessionExpired) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Authenticate, persist the new session and list its collections.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ControllerError> {
        let token = self
            .gateway
            .authenticate(username, password)
            .await
            .map_err(ControllerError::Gateway)?;

        self.store.save(&token)?;
        self.leave();
        self.enter(token);
        info!(username, "logged in");

        self.refresh_collections().await.map(|_| ())
    }

    /// Forget the session and everything tied to it.
    pub fn logout(&mut self) -> Result<(), ControllerError> {
        self.leave();
        self.store.clear()?;
        info!("logged out");
        Ok(())
    }

    fn enter(&mut self, token: SessionToken) {
        self.generation += 1;
        self.state = SessionState::LoggedIn(token);
    }

    fn leave(&mut self) {
        self.generation += 1;
        self.state = SessionState::LoggedOut;
        self.transcript.clear();
        self.collections.clear();
        self.active_collection = None;
    }

    /// Drop the rejected session and notify the user.
    fn expire(&mut self) -> ControllerError {
        warn!("session rejected by backend");
        self.leave();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear session store");
        }
        self.notice = Some(SESSION_EXPIRED_NOTICE.to_string());
        ControllerError::SessionExpired
    }

    /// Convert a gateway failure, logging out on 401.
    fn fail(&mut self, err: GatewayError) -> ControllerError {
        if err.is_unauthorized() {
            self.expire()
        } else {
            ControllerError::Gateway(err)
        }
    }

    /// Take a ticket for a request under the current session.
    pub fn ticket(&self) -> Result<Ticket, ControllerError> {
        match &self.state {
            SessionState::LoggedIn(session) => Ok(Ticket {
                generation: self.generation,
                session: session.clone(),
            }),
            SessionState::LoggedOut => Err(ControllerError::NotLoggedIn),
        }
    }

    fn check_current(&self, ticket: &Ticket) -> Result<(), ControllerError> {
        if ticket.generation == self.generation && self.is_logged_in() {
            Ok(())
        } else {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale response"
            );
            Err(ControllerError::Stale)
        }
    }

    // === Collections ===

    /// List collections from the backend.
    pub async fn refresh_collections(&mut self) -> Result<&[String], ControllerError> {
        let ticket = self.ticket()?;
        let result = self.gateway.list_collections(&ticket.session).await;
        self.complete_refresh(&ticket, result)
    }

    /// Apply a list-collections result issued under `ticket`.
    pub fn complete_refresh(
        &mut self,
        ticket: &Ticket,
        result: Result<Vec<String>, GatewayError>,
    ) -> Result<&[String], ControllerError> {
        self.check_current(ticket)?;

        let collections = result.map_err(|e| self.fail(e))?;
        debug!(count = collections.len(), "collections refreshed");

        if self
            .active_collection
            .as_ref()
            .is_some_and(|active| !collections.contains(active))
        {
            info!("active collection no longer listed");
            self.active_collection = None;
        }
        self.collections = collections;
        Ok(&self.collections)
    }

    /// Make `name` the collection questions are asked against.
    pub fn select_collection(&mut self, name: &str) -> Result<(), ControllerError> {
        if !self.is_logged_in() {
            return Err(ControllerError::NotLoggedIn);
        }
        if !self.collections.iter().any(|c| c == name) {
            return Err(ControllerError::UnknownCollection(name.to_string()));
        }
        self.active_collection = Some(name.to_string());
        Ok(())
    }

    // === Upload ===

    /// Upload a PDF into `collection_name`, then refresh the collection list.
    ///
    /// Invalid names are rejected before the file is read or anything is sent.
    pub async fn upload(
        &mut self,
        path: &Path,
        collection_name: &str,
    ) -> Result<String, ControllerError> {
        let ticket = self.ticket()?;
        GatewayError::check_collection_name(collection_name).map_err(ControllerError::Gateway)?;
        let document = Document::from_path(path).await?;

        let result = self
            .gateway
            .upload_document(&ticket.session, document, collection_name)
            .await;
        let message = self.complete_upload(&ticket, result)?;

        match self.refresh_collections().await {
            Ok(_) => {}
            Err(ControllerError::SessionExpired) => return Err(ControllerError::SessionExpired),
            Err(e) => warn!(error = %e, "refresh after upload failed"),
        }
        Ok(message)
    }

    /// Apply an upload result issued under `ticket`.
    pub fn complete_upload(
        &mut self,
        ticket: &Ticket,
        result: Result<String, GatewayError>,
    ) -> Result<String, ControllerError> {
        self.check_current(ticket)?;
        let message = result.map_err(|e| self.fail(e))?;
        info!("document uploaded");
        Ok(message)
    }

    // === Questions ===

    /// Ask a question against the active collection.
    ///
    /// The user message is appended immediately and exactly one assistant
    /// message follows: the answer, the backend's error text, or
    /// [`BACKEND_ERROR_TEXT`] when the backend could not be reached. Only a
    /// rejected session escapes as an error.
    pub async fn send_question(&mut self, text: &str) -> Result<&Message, ControllerError> {
        let pending = self.prepare_question(text)?;
        let result = self
            .gateway
            .submit_question(&pending.ticket.session, &pending.question, &pending.collection)
            .await;
        self.complete_question(&pending, result)
    }

    /// Validate and record a question, returning what to send.
    ///
    /// Blank questions are rejected; anything else is kept exactly as typed.
    pub fn prepare_question(&mut self, question: &str) -> Result<PendingQuestion, ControllerError> {
        if question.trim().is_empty() {
            return Err(ControllerError::EmptyQuestion);
        }
        let ticket = self.ticket()?;
        let collection = self
            .active_collection
            .clone()
            .ok_or(ControllerError::NoActiveCollection)?;

        self.transcript.push(Message::user(question));
        Ok(PendingQuestion {
            ticket,
            question: question.to_string(),
            collection,
        })
    }

    /// Append the assistant reply for `pending`.
    pub fn complete_question(
        &mut self,
        pending: &PendingQuestion,
        result: Result<QueryReply, GatewayError>,
    ) -> Result<&Message, ControllerError> {
        self.check_current(&pending.ticket)?;

        let content = match result {
            Ok(reply) => {
                if let QueryReply::Error(ref e) = reply {
                    debug!(error = %e, "backend reported an error");
                }
                reply.text().to_string()
            }
            Err(e) if e.is_unauthorized() => return Err(self.expire()),
            Err(e) => {
                warn!(error = %e, "question failed");
                BACKEND_ERROR_TEXT.to_string()
            }
        };

        Ok(self.transcript.push(Message::assistant(content)))
    }
}

#[cfg(test)]
impl<G, S> ChatController<G, S> {
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn store(&self) -> &S {
        &self.store
    }
}
