//! reqwest implementation of the backend gateway.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Gateway, GatewayError, QueryReply};
use crate::models::{Document, SessionToken};

/// Header carrying the session token on authenticated calls.
const SESSION_HEADER: &str = "session_id";

/// Response from `/create_session`.
#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    session_id: Option<String>,
    error: Option<String>,
}

/// Response from `/list_collections`. A missing or null list means none.
#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    collections: Option<Vec<String>>,
}

/// Response from `/upload_pdf` and `/`.
#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: Option<String>,
    error: Option<String>,
}

/// Response from `/query`.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    answer: Option<String>,
    error: Option<String>,
}

/// Gateway talking to the backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for the backend at `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

/// Map 401 and other failure statuses to gateway errors.
fn check_status(resp: Response) -> Result<Response, GatewayError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        warn!(url = %resp.url(), "backend rejected session");
        return Err(GatewayError::Unauthorized);
    }
    if !status.is_success() {
        return Err(GatewayError::Status(status));
    }
    Ok(resp)
}

/// Decode a JSON body, treating malformed payloads as unexpected rather than transport errors.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, GatewayError> {
    resp.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            debug!(error = %e, "malformed backend response");
            GatewayError::UnexpectedResponse
        } else {
            GatewayError::Transport(e)
        }
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionToken, GatewayError> {
        debug!(username, "creating session");

        let resp = self
            .client
            .post(self.url("create_session"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = resp.status();
        let body: CreateSessionResponse = match decode(resp).await {
            Ok(body) => body,
            Err(GatewayError::UnexpectedResponse) if !status.is_success() => {
                return Err(GatewayError::Status(status));
            }
            Err(e) => return Err(e),
        };

        if let Some(session_id) = non_empty(body.session_id) {
            return Ok(SessionToken::new(session_id));
        }
        if let Some(error) = non_empty(body.error) {
            return Err(GatewayError::Application(error));
        }
        if !status.is_success() {
            return Err(GatewayError::Status(status));
        }
        Err(GatewayError::UnexpectedResponse)
    }

    async fn list_collections(&self, session: &SessionToken) -> Result<Vec<String>, GatewayError> {
        debug!("listing collections");

        let resp = self
            .client
            .get(self.url("list_collections"))
            .header(SESSION_HEADER, session.as_str())
            .send()
            .await?;

        let body: CollectionsResponse = decode(check_status(resp)?).await?;
        Ok(body.collections.unwrap_or_default())
    }

    async fn upload_document(
        &self,
        session: &SessionToken,
        document: Document,
        collection_name: &str,
    ) -> Result<String, GatewayError> {
        GatewayError::check_collection_name(collection_name)?;

        debug!(
            collection = collection_name,
            file = %document.file_name,
            bytes = document.bytes.len(),
            "uploading document"
        );

        let file = Part::bytes(document.bytes)
            .file_name(document.file_name)
            .mime_str(Document::MIME_TYPE)?;
        let form = Form::new()
            .part("file", file)
            .text("collection_name", collection_name.to_string());

        let resp = self
            .client
            .post(self.url("upload_pdf"))
            .header(SESSION_HEADER, session.as_str())
            .multipart(form)
            .send()
            .await?;

        let body: MessageResponse = decode(check_status(resp)?).await?;
        if let Some(error) = non_empty(body.error) {
            return Err(GatewayError::Application(error));
        }
        body.message.ok_or(GatewayError::UnexpectedResponse)
    }

    async fn submit_question(
        &self,
        session: &SessionToken,
        question: &str,
        collection_name: &str,
    ) -> Result<QueryReply, GatewayError> {
        debug!(collection = collection_name, "submitting question");

        let body = serde_json::json!({
            "question": question,
            "collection_name": collection_name,
        });

        let resp = self
            .client
            .post(self.url("query"))
            .header(SESSION_HEADER, session.as_str())
            .json(&body)
            .send()
            .await?;

        let body: QueryResponse = decode(check_status(resp)?).await?;
        if let Some(answer) = non_empty(body.answer) {
            return Ok(QueryReply::Answer(answer));
        }
        if let Some(error) = non_empty(body.error) {
            return Ok(QueryReply::Error(error));
        }
        Ok(QueryReply::NoAnswer)
    }

    async fn health(&self) -> Result<String, GatewayError> {
        let resp = self.client.get(self.url("")).send().await?;
        let body: MessageResponse = decode(check_status(resp)?).await?;
        body.message.ok_or(GatewayError::UnexpectedResponse)
    }
}
