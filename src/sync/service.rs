//! Session service interface and its HTTP implementation.
//!
//! The service owns nothing: the local element store stays authoritative and
//! every call here is best-effort. The trait exists so the worker (and the
//! tests) can run against an in-memory double.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementId};

/// Server-side handle for one collaborative editing instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SessionId {
    /// Short suffix for the status bar.
    pub fn short(&self) -> &str {
        let len = self.0.len();
        &self.0[len.saturating_sub(8)..]
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    pub collaborative: bool,
}

#[async_trait]
pub trait SessionService: Send + Sync {
    async fn create_session(
        &self,
        document: &[u8],
        options: &SessionOptions,
    ) -> Result<SessionId>;

    async fn update_element(
        &self,
        session: &SessionId,
        id: ElementId,
        element: &Element,
    ) -> Result<()>;

    async fn delete_element(&self, session: &SessionId, id: ElementId) -> Result<()>;

    /// Apply all session edits to the document and return the final bytes.
    async fn save_document(&self, session: &SessionId) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    session_id: String,
}

/// REST client for the session service.
pub struct HttpSessionService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSessionService {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("building http client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl SessionService for HttpSessionService {
    async fn create_session(
        &self,
        document: &[u8],
        options: &SessionOptions,
    ) -> Result<SessionId> {
        let resp: CreateSessionResponse = self
            .client
            .post(format!("{}/sessions", self.base_url))
            .query(&[("collaborative", options.collaborative)])
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(document.to_vec())
            .send()
            .await
            .context("creating session")?
            .error_for_status()
            .context("creating session")?
            .json()
            .await
            .context("decoding session response")?;
        Ok(SessionId(resp.session_id))
    }

    async fn update_element(
        &self,
        session: &SessionId,
        id: ElementId,
        element: &Element,
    ) -> Result<()> {
        self.client
            .put(format!(
                "{}/sessions/{}/elements/{}",
                self.base_url, session, id
            ))
            .json(element)
            .send()
            .await
            .with_context(|| format!("pushing element {id}"))?
            .error_for_status()
            .with_context(|| format!("pushing element {id}"))?;
        Ok(())
    }

    async fn delete_element(&self, session: &SessionId, id: ElementId) -> Result<()> {
        self.client
            .delete(format!(
                "{}/sessions/{}/elements/{}",
                self.base_url, session, id
            ))
            .send()
            .await
            .with_context(|| format!("deleting element {id}"))?
            .error_for_status()
            .with_context(|| format!("deleting element {id}"))?;
        Ok(())
    }

    async fn save_document(&self, session: &SessionId) -> Result<Vec<u8>> {
        let bytes = self
            .client
            .post(format!("{}/sessions/{}/save", self.base_url, session))
            .send()
            .await
            .context("saving document")?
            .error_for_status()
            .context("saving document")?
            .bytes()
            .await
            .context("reading saved document")?;
        Ok(bytes.to_vec())
    }
}
