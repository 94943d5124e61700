//! HTTP client for the tracking service
//!
//! Implements `TaskApi` against the service's REST endpoints:
//!
//! - `POST {host}/api/{org}/{project}/tasks/` creates a task
//! - `GET {host}/api/{org}/{project}/tasks/{id}/` fetches one
//! - `PATCH {host}/api/{org}/{project}/tasks/{id}/` partially updates one
//!
//! Calls are made with a short-lived client unless a session is open, in
//! which case a pooled client is reused across calls. There is no retry
//! logic here; callers decide whether a failed call matters.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use crate::config::ApiSettings;
use crate::error::{Error, Result};
use crate::types::{Task, TaskFields};

use super::TaskApi;

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

/// Header carrying the monitor id on task creation
pub const MONITOR_HEADER: &str = "X-Taskpulse-Monitor";

/// Longest error body kept in an `UnexpectedStatus` error
const MAX_ERROR_BODY_LEN: usize = 2000;

/// Connection details for the tracking service
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Service base URL, without trailing slash
    pub host: String,

    /// Organization slug
    pub organization: String,

    /// Project slug
    pub project: String,

    /// API token (sent as a bearer token)
    pub token: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl HttpApiConfig {
    /// URL of the task collection (trailing slash is significant)
    pub fn tasks_url(&self) -> String {
        format!(
            "{}/api/{}/{}/tasks/",
            self.host.trim_end_matches('/'),
            self.organization,
            self.project
        )
    }

    /// URL of a single task
    pub fn task_url(&self, task_id: &str) -> String {
        format!("{}{}/", self.tasks_url(), task_id)
    }
}

// ─────────────────────────────────────────────────────────────────
// HTTP Client
// ─────────────────────────────────────────────────────────────────

/// REST client for the tracking service
pub struct HttpTaskApi {
    config: HttpApiConfig,
    /// Pooled client, present only while a session is open
    session: RwLock<Option<Client>>,
}

impl HttpTaskApi {
    /// Create a client from explicit connection details
    pub fn new(config: HttpApiConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
        }
    }

    /// Create a client from settings; fails when credentials are incomplete
    pub fn from_settings(api: &ApiSettings) -> Result<Self> {
        Ok(Self::new(api.http_config()?))
    }

    /// Connection details in use
    pub fn config(&self) -> &HttpApiConfig {
        &self.config
    }

    fn build_client(&self) -> Result<Client> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()?;
        Ok(client)
    }

    /// Pooled session client when open, otherwise a fresh one
    fn client(&self) -> Result<Client> {
        if let Some(client) = self.session.read().clone() {
            return Ok(client);
        }
        self.build_client()
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.config.token)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Task> {
        let response = request
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::api_timeout(url, self.config.timeout_secs)
                } else {
                    Error::api_connection(url, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::unexpected_status(
                status.as_u16(),
                truncate_body(&body),
            ));
        }

        response.json::<Task>().await.map_err(|e| Error::ApiDecode {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn create_task(
        &self,
        name: &str,
        fields: &TaskFields,
        monitor_id: Option<&str>,
    ) -> Result<Task> {
        let url = self.config.tasks_url();

        let mut body = fields.clone();
        body.name = Some(name.to_string());

        let client = self.client()?;
        let mut request = client.post(&url).json(&body);
        if let Some(monitor) = monitor_id {
            request = request.header(MONITOR_HEADER, monitor);
        }

        debug!(url = %url, task_name = name, "Creating task");
        self.send(request, &url).await
    }

    async fn get_task(&self, task_id: &str) -> Result<Task> {
        let url = self.config.task_url(task_id);
        let client = self.client()?;

        debug!(url = %url, "Fetching task");
        self.send(client.get(&url), &url).await
    }

    async fn update_task(&self, task_id: &str, fields: &TaskFields) -> Result<Task> {
        let url = self.config.task_url(task_id);
        let client = self.client()?;

        debug!(url = %url, "Updating task");
        self.send(client.patch(&url).json(fields), &url).await
    }

    fn open_session(&self) {
        let mut session = self.session.write();
        if session.is_none() {
            match self.build_client() {
                Ok(client) => *session = Some(client),
                // Calls fall back to per-request clients
                Err(e) => warn!(error = %e, "Failed to build session client"),
            }
        }
    }

    fn close_session(&self) {
        *self.session.write() = None;
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
