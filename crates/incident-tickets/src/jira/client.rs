//! REST client for Jira issue creation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::ticket::{TicketClient, TicketClientError, TicketRequest};

/// Issue creation endpoint, relative to the instance URL
const CREATE_ISSUE_PATH: &str = "/rest/api/2/issue";

/// Jira REST client
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    email: String,
    api_token: String,
}

/// Issue create request body
#[derive(Debug, Serialize)]
struct CreateIssueRequest<'a> {
    fields: IssueFields<'a>,
}

#[derive(Debug, Serialize)]
struct IssueFields<'a> {
    project: ProjectRef<'a>,
    #[serde(rename = "issuetype")]
    issue_type: IssueTypeRef<'a>,
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    reporter: UserRef<'a>,
}

#[derive(Debug, Serialize)]
struct ProjectRef<'a> {
    key: &'a str,
}

#[derive(Debug, Serialize)]
struct IssueTypeRef<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct UserRef<'a> {
    name: &'a str,
}

/// Issue create response
#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

/// Jira error body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: BTreeMap<String, String>,
}

impl JiraErrorBody {
    fn summary(&self) -> Option<String> {
        let mut parts = self.error_messages.clone();
        parts.extend(
            self.errors
                .iter()
                .map(|(field, message)| format!("{field}: {message}")),
        );
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

impl JiraClient {
    /// Create a Jira client for the instance at `base_url`.
    ///
    /// Requests authenticate with basic auth using the account email and
    /// an API token.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(
        base_url: &str,
        email: &str,
        api_token: &str,
        timeout: Duration,
    ) -> Result<Self, TicketClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            api_token: api_token.to_string(),
        })
    }

    /// Create an issue and return its key (e.g., "OPS-123").
    #[instrument(skip(self, request), fields(project = %request.project))]
    pub async fn create_issue(
        &self,
        request: &TicketRequest,
        username: &str,
    ) -> Result<String, TicketClientError> {
        let body = CreateIssueRequest {
            fields: IssueFields {
                project: ProjectRef {
                    key: &request.project,
                },
                issue_type: IssueTypeRef {
                    name: &request.issue_type,
                },
                summary: &request.summary,
                description: request.description.as_deref(),
                reporter: UserRef { name: username },
            },
        };

        let response = self
            .client
            .post(format!("{}{CREATE_ISSUE_PATH}", self.base_url))
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<JiraErrorBody>(&raw)
                .ok()
                .and_then(|parsed| parsed.summary())
                .unwrap_or(raw);
            warn!(status = %status, body = %body, "Jira rejected issue creation");
            return Err(TicketClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedIssue = response.json().await?;
        debug!(key = %created.key, "Created Jira issue");
        Ok(created.key)
    }
}

#[async_trait]
impl TicketClient for JiraClient {
    fn name(&self) -> &'static str {
        "jira"
    }

    async fn create_ticket(
        &self,
        request: &TicketRequest,
        username: &str,
    ) -> Result<String, TicketClientError> {
        self.create_issue(request, username).await
    }
}
