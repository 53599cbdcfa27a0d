//! Configuration for the incident ticket service.

use axum::http::HeaderName;
use std::env;
use std::time::Duration;
use tracing::error;

use crate::forms::TicketDefaults;

const DEFAULT_USER_HEADER: &str = "x-remote-user";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Postgres connection URL. Unset means the in-memory store.
    pub database_url: Option<String>,
    /// Connection pool size.
    pub database_max_connections: u32,
    /// Whether upstream ticket errors are echoed in 500 bodies.
    pub expose_ticket_errors: bool,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Jira configuration.
    pub jira: JiraConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: env::var("INCIDENT_TICKETS_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8082),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            expose_ticket_errors: env::var("EXPOSE_TICKET_ERRORS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            auth: AuthConfig::default(),
            jira: JiraConfig::default(),
        }
    }
}

/// Authentication configuration.
///
/// Login happens upstream; the fronting proxy passes the username in a header.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Header carrying the authenticated username.
    pub user_header: HeaderName,
    /// Where anonymous requests are sent.
    pub login_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: user_header_from_env(),
            login_url: env::var("LOGIN_URL").unwrap_or_else(|_| "/accounts/login/".to_string()),
        }
    }
}

/// Read `AUTH_USER_HEADER`, falling back to the default when it is unset or
/// not a valid header name.
fn user_header_from_env() -> HeaderName {
    let Some(raw) = env::var("AUTH_USER_HEADER").ok().filter(|s| !s.is_empty()) else {
        return HeaderName::from_static(DEFAULT_USER_HEADER);
    };
    raw.trim().parse().unwrap_or_else(|e| {
        error!(
            value = %raw,
            error = %e,
            fallback = DEFAULT_USER_HEADER,
            "AUTH_USER_HEADER is not a valid header name"
        );
        HeaderName::from_static(DEFAULT_USER_HEADER)
    })
}

/// Jira configuration.
#[derive(Debug, Clone)]
pub struct JiraConfig {
    /// Jira instance URL.
    pub base_url: Option<String>,
    /// Account email for basic auth.
    pub email: Option<String>,
    /// API token for basic auth.
    pub api_token: Option<String>,
    /// Project key used when the add form leaves it blank.
    pub default_project: Option<String>,
    /// Issue type used when the add form leaves it blank.
    pub default_issue_type: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("JIRA_BASE_URL").ok().filter(|s| !s.is_empty()),
            email: env::var("JIRA_EMAIL").ok().filter(|s| !s.is_empty()),
            api_token: env::var("JIRA_API_TOKEN").ok().filter(|s| !s.is_empty()),
            default_project: env::var("JIRA_DEFAULT_PROJECT")
                .ok()
                .filter(|s| !s.is_empty()),
            default_issue_type: env::var("JIRA_DEFAULT_ISSUE_TYPE")
                .unwrap_or_else(|_| "Bug".to_string()),
            timeout_secs: env::var("JIRA_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl JiraConfig {
    /// Whether enough is set to talk to Jira.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.email.is_some() && self.api_token.is_some()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Fallbacks for blank add-form fields.
    #[must_use]
    pub fn ticket_defaults(&self) -> TicketDefaults {
        TicketDefaults {
            project: self.default_project.clone(),
            issue_type: self.default_issue_type.clone(),
        }
    }
}
