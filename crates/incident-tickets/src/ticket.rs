//! External ticket creation capability.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when creating a ticket upstream.
#[derive(Debug, Error)]
pub enum TicketClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Ticket system is not configured
    #[error("Ticket system not configured: {0}")]
    NotConfigured(String),

    /// Ticket system rejected the request
    #[error("Ticket system returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Parameters for a new ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRequest {
    /// Project key (e.g., "OPS")
    pub project: String,
    /// Issue type name (e.g., "Bug")
    pub issue_type: String,
    /// One-line summary
    pub summary: String,
    /// Optional body text
    pub description: Option<String>,
}

/// Trait for ticket systems that can open a ticket and hand back its key.
#[async_trait]
pub trait TicketClient: Send + Sync {
    /// Get the name of this ticket system.
    fn name(&self) -> &'static str;

    /// Create a ticket reported by `username` and return its identifier.
    async fn create_ticket(
        &self,
        request: &TicketRequest,
        username: &str,
    ) -> Result<String, TicketClientError>;
}
