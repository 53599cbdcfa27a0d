//! Error types for incident ticket linking.

use thiserror::Error;

use crate::forms::FormError;
use crate::models::IncidentId;
use crate::ticket::TicketClientError;

/// Errors raised by the incident and ticket link stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database query failed
    #[error("Database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A link that was loaded earlier no longer exists
    #[error("Ticket link {0} not found")]
    LinkNotFound(i64),
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(Box::new(err))
    }
}

/// Errors that end a link request.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Incident lookup matched nothing
    #[error("Incident {0} not found")]
    IncidentNotFound(IncidentId),

    /// Submitted form failed validation
    #[error(transparent)]
    InvalidForm(#[from] FormError),

    /// Bulk incident list could not be parsed
    #[error("Bad instance IDs")]
    BadIncidentList,

    /// External ticket creation failed
    #[error("Ticket creation failed: {0}")]
    TicketCreation(#[from] TicketClientError),

    /// Persistence failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
