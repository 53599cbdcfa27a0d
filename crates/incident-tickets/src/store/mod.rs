//! Storage trait definitions.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{Incident, IncidentId, NewTicketLink, TicketLink};

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

/// Read access to incidents.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Load an incident by primary key
    async fn get_incident(&self, id: IncidentId) -> StoreResult<Option<Incident>>;

    /// Load every incident whose key is in `ids`, ordered by key.
    /// Unknown keys are skipped and duplicates collapse.
    async fn filter_incidents(&self, ids: &[IncidentId]) -> StoreResult<Vec<Incident>>;

    /// Check the backing store is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Persistence for incident ticket links.
#[async_trait]
pub trait TicketLinkStore: Send + Sync {
    /// Load the link for an incident, if any
    async fn get_for_incident(&self, incident_id: IncidentId) -> StoreResult<Option<TicketLink>>;

    /// Insert a new link
    async fn create(&self, link: NewTicketLink) -> StoreResult<TicketLink>;

    /// Write back ticket, user and `updated_at` of an existing link
    async fn save(&self, link: &TicketLink) -> StoreResult<()>;
}
