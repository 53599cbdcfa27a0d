//! In-memory store used when no database is configured, and in tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{IncidentStore, TicketLinkStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{Incident, IncidentId, NewTicketLink, TicketLink};

#[derive(Default)]
struct Inner {
    incidents: BTreeMap<IncidentId, Incident>,
    links: BTreeMap<i64, TicketLink>,
    next_link_id: i64,
}

/// Store holding incidents and links behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given incidents.
    #[must_use]
    pub fn with_incidents(ids: impl IntoIterator<Item = i64>) -> Self {
        let incidents = ids
            .into_iter()
            .map(|id| (IncidentId(id), Incident::new(IncidentId(id))))
            .collect();
        Self {
            inner: RwLock::new(Inner {
                incidents,
                ..Inner::default()
            }),
        }
    }

    /// Register an incident.
    pub async fn insert_incident(&self, incident: Incident) {
        self.inner
            .write()
            .await
            .incidents
            .insert(incident.id, incident);
    }

    /// Snapshot of every link, ordered by link id.
    pub async fn links(&self) -> Vec<TicketLink> {
        self.inner.read().await.links.values().cloned().collect()
    }

    /// Links attached to one incident.
    pub async fn links_for(&self, incident_id: IncidentId) -> Vec<TicketLink> {
        self.inner
            .read()
            .await
            .links
            .values()
            .filter(|link| link.incident_id == incident_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn get_incident(&self, id: IncidentId) -> StoreResult<Option<Incident>> {
        Ok(self.inner.read().await.incidents.get(&id).cloned())
    }

    async fn filter_incidents(&self, ids: &[IncidentId]) -> StoreResult<Vec<Incident>> {
        let guard = self.inner.read().await;
        Ok(guard
            .incidents
            .values()
            .filter(|incident| ids.contains(&incident.id))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TicketLinkStore for MemoryStore {
    async fn get_for_incident(&self, incident_id: IncidentId) -> StoreResult<Option<TicketLink>> {
        Ok(self
            .inner
            .read()
            .await
            .links
            .values()
            .find(|link| link.incident_id == incident_id)
            .cloned())
    }

    async fn create(&self, link: NewTicketLink) -> StoreResult<TicketLink> {
        let mut guard = self.inner.write().await;
        guard.next_link_id += 1;
        let now = Utc::now();
        let created = TicketLink {
            id: guard.next_link_id,
            incident_id: link.incident_id,
            ticket: link.ticket,
            user: link.user,
            created_at: now,
            updated_at: now,
        };
        guard.links.insert(created.id, created.clone());
        Ok(created)
    }

    async fn save(&self, link: &TicketLink) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let stored = guard
            .links
            .get_mut(&link.id)
            .ok_or(StoreError::LinkNotFound(link.id))?;
        stored.ticket.clone_from(&link.ticket);
        stored.user.clone_from(&link.user);
        stored.updated_at = link.updated_at;
        Ok(())
    }
}
