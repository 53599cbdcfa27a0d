//! Add, update and bulk-update operations on incident ticket links.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::error::{LinkError, LinkResult};
use crate::forms::{parse_incident_list, AddTicketInput, BulkUpdateInput, UpdateTicketInput};
use crate::models::{Incident, IncidentId, NewTicketLink, TicketLink, User};
use crate::store::{IncidentStore, TicketLinkStore};
use crate::ticket::{TicketClient, TicketClientError};

/// Incident listing page.
pub const INCIDENT_LISTING_PATH: &str = "/incidents/";

/// Where a successful request sends the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Incident detail page
    IncidentDetail(IncidentId),
    /// Incident listing page
    IncidentListing,
}

impl LinkOutcome {
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::IncidentDetail(id) => Incident::new(*id).detail_path(),
            Self::IncidentListing => INCIDENT_LISTING_PATH.to_string(),
        }
    }
}

/// Result of a bulk update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkUpdateSummary {
    /// Number of ids submitted
    pub requested: usize,
    /// Incidents whose link now points at the ticket
    pub updated: Vec<IncidentId>,
}

/// Links incidents to tickets on behalf of a user.
pub struct TicketLinkService {
    incidents: Arc<dyn IncidentStore>,
    links: Arc<dyn TicketLinkStore>,
    ticket_client: Option<Arc<dyn TicketClient>>,
}

impl TicketLinkService {
    #[must_use]
    pub fn new(
        incidents: Arc<dyn IncidentStore>,
        links: Arc<dyn TicketLinkStore>,
        ticket_client: Option<Arc<dyn TicketClient>>,
    ) -> Self {
        Self {
            incidents,
            links,
            ticket_client,
        }
    }

    /// Whether a ticket system is wired in.
    #[must_use]
    pub fn can_create_tickets(&self) -> bool {
        self.ticket_client.is_some()
    }

    /// Check the incident store is reachable.
    pub async fn ping(&self) -> LinkResult<()> {
        Ok(self.incidents.ping().await?)
    }

    /// Open a ticket upstream and link it to the incident.
    #[instrument(skip(self, input, user), fields(incident_id = %input.incident_id, user = %user))]
    pub async fn add_ticket(&self, input: AddTicketInput, user: &User) -> LinkResult<LinkOutcome> {
        let incident = self.resolve_incident(input.incident_id).await?;

        let client = self.ticket_client.as_ref().ok_or_else(|| {
            TicketClientError::NotConfigured("no ticket system configured".to_string())
        })?;

        let ticket = match client.create_ticket(&input.ticket, &user.username).await {
            Ok(ticket) => ticket,
            Err(e) => {
                error!(system = client.name(), error = %e, "Failed to create ticket");
                return Err(e.into());
            }
        };

        let link = self.link_incident(&incident, &ticket, user).await?;
        info!(ticket = %link.ticket, link_id = link.id, "Created ticket for incident");
        Ok(LinkOutcome::IncidentDetail(incident.id))
    }

    /// Point an incident at a ticket that already exists.
    #[instrument(skip(self, input, user), fields(incident_id = %input.incident_id, user = %user))]
    pub async fn update_ticket(
        &self,
        input: UpdateTicketInput,
        user: &User,
    ) -> LinkResult<LinkOutcome> {
        let incident = self.resolve_incident(input.incident_id).await?;
        let link = self.link_incident(&incident, &input.ticket, user).await?;
        info!(ticket = %link.ticket, link_id = link.id, "Updated incident ticket");
        Ok(LinkOutcome::IncidentDetail(incident.id))
    }

    /// Point every listed incident at one ticket.
    ///
    /// Unknown ids are skipped. A store failure stops the batch; incidents
    /// already processed keep their new ticket.
    #[instrument(skip(self, input, user), fields(ticket = %input.ticket, user = %user))]
    pub async fn bulk_update(
        &self,
        input: BulkUpdateInput,
        user: &User,
    ) -> LinkResult<BulkUpdateSummary> {
        let ids = parse_incident_list(&input.incidents).map_err(|e| {
            warn!(incidents = %input.incidents, error = %e, "Bad incident id list");
            LinkError::BadIncidentList
        })?;

        if ids.is_empty() {
            return Ok(BulkUpdateSummary::default());
        }

        let mut summary = BulkUpdateSummary {
            requested: ids.len(),
            updated: Vec::new(),
        };

        for incident in self.incidents.filter_incidents(&ids).await? {
            self.link_incident(&incident, &input.ticket, user).await?;
            summary.updated.push(incident.id);
        }

        info!(
            requested = summary.requested,
            updated = summary.updated.len(),
            "Bulk updated incident tickets"
        );
        Ok(summary)
    }

    async fn resolve_incident(&self, id: IncidentId) -> LinkResult<Incident> {
        match self.incidents.get_incident(id).await? {
            Some(incident) => Ok(incident),
            None => {
                warn!(incident_id = %id, "Incident not found");
                Err(LinkError::IncidentNotFound(id))
            }
        }
    }

    /// Fetch or create the incident's link, then point it at `ticket`.
    async fn link_incident(
        &self,
        incident: &Incident,
        ticket: &str,
        user: &User,
    ) -> LinkResult<TicketLink> {
        if let Some(mut link) = self.links.get_for_incident(incident.id).await? {
            link.assign(ticket, user);
            self.links.save(&link).await?;
            return Ok(link);
        }

        Ok(self
            .links
            .create(NewTicketLink::new(incident, user, ticket))
            .await?)
    }
}
