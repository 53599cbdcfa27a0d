//! Incident and ticket link type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Incident primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub i64);

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for IncidentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Incident record.
///
/// Incidents are owned elsewhere; only the identity is visible here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Primary key
    pub id: IncidentId,
}

impl Incident {
    #[must_use]
    pub const fn new(id: IncidentId) -> Self {
        Self { id }
    }

    /// Path of the incident detail page.
    #[must_use]
    pub fn detail_path(&self) -> String {
        format!("/incidents/view/{}/", self.id)
    }
}

/// The authenticated user acting on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name, also used as the Jira reporter
    pub username: String,
}

impl User {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Association between an incident and an external ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketLink {
    /// Store-assigned identifier
    pub id: i64,
    /// Linked incident
    pub incident_id: IncidentId,
    /// External ticket identifier (e.g., "OPS-42"); empty until first assigned
    pub ticket: String,
    /// Username of whoever last touched the link
    pub user: String,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl TicketLink {
    /// Point the link at `ticket` on behalf of `user`.
    pub fn assign(&mut self, ticket: &str, user: &User) {
        ticket.clone_into(&mut self.ticket);
        self.user.clone_from(&user.username);
        self.updated_at = Utc::now();
    }
}

/// Input for creating a ticket link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicketLink {
    /// Incident to link
    pub incident_id: IncidentId,
    /// Initial ticket identifier
    pub ticket: String,
    /// Acting username
    pub user: String,
}

impl NewTicketLink {
    #[must_use]
    pub fn new(incident: &Incident, user: &User, ticket: impl Into<String>) -> Self {
        Self {
            incident_id: incident.id,
            ticket: ticket.into(),
            user: user.username.clone(),
        }
    }
}
