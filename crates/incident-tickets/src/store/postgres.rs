//! Postgres-backed store.
//!
//! Incidents are read from the externally owned `incidents` table. Links
//! live in `incident_ticket_links`, which [`PgStore::ensure_schema`] creates
//! when missing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use super::{IncidentStore, TicketLinkStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{Incident, IncidentId, NewTicketLink, TicketLink};

const CREATE_LINKS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS incident_ticket_links (
        id BIGSERIAL PRIMARY KEY,
        incident_id BIGINT NOT NULL,
        ticket TEXT NOT NULL DEFAULT '',
        username TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
";

const CREATE_LINKS_INDEX: &str = r"
    CREATE INDEX IF NOT EXISTS incident_ticket_links_incident_id_idx
        ON incident_ticket_links (incident_id)
";

// `incidents.id` is a serial (INT4) column; widen it to match `IncidentId`.
const GET_INCIDENT: &str = "SELECT id::BIGINT AS id FROM incidents WHERE id = $1";

const FILTER_INCIDENTS: &str =
    "SELECT id::BIGINT AS id FROM incidents WHERE id = ANY($1) ORDER BY id";

#[derive(Debug, FromRow)]
struct TicketLinkRow {
    id: i64,
    incident_id: i64,
    ticket: String,
    username: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TicketLinkRow> for TicketLink {
    fn from(row: TicketLinkRow) -> Self {
        Self {
            id: row.id,
            incident_id: IncidentId(row.incident_id),
            ticket: row.ticket,
            user: row.username,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Store backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "Connected to Postgres");
        Ok(Self::new(pool))
    }

    /// Create the link table and its index if they do not exist.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(CREATE_LINKS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_LINKS_INDEX).execute(&self.pool).await?;
        debug!("incident_ticket_links schema ready");
        Ok(())
    }
}

#[async_trait]
impl IncidentStore for PgStore {
    async fn get_incident(&self, id: IncidentId) -> StoreResult<Option<Incident>> {
        let row: Option<(i64,)> = sqlx::query_as(GET_INCIDENT)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| Incident::new(IncidentId(id))))
    }

    async fn filter_incidents(&self, ids: &[IncidentId]) -> StoreResult<Vec<Incident>> {
        let keys: Vec<i64> = ids.iter().map(|id| id.0).collect();
        let rows: Vec<(i64,)> = sqlx::query_as(FILTER_INCIDENTS)
            .bind(keys)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id,)| Incident::new(IncidentId(id)))
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TicketLinkStore for PgStore {
    async fn get_for_incident(&self, incident_id: IncidentId) -> StoreResult<Option<TicketLink>> {
        // Oldest link wins if a race ever produced two.
        let row = sqlx::query_as::<_, TicketLinkRow>(
            r"
            SELECT id, incident_id, ticket, username, created_at, updated_at
            FROM incident_ticket_links
            WHERE incident_id = $1
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(incident_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TicketLink::from))
    }

    async fn create(&self, link: NewTicketLink) -> StoreResult<TicketLink> {
        let row = sqlx::query_as::<_, TicketLinkRow>(
            r"
            INSERT INTO incident_ticket_links (incident_id, ticket, username)
            VALUES ($1, $2, $3)
            RETURNING id, incident_id, ticket, username, created_at, updated_at
            ",
        )
        .bind(link.incident_id.0)
        .bind(&link.ticket)
        .bind(&link.user)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn save(&self, link: &TicketLink) -> StoreResult<()> {
        let result = sqlx::query(
            r"
            UPDATE incident_ticket_links
            SET ticket = $1, username = $2, updated_at = $3
            WHERE id = $4
            ",
        )
        .bind(&link.ticket)
        .bind(&link.user)
        .bind(link.updated_at)
        .bind(link.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::LinkNotFound(link.id));
        }
        Ok(())
    }
}
