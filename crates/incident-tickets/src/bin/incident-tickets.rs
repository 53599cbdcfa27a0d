//! Incident ticket service binary.
//!
//! Standalone HTTP service for the incident Jira forms.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use incident_tickets::{
    config::Config,
    server,
    store::{IncidentStore, MemoryStore, TicketLinkStore},
    JiraClient, TicketClient, TicketLinkService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("incident_tickets=info".parse()?))
        .init();

    info!("Starting incident ticket service...");

    // Load configuration
    let config = Config::default();

    let (incidents, links) = open_stores(&config).await?;

    // Initialize Jira client
    let ticket_client: Option<Arc<dyn TicketClient>> = match (
        &config.jira.base_url,
        &config.jira.email,
        &config.jira.api_token,
    ) {
        (Some(base_url), Some(email), Some(token)) => {
            match JiraClient::new(base_url, email, token, config.jira.timeout()) {
                Ok(client) => {
                    info!(base_url = %base_url, "Jira API client configured");
                    Some(Arc::new(client) as Arc<dyn TicketClient>)
                }
                Err(e) => {
                    error!(error = %e, "Failed to create Jira client");
                    None
                }
            }
        }
        _ => {
            info!("JIRA_BASE_URL, JIRA_EMAIL or JIRA_API_TOKEN not set - ticket creation disabled");
            None
        }
    };

    // Build application state
    let state = server::AppState {
        config: config.clone(),
        service: Arc::new(TicketLinkService::new(incidents, links, ticket_client)),
    };

    // Build router
    let app = server::build_router(state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, "Incident ticket service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

#[cfg(feature = "postgres")]
async fn open_stores(
    config: &Config,
) -> Result<(Arc<dyn IncidentStore>, Arc<dyn TicketLinkStore>)> {
    use incident_tickets::store::PgStore;

    let Some(url) = &config.database_url else {
        return Ok(memory_stores());
    };

    let store = PgStore::connect(url, config.database_max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    store
        .ensure_schema()
        .await
        .context("Failed to prepare ticket link table")?;

    let store = Arc::new(store);
    let incidents: Arc<dyn IncidentStore> = store.clone();
    let links: Arc<dyn TicketLinkStore> = store;
    Ok((incidents, links))
}

#[cfg(not(feature = "postgres"))]
async fn open_stores(
    config: &Config,
) -> Result<(Arc<dyn IncidentStore>, Arc<dyn TicketLinkStore>)> {
    if config.database_url.is_some() {
        warn!("DATABASE_URL set but built without the postgres feature");
    }
    Ok(memory_stores())
}

fn memory_stores() -> (Arc<dyn IncidentStore>, Arc<dyn TicketLinkStore>) {
    warn!("No DATABASE_URL configured - using in-memory store, links are lost on restart");
    let store = Arc::new(MemoryStore::new());
    let incidents: Arc<dyn IncidentStore> = store.clone();
    let links: Arc<dyn TicketLinkStore> = store;
    (incidents, links)
}
