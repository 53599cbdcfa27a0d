//! Integration tests for the incident ticket form endpoints.
//!
//! These drive the router in-process and check redirects, status codes
//! and the resulting ticket links.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderName, Request, StatusCode},
    response::Response,
    Router,
};
use incident_tickets::{
    config::{AuthConfig, Config, JiraConfig},
    server::{build_router, AppState},
    error::StoreResult,
    store::{MemoryStore, TicketLinkStore},
    IncidentId, NewTicketLink, StoreError, TicketClient, TicketClientError, TicketLink,
    TicketLinkService, TicketRequest,
};
use std::sync::Arc;
use tower::ServiceExt;

// =============================================================================
// Fixtures
// =============================================================================

/// Ticket client that returns a fixed key, or a fixed failure.
struct StubTicketClient {
    result: Result<String, String>,
}

#[async_trait]
impl TicketClient for StubTicketClient {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn create_ticket(
        &self,
        _request: &TicketRequest,
        _username: &str,
    ) -> Result<String, TicketClientError> {
        self.result.clone().map_err(TicketClientError::Other)
    }
}

/// Link store whose backing database is unreachable.
struct UnavailableLinkStore;

#[async_trait]
impl TicketLinkStore for UnavailableLinkStore {
    async fn get_for_incident(
        &self,
        _incident_id: IncidentId,
    ) -> StoreResult<Option<TicketLink>> {
        Err(StoreError::Database("pool timed out: db-1:5432".into()))
    }

    async fn create(&self, _link: NewTicketLink) -> StoreResult<TicketLink> {
        Err(StoreError::Database("pool timed out: db-1:5432".into()))
    }

    async fn save(&self, _link: &TicketLink) -> StoreResult<()> {
        Err(StoreError::Database("pool timed out: db-1:5432".into()))
    }
}

fn test_config(expose_ticket_errors: bool) -> Config {
    Config {
        port: 0,
        database_url: None,
        database_max_connections: 1,
        expose_ticket_errors,
        auth: AuthConfig {
            user_header: HeaderName::from_static("x-remote-user"),
            login_url: "/accounts/login/".to_string(),
        },
        jira: JiraConfig {
            base_url: None,
            email: None,
            api_token: None,
            default_project: Some("OPS".to_string()),
            default_issue_type: "Bug".to_string(),
            timeout_secs: 5,
        },
    }
}

fn app_with(
    store: &Arc<MemoryStore>,
    ticket: Option<Result<String, String>>,
    expose_ticket_errors: bool,
) -> Router {
    let client =
        ticket.map(|result| Arc::new(StubTicketClient { result }) as Arc<dyn TicketClient>);
    let service = TicketLinkService::new(store.clone(), store.clone(), client);
    build_router(AppState {
        config: test_config(expose_ticket_errors),
        service: Arc::new(service),
    })
}

fn app_with_links(store: &Arc<MemoryStore>, links: Arc<dyn TicketLinkStore>) -> Router {
    let service = TicketLinkService::new(store.clone(), links, None);
    build_router(AppState {
        config: test_config(true),
        service: Arc::new(service),
    })
}

fn app(store: &Arc<MemoryStore>) -> Router {
    app_with(store, Some(Ok("OPS-100".to_string())), true)
}

async fn post_form(app: Router, path: &str, body: &str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-remote-user", "alice")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_add_redirects_to_incident_detail() {
    let store = Arc::new(MemoryStore::with_incidents([1]));

    let response = post_form(
        app(&store),
        "/incidents/jira/add/",
        "incident_id=1&summary=Disk+full",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/incidents/view/1/");

    let links = store.links_for(IncidentId(1)).await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].ticket, "OPS-100");
    assert_eq!(links[0].user, "alice");
}

#[tokio::test]
async fn test_add_unknown_incident_redirects_to_listing() {
    let store = Arc::new(MemoryStore::with_incidents([1]));

    let response = post_form(
        app(&store),
        "/incidents/jira/add/",
        "incident_id=404&summary=Disk+full",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/incidents/");
    assert!(store.links().await.is_empty());
}

#[tokio::test]
async fn test_add_ticket_failure_is_server_error() {
    let store = Arc::new(MemoryStore::with_incidents([1]));
    let app = app_with(&store, Some(Err("jira is down".to_string())), true);

    let response = post_form(app, "/incidents/jira/add/", "incident_id=1&summary=x").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "jira is down");
    assert!(store.links().await.is_empty());
}

#[tokio::test]
async fn test_add_ticket_failure_detail_can_be_hidden() {
    let store = Arc::new(MemoryStore::with_incidents([1]));
    let app = app_with(&store, Some(Err("secret internals".to_string())), false);

    let response = post_form(app, "/incidents/jira/add/", "incident_id=1&summary=x").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Ticket creation failed");
}

#[tokio::test]
async fn test_add_invalid_form_is_bad_request() {
    let store = Arc::new(MemoryStore::with_incidents([1]));

    let response = post_form(app(&store), "/incidents/jira/add/", "incident_id=1").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "summary: This field is required.");
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_overwrites_existing_link() {
    let store = Arc::new(MemoryStore::with_incidents([2]));

    let first = post_form(
        app(&store),
        "/incidents/jira/update/",
        "incident_id=2&ticket=OPS-1",
    )
    .await;
    assert_eq!(location(&first), "/incidents/view/2/");

    let second = post_form(
        app(&store),
        "/incidents/jira/update/",
        "incident_id=2&ticket=OPS-2",
    )
    .await;
    assert_eq!(second.status(), StatusCode::SEE_OTHER);

    let links = store.links_for(IncidentId(2)).await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].ticket, "OPS-2");
}

// =============================================================================
// Bulk
// =============================================================================

#[tokio::test]
async fn test_bulk_sets_ticket_on_existing_incidents() {
    let store = Arc::new(MemoryStore::with_incidents([1, 2, 5]));

    let response = post_form(
        app(&store),
        "/incidents/jira/bulk/",
        "incidents=1%2C2%2C3&jira_id=T-1",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/incidents/");
    for id in [1, 2] {
        let links = store.links_for(IncidentId(id)).await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].ticket, "T-1");
    }
    assert!(store.links_for(IncidentId(5)).await.is_empty());
}

#[tokio::test]
async fn test_bulk_malformed_list_is_bad_request() {
    let store = Arc::new(MemoryStore::with_incidents([1]));

    let response = post_form(
        app(&store),
        "/incidents/jira/bulk/",
        "incidents=abc&jira_id=T-1",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Bad instance IDs");
    assert!(store.links().await.is_empty());
}

#[tokio::test]
async fn test_bulk_empty_list_redirects_without_changes() {
    let store = Arc::new(MemoryStore::with_incidents([1]));

    let response = post_form(app(&store), "/incidents/jira/bulk/", "incidents=&jira_id=T-1").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/incidents/");
    assert!(store.links().await.is_empty());
}

#[tokio::test]
async fn test_bulk_store_failure_hides_detail() {
    let store = Arc::new(MemoryStore::with_incidents([1, 2]));
    let app = app_with_links(&store, Arc::new(UnavailableLinkStore));

    let response = post_form(app, "/incidents/jira/bulk/", "incidents=1%2C2&jira_id=T-1").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert_eq!(body, "Internal server error");
    assert!(!body.contains("db-1"));
}

#[tokio::test]
async fn test_update_store_failure_is_server_error() {
    let store = Arc::new(MemoryStore::with_incidents([1]));
    let app = app_with_links(&store, Arc::new(UnavailableLinkStore));

    let response = post_form(app, "/incidents/jira/update/", "incident_id=1&ticket=OPS-1").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Internal server error");
}

// =============================================================================
// Auth, descriptors, health
// =============================================================================

#[tokio::test]
async fn test_anonymous_request_redirects_to_login() {
    let store = Arc::new(MemoryStore::with_incidents([1]));
    let request = Request::builder()
        .method("POST")
        .uri("/incidents/jira/update/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("incident_id=1&ticket=OPS-1"))
        .unwrap();

    let response = app(&store).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/accounts/login/?next=%2Fincidents%2Fjira%2Fupdate%2F"
    );
    assert!(store.links().await.is_empty());
}

#[tokio::test]
async fn test_form_descriptor_titles() {
    let store = Arc::new(MemoryStore::new());
    let request = Request::builder()
        .uri("/incidents/jira/bulk/")
        .header("x-remote-user", "alice")
        .body(Body::empty())
        .unwrap();

    let response = app(&store).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["page_title"], "Bulk modify JIRA for incidents");
    assert_eq!(json["fields"][1], "jira_id");
}

#[tokio::test]
async fn test_ready_reports_ticket_system() {
    let store = Arc::new(MemoryStore::new());
    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();

    let response = app_with(&store, None, true).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ready");
    assert_eq!(json["ticket_system"], false);
}
