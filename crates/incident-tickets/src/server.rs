//! HTTP server for the incident ticket forms.

use axum::{
    extract::{FromRef, FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::LinkError;
use crate::forms::{FormDescriptor, JiraAddForm, JiraBulkModifyForm, JiraUpdateForm};
use crate::models::User;
use crate::service::{LinkOutcome, TicketLinkService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Config,
    /// Link operations.
    pub service: Arc<TicketLinkService>,
}

/// Build the HTTP router for the incident ticket service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/incidents/jira/add/",
            get(add_form_descriptor).post(add_ticket_handler),
        )
        .route(
            "/incidents/jira/update/",
            get(update_form_descriptor).post(update_ticket_handler),
        )
        .route(
            "/incidents/jira/bulk/",
            get(bulk_form_descriptor).post(bulk_update_handler),
        )
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The logged-in user, taken from the header set by the auth proxy.
///
/// Anonymous requests are redirected to the login page with `next` set to
/// the requested path.
#[derive(Debug, Clone)]
pub struct ActingUser(pub User);

impl<S> FromRequestParts<S> for ActingUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let auth = &state.config.auth;

        let username = parts
            .headers
            .get(&auth.user_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match username {
            Some(name) => Ok(Self(User::new(name))),
            None => {
                let next = parts.uri.path();
                debug!(path = %next, "Anonymous request, redirecting to login");
                Err(Redirect::to(&format!(
                    "{}?next={}",
                    auth.login_url,
                    urlencoding::encode(next)
                )))
            }
        }
    }
}

impl IntoResponse for LinkOutcome {
    fn into_response(self) -> Response {
        Redirect::to(&self.location()).into_response()
    }
}

/// Map a failed request onto its response.
///
/// Upstream ticket errors are echoed only when `expose_detail` is set;
/// store errors never are.
fn error_response(err: LinkError, expose_detail: bool) -> Response {
    match err {
        LinkError::IncidentNotFound(_) => LinkOutcome::IncidentListing.into_response(),
        LinkError::InvalidForm(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        LinkError::BadIncidentList => {
            (StatusCode::BAD_REQUEST, LinkError::BadIncidentList.to_string()).into_response()
        }
        LinkError::TicketCreation(e) => {
            let body = if expose_detail {
                e.to_string()
            } else {
                "Ticket creation failed".to_string()
            };
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
        LinkError::Store(e) => {
            error!(error = %e, "Store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

fn respond(result: Result<LinkOutcome, LinkError>, state: &AppState) -> Response {
    match result {
        Ok(outcome) => outcome.into_response(),
        Err(e) => error_response(e, state.config.expose_ticket_errors),
    }
}

async fn add_form_descriptor(_user: ActingUser) -> Json<FormDescriptor> {
    Json(JiraAddForm::DESCRIPTOR)
}

async fn update_form_descriptor(_user: ActingUser) -> Json<FormDescriptor> {
    Json(JiraUpdateForm::DESCRIPTOR)
}

async fn bulk_form_descriptor(_user: ActingUser) -> Json<FormDescriptor> {
    Json(JiraBulkModifyForm::DESCRIPTOR)
}

/// Create a Jira ticket for an incident and link it.
async fn add_ticket_handler(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Form(form): Form<JiraAddForm>,
) -> Response {
    let result = match form.validate(&state.config.jira.ticket_defaults()) {
        Ok(input) => state.service.add_ticket(input, &user).await,
        Err(e) => {
            warn!(error = %e, "Invalid add form");
            Err(e.into())
        }
    };
    respond(result, &state)
}

/// Manually set the ticket on an incident.
async fn update_ticket_handler(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Form(form): Form<JiraUpdateForm>,
) -> Response {
    let result = match form.validate() {
        Ok(input) => state.service.update_ticket(input, &user).await,
        Err(e) => {
            warn!(error = %e, "Invalid update form");
            Err(e.into())
        }
    };
    respond(result, &state)
}

/// Set one ticket on a list of incidents.
async fn bulk_update_handler(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Form(form): Form<JiraBulkModifyForm>,
) -> Response {
    let result = match form.validate() {
        Ok(input) => state
            .service
            .bulk_update(input, &user)
            .await
            .map(|_| LinkOutcome::IncidentListing),
        Err(e) => {
            warn!(error = %e, "Invalid bulk form");
            Err(e.into())
        }
    };
    respond(result, &state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Readiness check endpoint.
async fn readiness_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    if let Err(e) = state.service.ping().await {
        warn!(error = %e, "Store not reachable");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(json!({
        "status": "ready",
        "ticket_system": state.service.can_create_tickets()
    })))
}
