//! Incident to Jira ticket linking for the incident console.
//!
//! This crate provides:
//! - Form handlers to open a Jira ticket for an incident, set a ticket by
//!   hand, or point a batch of incidents at one ticket
//! - Store traits for incidents and ticket links, with in-memory and
//!   Postgres implementations
//! - A Jira REST client behind the [`TicketClient`] trait
//! - Environment-driven configuration and the HTTP router

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Store and client methods can all fail

pub mod config;
pub mod error;
pub mod forms;
pub mod jira;
pub mod models;
pub mod server;
pub mod service;
pub mod store;
pub mod ticket;

pub use config::Config;
pub use error::{LinkError, StoreError};
pub use jira::JiraClient;
pub use models::*;
pub use service::{LinkOutcome, TicketLinkService};
pub use ticket::{TicketClient, TicketClientError, TicketRequest};
