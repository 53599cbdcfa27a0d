//! Jira integration.
//!
//! Creates issues through the Jira REST API (v2) so an incident can be
//! linked to the resulting issue key.
//!
//! # Configuration
//!
//! - `JIRA_BASE_URL`: Jira instance URL (e.g., `https://your-domain.atlassian.net`)
//! - `JIRA_EMAIL`: User email for authentication
//! - `JIRA_API_TOKEN`: Jira API token
//! - `JIRA_DEFAULT_PROJECT`: Project key used when the add form leaves it blank
//! - `JIRA_DEFAULT_ISSUE_TYPE`: Issue type used when the add form leaves it blank

pub mod client;

pub use client::JiraClient;
