//! Form payloads and their validation.
//!
//! Each form deserializes leniently (every field a string) and is then
//! validated into a typed input, so a bad value produces a [`FormError`]
//! naming the field instead of a generic extractor rejection.

use serde::{Deserialize, Serialize};
use std::num::ParseIntError;
use thiserror::Error;

use crate::models::IncidentId;
use crate::ticket::TicketRequest;

/// Validation failure for a submitted form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Required field missing or blank
    #[error("{field}: This field is required.")]
    Required { field: &'static str },

    /// Field is not a whole number
    #[error("{field}: Enter a whole number.")]
    NotAnInteger { field: &'static str, value: String },
}

/// Title and field listing for a form page.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FormDescriptor {
    pub page_title: &'static str,
    pub box_title: &'static str,
    pub fields: &'static [&'static str],
}

/// Fallback values for ticket fields left blank on the add form.
#[derive(Debug, Clone, Default)]
pub struct TicketDefaults {
    /// Project key used when the form omits one
    pub project: Option<String>,
    /// Issue type used when the form omits one
    pub issue_type: String,
}

/// Form for opening a Jira ticket against an incident.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JiraAddForm {
    #[serde(default)]
    pub incident_id: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub issue_type: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
}

/// Validated add form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTicketInput {
    pub incident_id: IncidentId,
    pub ticket: TicketRequest,
}

impl JiraAddForm {
    pub const DESCRIPTOR: FormDescriptor = FormDescriptor {
        page_title: "Add JIRA",
        box_title: "Add JIRA",
        fields: &["incident_id", "project", "issue_type", "summary", "description"],
    };

    pub fn validate(&self, defaults: &TicketDefaults) -> Result<AddTicketInput, FormError> {
        let incident_id = incident_id_field("incident_id", &self.incident_id)?;

        let project = non_blank(&self.project)
            .or(defaults.project.as_deref())
            .ok_or(FormError::Required { field: "project" })?;
        let issue_type = non_blank(&self.issue_type)
            .or_else(|| non_blank(&defaults.issue_type))
            .ok_or(FormError::Required {
                field: "issue_type",
            })?;
        let summary = required("summary", &self.summary)?;

        Ok(AddTicketInput {
            incident_id,
            ticket: TicketRequest {
                project: project.to_string(),
                issue_type: issue_type.to_string(),
                summary,
                description: non_blank(&self.description).map(str::to_string),
            },
        })
    }
}

/// Form for manually setting the ticket on an incident.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JiraUpdateForm {
    #[serde(default)]
    pub incident_id: String,
    #[serde(default)]
    pub ticket: String,
}

/// Validated update form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTicketInput {
    pub incident_id: IncidentId,
    pub ticket: String,
}

impl JiraUpdateForm {
    pub const DESCRIPTOR: FormDescriptor = FormDescriptor {
        page_title: "Manually update JIRA",
        box_title: "Manually update JIRA",
        fields: &["incident_id", "ticket"],
    };

    pub fn validate(&self) -> Result<UpdateTicketInput, FormError> {
        Ok(UpdateTicketInput {
            incident_id: incident_id_field("incident_id", &self.incident_id)?,
            ticket: required("ticket", &self.ticket)?,
        })
    }
}

/// Form for pointing many incidents at one ticket.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JiraBulkModifyForm {
    /// Comma-separated incident ids
    #[serde(default)]
    pub incidents: String,
    #[serde(default)]
    pub jira_id: String,
}

/// Validated bulk form. The incident list is parsed by the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdateInput {
    pub incidents: String,
    pub ticket: String,
}

impl JiraBulkModifyForm {
    pub const DESCRIPTOR: FormDescriptor = FormDescriptor {
        page_title: "Bulk modify JIRA for incidents",
        box_title: "Bulk modify JIRA for incidents",
        fields: &["incidents", "jira_id"],
    };

    pub fn validate(&self) -> Result<BulkUpdateInput, FormError> {
        Ok(BulkUpdateInput {
            incidents: self.incidents.clone(),
            ticket: required("jira_id", &self.jira_id)?,
        })
    }
}

/// Parse a comma-separated incident list.
///
/// Blank input is an empty list. Any other segment must be an integer,
/// surrounding whitespace allowed, so `"1,,2"` and `"1,"` are errors.
pub fn parse_incident_list(raw: &str) -> Result<Vec<IncidentId>, ParseIntError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|part| part.trim().parse::<i64>().map(IncidentId))
        .collect()
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    non_blank(value)
        .map(str::to_string)
        .ok_or(FormError::Required { field })
}

fn incident_id_field(field: &'static str, value: &str) -> Result<IncidentId, FormError> {
    let raw = non_blank(value).ok_or(FormError::Required { field })?;
    raw.parse::<i64>()
        .map(IncidentId)
        .map_err(|_| FormError::NotAnInteger {
            field,
            value: raw.to_string(),
        })
}
