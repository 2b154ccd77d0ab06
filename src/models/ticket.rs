//! Helpdesk ticket models.
//!
//! Tickets are opened by an account and addressed to a sector. Their status
//! moves `open -> in_progress -> closed`; an in-progress ticket may be handed
//! back to `open`, and closed tickets are final.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::validation::{self, ValidationError};

/// Represents a row of the `tickets` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Ticket {
    pub id: Uuid,

    /// Account that opened the ticket
    pub ong_id: String,

    /// Sector the ticket is addressed to
    pub sector_id: i32,

    pub title: String,
    pub description: String,

    /// `open`, `in_progress` or `closed`
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Ticket status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(ValidationError::InvalidVariant {
                field: "status",
                value: other.to_string(),
            }),
        }
    }

    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, next),
            (Open, InProgress) | (Open, Closed) | (InProgress, Closed) | (InProgress, Open)
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for `POST /tickets`.
#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
    pub sector_id: i32,
}

impl CreateTicketRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("title", &self.title, 120)?;
        validation::required("description", &self.description, 2000)?;
        validation::sector(self.sector_id)
    }
}

/// Request body for `PUT /tickets/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

/// Query string for `GET /tickets`.
#[derive(Debug, Default, Deserialize)]
pub struct TicketQuery {
    pub status: Option<TicketStatus>,
}
