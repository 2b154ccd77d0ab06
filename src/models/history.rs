//! Visitor entry/exit history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::validation::{self, ValidationError};

/// Represents a row of the `history` table.
///
/// An entry is open while `exit_at` is NULL; the database allows one open
/// entry per visitor.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub visitor_id: Uuid,

    /// Account that registered the entry
    pub ong_id: String,

    pub sector_id: i32,
    pub entry_at: DateTime<Utc>,
    pub exit_at: Option<DateTime<Utc>>,
    pub observation: Option<String>,
}

/// History entry joined with the visitor's name, as listed to clients.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct HistoryListItem {
    pub id: Uuid,
    pub visitor_id: Uuid,
    pub visitor_name: String,
    pub ong_id: String,
    pub sector_id: i32,
    pub entry_at: DateTime<Utc>,
    pub exit_at: Option<DateTime<Utc>>,
    pub observation: Option<String>,
}

/// Request body for `POST /history` (check-in).
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub visitor_id: Uuid,

    /// Defaults to the sector stored on the visitor
    pub sector_id: Option<i32>,

    pub observation: Option<String>,
}

impl CheckInRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(sector_id) = self.sector_id {
            validation::sector(sector_id)?;
        }
        validation::optional("observation", self.observation.as_deref(), 500)
    }
}

/// Query string for `GET /history`.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub visitor_id: Option<Uuid>,

    /// `true` lists only visitors still inside, `false` only closed entries
    pub open: Option<bool>,
}
