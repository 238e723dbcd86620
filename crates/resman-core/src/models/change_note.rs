//! Change note domain model.
//!
//! Change notes are the audit trail of change requests made against a
//! project assignment. They are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeKind {
    EndDate,
    AllocationPercentage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeNote {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub kind: ChangeKind,
    pub author: String,
    /// Human-readable summary of the change.
    pub content: String,
    /// The reason exactly as supplied by the author.
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChangeNote {
    pub assignment_id: Uuid,
    pub kind: ChangeKind,
    pub author: String,
    pub content: String,
    pub reason: String,
}
