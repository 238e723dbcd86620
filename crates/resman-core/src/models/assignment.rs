//! Project assignment domain model.
//!
//! A project assignment is a time-bounded commitment of one employee to
//! one project. Changing the allocation percentage part-way through
//! closes the current period and opens a successor, so the history of an
//! assignment is a chain of periods linked by `supersedes` /
//! `superseded_by`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::change_note::CreateChangeNote;

/// Date-derived status of an assignment period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssignmentStatus {
    Planned,
    Active,
    Completed,
}

impl AssignmentStatus {
    pub const ALL: [AssignmentStatus; 3] = [
        AssignmentStatus::Planned,
        AssignmentStatus::Active,
        AssignmentStatus::Completed,
    ];

    /// Status of a period on `today`.
    pub fn for_date(start_date: NaiveDate, end_date: NaiveDate, today: NaiveDate) -> Self {
        if today < start_date {
            AssignmentStatus::Planned
        } else if today <= end_date {
            AssignmentStatus::Active
        } else {
            AssignmentStatus::Completed
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Planned => "Planned",
            AssignmentStatus::Active => "Active",
            AssignmentStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAssignment {
    pub id: Uuid,
    pub project: String,
    pub employee: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub allocation_percentage: u8,
    pub status: AssignmentStatus,
    /// The allocation request this assignment was created from.
    pub allocation_reference: Option<Uuid>,
    pub estimated_total_cost: f64,
    /// The period this one replaced.
    pub supersedes: Option<Uuid>,
    /// The period that replaced this one.
    pub superseded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectAssignment {
    /// Inclusive number of days covered.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectAssignment {
    pub project: String,
    pub employee: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub allocation_percentage: u8,
    pub status: AssignmentStatus,
    pub allocation_reference: Option<Uuid>,
    pub estimated_total_cost: f64,
    pub supersedes: Option<Uuid>,
}

/// An in-place end date change with its audit note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndDateChange {
    pub new_end_date: NaiveDate,
    pub status: AssignmentStatus,
    pub note: CreateChangeNote,
}

/// Closing a period early and opening its successor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSplit {
    /// New end date of the original period (the day before the successor
    /// starts).
    pub closed_end_date: NaiveDate,
    pub closed_status: AssignmentStatus,
    pub closed_estimated_cost: f64,
    /// `supersedes` points at the original period.
    pub successor: CreateProjectAssignment,
    /// Attached to the original period.
    pub note: CreateChangeNote,
}

/// Load an employee carries on another assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveAllocation {
    pub record_id: Uuid,
    pub allocation_percentage: u8,
}

/// Filters for assignment listings. Unset fields match everything.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssignmentFilter {
    pub employee: Option<String>,
    pub project: Option<String>,
    pub status: Option<AssignmentStatus>,
    /// Only periods starting on or after this date.
    pub from_date: Option<NaiveDate>,
    /// Only periods ending on or before this date.
    pub to_date: Option<NaiveDate>,
}
