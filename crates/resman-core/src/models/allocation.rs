//! Allocation request domain model.
//!
//! An allocation request asks for one employee to be committed to a
//! project for a date range at a given percentage of their capacity.
//! Requests move through `Draft -> Requested -> {Approved, Rejected}`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::candidate::{AvailabilityQuery, EmployeeCandidate};

/// Lifecycle status of an allocation request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AllocationStatus {
    Draft,
    Requested,
    Approved,
    Rejected,
}

impl AllocationStatus {
    pub const ALL: [AllocationStatus; 4] = [
        AllocationStatus::Draft,
        AllocationStatus::Requested,
        AllocationStatus::Approved,
        AllocationStatus::Rejected,
    ];

    /// Approved and Rejected requests accept no further workflow actions.
    pub fn is_terminal(self) -> bool {
        matches!(self, AllocationStatus::Approved | AllocationStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AllocationStatus::Draft => "Draft",
            AllocationStatus::Requested => "Requested",
            AllocationStatus::Approved => "Approved",
            AllocationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub id: Uuid,
    pub status: AllocationStatus,
    pub project: Option<String>,
    /// Set when the request leaves Draft.
    pub requested_employee: Option<String>,
    /// Inclusive start of the requested period.
    pub start_date: Option<NaiveDate>,
    /// Inclusive end of the requested period; never before `start_date`.
    pub end_date: Option<NaiveDate>,
    pub allocation_percentage: Option<u8>,
    /// Identity of the creating actor. Immutable.
    pub requested_by: String,
    /// Set at submission.
    pub request_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub rejection_reason: Option<String>,
    /// Available candidates first, then unavailable ones. At most one
    /// row is selected.
    pub candidate_employees: Vec<EmployeeCandidate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AllocationRequest {
    /// The availability lookup for this request, once project, both dates
    /// and the percentage are all defined.
    pub fn availability_query(&self) -> Option<AvailabilityQuery> {
        Some(AvailabilityQuery {
            project: self.project.clone()?,
            start_date: self.start_date?,
            end_date: self.end_date?,
            allocation_percentage: self.allocation_percentage?,
            excluding_request: Some(self.id),
        })
    }

    pub fn selected_candidates(&self) -> impl Iterator<Item = &EmployeeCandidate> {
        self.candidate_employees.iter().filter(|c| c.selected)
    }
}

/// Fields required to create a new draft request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateAllocationRequest {
    pub project: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub allocation_percentage: Option<u8>,
    pub notes: Option<String>,
}

/// Input handed to the repository when persisting a new draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAllocationRequest {
    pub requested_by: String,
    pub project: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub allocation_percentage: Option<u8>,
    pub notes: String,
    pub candidate_employees: Vec<EmployeeCandidate>,
}

/// Field edits on an existing request. `None` leaves a field unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAllocationRequest {
    pub project: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub allocation_percentage: Option<u8>,
    pub notes: Option<String>,
    /// Replaces the whole candidate sequence.
    pub candidate_employees: Option<Vec<EmployeeCandidate>>,
}

impl UpdateAllocationRequest {
    pub fn touches_availability_fields(&self) -> bool {
        self.project.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.allocation_percentage.is_some()
    }
}

/// A status change plus the fields written together with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransition {
    pub status: AllocationStatus,
    pub requested_employee: Option<String>,
    pub request_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub candidate_employees: Option<Vec<EmployeeCandidate>>,
}

impl StatusTransition {
    pub fn to(status: AllocationStatus) -> Self {
        Self {
            status,
            requested_employee: None,
            request_date: None,
            notes: None,
            rejection_reason: None,
            candidate_employees: None,
        }
    }
}
