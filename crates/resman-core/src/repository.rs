//! Repository and collaborator trait definitions.
//!
//! The workflow layer is generic over these traits so that it has no
//! dependency on a particular storage engine. All operations are async;
//! a failed call surfaces an error and writes nothing.

use uuid::Uuid;

use crate::error::ResmanResult;
use crate::models::{
    allocation::{
        AllocationRequest, NewAllocationRequest, StatusTransition, UpdateAllocationRequest,
    },
    assignment::{
        ActiveAllocation, AssignmentFilter, AssignmentStatus, CreateProjectAssignment,
        EndDateChange, PeriodSplit, ProjectAssignment,
    },
    candidate::{AvailabilityQuery, AvailabilityResult},
    change_note::{ChangeNote, CreateChangeNote},
    employee::{CreateEmployee, Employee, EmployeeStatus},
    notification::{CreateNotification, Notification},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Allocation requests
// ---------------------------------------------------------------------------

pub trait AllocationRequestRepository: Send + Sync {
    fn create(
        &self,
        input: NewAllocationRequest,
    ) -> impl Future<Output = ResmanResult<AllocationRequest>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ResmanResult<AllocationRequest>> + Send;
    /// Apply field edits (and optionally a new candidate sequence) in one
    /// write.
    fn update(
        &self,
        id: Uuid,
        input: UpdateAllocationRequest,
    ) -> impl Future<Output = ResmanResult<AllocationRequest>> + Send;
    /// Persist a status change together with its accompanying fields.
    fn persist_status_transition(
        &self,
        id: Uuid,
        transition: StatusTransition,
    ) -> impl Future<Output = ResmanResult<AllocationRequest>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ResmanResult<()>> + Send;
    /// Requests created by `requested_by`, or all of them when `None`.
    fn list(
        &self,
        requested_by: Option<&str>,
        pagination: Pagination,
    ) -> impl Future<Output = ResmanResult<PaginatedResult<AllocationRequest>>> + Send;
}

/// Looks up which employees can take on a requested allocation.
pub trait AvailabilityResolver: Send + Sync {
    fn fetch_available_employees(
        &self,
        query: AvailabilityQuery,
    ) -> impl Future<Output = ResmanResult<AvailabilityResult>> + Send;
}

// ---------------------------------------------------------------------------
// Project assignments
// ---------------------------------------------------------------------------

pub trait AssignmentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateProjectAssignment,
    ) -> impl Future<Output = ResmanResult<ProjectAssignment>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ResmanResult<ProjectAssignment>> + Send;
    fn get_by_allocation_reference(
        &self,
        allocation_id: Uuid,
    ) -> impl Future<Output = ResmanResult<Option<ProjectAssignment>>> + Send;
    /// Move the end date and append the audit note in one transaction.
    fn change_end_date(
        &self,
        id: Uuid,
        change: EndDateChange,
    ) -> impl Future<Output = ResmanResult<ProjectAssignment>> + Send;
    /// Close period `id`, open the successor linked to it, and append the
    /// audit note, all in one transaction. Returns `(original, successor)`.
    fn supersede(
        &self,
        id: Uuid,
        split: PeriodSplit,
    ) -> impl Future<Output = ResmanResult<(ProjectAssignment, ProjectAssignment)>> + Send;
    fn update_status(
        &self,
        id: Uuid,
        status: AssignmentStatus,
    ) -> impl Future<Output = ResmanResult<()>> + Send;
    /// Assignments matching `filter`, ordered by start date descending.
    fn list(
        &self,
        filter: AssignmentFilter,
    ) -> impl Future<Output = ResmanResult<Vec<ProjectAssignment>>> + Send;
    /// Active assignments of `employee`, ordered by start date.
    fn fetch_active_assignments_for_employee(
        &self,
        employee: &str,
    ) -> impl Future<Output = ResmanResult<Vec<ActiveAllocation>>> + Send;
}

pub trait ChangeNoteRepository: Send + Sync {
    fn create(
        &self,
        input: CreateChangeNote,
    ) -> impl Future<Output = ResmanResult<ChangeNote>> + Send;
    /// Notes attached to any of `assignment_ids`, oldest first.
    fn list_for_assignments(
        &self,
        assignment_ids: &[Uuid],
    ) -> impl Future<Output = ResmanResult<Vec<ChangeNote>>> + Send;
}

// ---------------------------------------------------------------------------
// Employees and notifications
// ---------------------------------------------------------------------------

pub trait EmployeeRepository: Send + Sync {
    fn create(&self, input: CreateEmployee) -> impl Future<Output = ResmanResult<Employee>> + Send;
    fn get_by_id(&self, id: &str) -> impl Future<Output = ResmanResult<Employee>> + Send;
    /// Employees that have not left, ordered by name.
    fn list_current(&self) -> impl Future<Output = ResmanResult<Vec<Employee>>> + Send;
    fn set_status(
        &self,
        id: &str,
        status: EmployeeStatus,
    ) -> impl Future<Output = ResmanResult<()>> + Send;
}

/// Delivers workflow notifications. Delivery failures never undo the
/// transition that triggered them.
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        input: CreateNotification,
    ) -> impl Future<Output = ResmanResult<Notification>> + Send;
}
