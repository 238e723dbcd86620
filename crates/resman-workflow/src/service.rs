//! Allocation workflow service: drafting, candidate selection and the
//! submit / approve / reject orchestration.

use chrono::Utc;
use resman_core::error::ResmanResult;
use resman_core::models::actor::{Actor, Role};
use resman_core::models::allocation::{
    AllocationRequest, AllocationStatus, CreateAllocationRequest, NewAllocationRequest,
    UpdateAllocationRequest,
};
use resman_core::models::assignment::{AssignmentStatus, CreateProjectAssignment};
use resman_core::models::candidate::{AvailabilityQuery, EmployeeCandidate};
use resman_core::models::notification::{CreateNotification, NotificationKind, Recipient};
use resman_core::repository::{
    AllocationRequestRepository, AssignmentRepository, AvailabilityResolver, Notifier,
    PaginatedResult, Pagination,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::candidates::reconcile;
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::permissions::{Access, has_permission};
use crate::selection::set_selected;
use crate::transitions;

/// Allocation workflow service.
///
/// Generic over repository implementations so that the workflow layer
/// has no dependency on the database crate.
pub struct AllocationWorkflow<A, R, S, N>
where
    A: AllocationRequestRepository,
    R: AvailabilityResolver,
    S: AssignmentRepository,
    N: Notifier,
{
    requests: A,
    resolver: R,
    assignments: S,
    notifier: N,
    config: WorkflowConfig,
}

impl<A, R, S, N> AllocationWorkflow<A, R, S, N>
where
    A: AllocationRequestRepository,
    R: AvailabilityResolver,
    S: AssignmentRepository,
    N: Notifier,
{
    pub fn new(
        requests: A,
        resolver: R,
        assignments: S,
        notifier: N,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            requests,
            resolver,
            assignments,
            notifier,
            config,
        }
    }

    /// Create a Draft request owned by `actor`.
    ///
    /// The candidate table is populated right away when project, dates
    /// and percentage are all given.
    pub async fn create_draft(
        &self,
        actor: &Actor,
        input: CreateAllocationRequest,
    ) -> ResmanResult<AllocationRequest> {
        transitions::validate_fields(
            input.start_date,
            input.end_date,
            input.allocation_percentage,
        )?;

        let query = match (
            &input.project,
            input.start_date,
            input.end_date,
            input.allocation_percentage,
        ) {
            (Some(project), Some(start_date), Some(end_date), Some(allocation_percentage)) => {
                Some(AvailabilityQuery {
                    project: project.clone(),
                    start_date,
                    end_date,
                    allocation_percentage,
                    excluding_request: None,
                })
            }
            _ => None,
        };
        let candidate_employees = match query {
            Some(query) => self.load_candidates(query).await?,
            None => Vec::new(),
        };

        let request = self
            .requests
            .create(NewAllocationRequest {
                requested_by: actor.user.clone(),
                project: input.project,
                start_date: input.start_date,
                end_date: input.end_date,
                allocation_percentage: input.allocation_percentage,
                notes: input.notes.unwrap_or_default(),
                candidate_employees,
            })
            .await?;

        info!(
            request_id = %request.id,
            requested_by = %request.requested_by,
            "Allocation draft created"
        );
        Ok(request)
    }

    /// Apply field edits to a request.
    ///
    /// When the edit leaves project, dates and percentage all defined the
    /// candidate table is rebuilt and written in the same update.
    pub async fn update_draft(
        &self,
        actor: &Actor,
        id: Uuid,
        mut input: UpdateAllocationRequest,
    ) -> ResmanResult<AllocationRequest> {
        let record = self.requests.get_by_id(id).await?;
        transitions::check_update(&record, actor, &input)?;

        input.candidate_employees = None;
        if input.touches_availability_fields() {
            let merged = AllocationRequest {
                project: input.project.clone().or_else(|| record.project.clone()),
                start_date: input.start_date.or(record.start_date),
                end_date: input.end_date.or(record.end_date),
                allocation_percentage: input
                    .allocation_percentage
                    .or(record.allocation_percentage),
                ..record.clone()
            };
            if let Some(query) = merged.availability_query() {
                input.candidate_employees = Some(self.load_candidates(query).await?);
            }
        }

        self.requests.update(id, input).await
    }

    /// Rebuild the candidate table from a fresh availability lookup.
    pub async fn refresh_candidates(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> ResmanResult<AllocationRequest> {
        let record = self.load_draft_for_write(actor, id, "refresh").await?;
        let query = record
            .availability_query()
            .ok_or(WorkflowError::IncompleteRequest)?;
        let candidates = self.load_candidates(query).await?;

        self.requests
            .update(
                id,
                UpdateAllocationRequest {
                    candidate_employees: Some(candidates),
                    ..Default::default()
                },
            )
            .await
    }

    /// Toggle the selection flag of one candidate row.
    pub async fn select_candidate(
        &self,
        actor: &Actor,
        id: Uuid,
        employee: &str,
        selected: bool,
    ) -> ResmanResult<AllocationRequest> {
        let record = self.load_draft_for_write(actor, id, "select").await?;
        let mut candidates = record.candidate_employees;
        set_selected(&mut candidates, employee, selected)?;

        self.requests
            .update(
                id,
                UpdateAllocationRequest {
                    candidate_employees: Some(candidates),
                    ..Default::default()
                },
            )
            .await
    }

    /// Draft -> Requested, then notify approvers.
    pub async fn submit(
        &self,
        actor: &Actor,
        id: Uuid,
        selected_employee: &str,
    ) -> ResmanResult<AllocationRequest> {
        let record = self.requests.get_by_id(id).await?;
        let transition = transitions::submit(
            &record,
            actor,
            selected_employee,
            self.config.restrict_submit_to_requester,
            Utc::now(),
        )?;

        let updated = self
            .requests
            .persist_status_transition(id, transition)
            .await?;
        info!(request_id = %id, employee = selected_employee, "Allocation request submitted");

        self.send(CreateNotification {
            recipient: Recipient::Approvers,
            kind: NotificationKind::Alert,
            subject: format!("New Resource Allocation Request: {id}"),
            body: describe(&updated, "A new resource allocation request has been submitted."),
            allocation_request: id,
        })
        .await;

        Ok(updated)
    }

    /// Requested -> Approved, creating the project assignment, then notify
    /// the requester.
    pub async fn approve(&self, actor: &Actor, id: Uuid) -> ResmanResult<AllocationRequest> {
        let record = self.requests.get_by_id(id).await?;
        let transition = transitions::approve(&record, actor)?;

        let employee = record
            .requested_employee
            .clone()
            .ok_or(WorkflowError::NoEmployeeSelected)?;
        let query = record
            .availability_query()
            .ok_or(WorkflowError::IncompleteRequest)?;

        if self.config.recheck_availability_on_approve {
            let availability = self
                .resolver
                .fetch_available_employees(query.clone())
                .await?;
            if !availability.available.iter().any(|c| c.employee == employee) {
                warn!(
                    request_id = %id,
                    employee = %employee,
                    "Requested employee no longer available"
                );
                return Err(WorkflowError::EmployeeUnavailable(employee).into());
            }
        }

        // Created before the status write; a retry finds it by reference.
        if self.config.create_assignment_on_approve {
            self.ensure_assignment(&record, &employee, &query).await?;
        }

        let updated = self
            .requests
            .persist_status_transition(id, transition)
            .await?;
        info!(request_id = %id, approver = %actor.user, "Allocation request approved");

        self.send(CreateNotification {
            recipient: Recipient::User(updated.requested_by.clone()),
            kind: NotificationKind::Success,
            subject: format!("Resource Allocation Approved: {id}"),
            body: describe(&updated, "Your resource allocation request has been approved."),
            allocation_request: id,
        })
        .await;

        Ok(updated)
    }

    /// Requested -> Rejected with a mandatory reason, then notify the
    /// requester.
    pub async fn reject(
        &self,
        actor: &Actor,
        id: Uuid,
        reason: &str,
    ) -> ResmanResult<AllocationRequest> {
        let record = self.requests.get_by_id(id).await?;
        let transition = transitions::reject(&record, actor, reason, Utc::now().date_naive())?;

        let updated = self
            .requests
            .persist_status_transition(id, transition)
            .await?;
        info!(request_id = %id, approver = %actor.user, "Allocation request rejected");

        self.send(CreateNotification {
            recipient: Recipient::User(updated.requested_by.clone()),
            kind: NotificationKind::Error,
            subject: format!("Resource Allocation Rejected: {id}"),
            body: format!(
                "{}\n\nReason: {reason}",
                describe(&updated, "Your resource allocation request has been rejected.")
            ),
            allocation_request: id,
        })
        .await;

        Ok(updated)
    }

    /// Force the status of any request. System managers only.
    pub async fn override_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: AllocationStatus,
    ) -> ResmanResult<AllocationRequest> {
        let record = self.requests.get_by_id(id).await?;
        let transition = transitions::override_status(&record, actor, status)?;
        warn!(
            request_id = %id,
            actor = %actor.user,
            from = %record.status,
            to = %status,
            "Allocation status overridden"
        );
        self.requests.persist_status_transition(id, transition).await
    }

    /// Delete a Draft request.
    pub async fn delete_draft(&self, actor: &Actor, id: Uuid) -> ResmanResult<()> {
        let record = self.requests.get_by_id(id).await?;
        if record.status != AllocationStatus::Draft && actor.role != Role::SystemManager {
            return Err(WorkflowError::InvalidTransition {
                from: record.status,
                action: "delete",
            }
            .into());
        }
        if !has_permission(Some(&record), actor, Access::Delete) {
            return Err(WorkflowError::AccessDenied.into());
        }
        self.requests.delete(id).await
    }

    /// Requests visible to `actor`: everything for approvers and system
    /// managers, only their own for everyone else.
    pub async fn list_for(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> ResmanResult<PaginatedResult<AllocationRequest>> {
        let owner = match actor.role {
            Role::Employee => Some(actor.user.as_str()),
            Role::Approver | Role::SystemManager => None,
        };
        self.requests.list(owner, pagination).await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> ResmanResult<AllocationRequest> {
        let record = self.requests.get_by_id(id).await?;
        if !has_permission(Some(&record), actor, Access::Read) {
            return Err(WorkflowError::AccessDenied.into());
        }
        Ok(record)
    }

    async fn load_draft_for_write(
        &self,
        actor: &Actor,
        id: Uuid,
        action: &'static str,
    ) -> ResmanResult<AllocationRequest> {
        let record = self.requests.get_by_id(id).await?;
        if record.status != AllocationStatus::Draft {
            return Err(WorkflowError::InvalidTransition {
                from: record.status,
                action,
            }
            .into());
        }
        if !has_permission(Some(&record), actor, Access::Write) {
            return Err(WorkflowError::AccessDenied.into());
        }
        Ok(record)
    }

    async fn load_candidates(
        &self,
        query: AvailabilityQuery,
    ) -> ResmanResult<Vec<EmployeeCandidate>> {
        let result = self.resolver.fetch_available_employees(query).await?;
        Ok(reconcile(result))
    }

    async fn ensure_assignment(
        &self,
        record: &AllocationRequest,
        employee: &str,
        query: &AvailabilityQuery,
    ) -> ResmanResult<()> {
        if let Some(existing) = self
            .assignments
            .get_by_allocation_reference(record.id)
            .await?
        {
            info!(
                request_id = %record.id,
                assignment_id = %existing.id,
                "Project assignment already exists for this allocation"
            );
            return Ok(());
        }

        let estimated_total_cost = record
            .candidate_employees
            .iter()
            .find(|c| c.employee == employee)
            .map(|c| c.estimated_cost)
            .unwrap_or_default();

        let assignment = self
            .assignments
            .create(CreateProjectAssignment {
                project: query.project.clone(),
                employee: employee.to_string(),
                start_date: query.start_date,
                end_date: query.end_date,
                allocation_percentage: query.allocation_percentage,
                status: AssignmentStatus::for_date(
                    query.start_date,
                    query.end_date,
                    Utc::now().date_naive(),
                ),
                allocation_reference: Some(record.id),
                estimated_total_cost,
                supersedes: None,
            })
            .await?;

        info!(
            request_id = %record.id,
            assignment_id = %assignment.id,
            "Project assignment created"
        );
        Ok(())
    }

    async fn send(&self, notification: CreateNotification) {
        let request_id = notification.allocation_request;
        if let Err(err) = self.notifier.notify(notification).await {
            warn!(request_id = %request_id, error = %err, "Failed to deliver notification");
        }
    }
}

fn describe(record: &AllocationRequest, headline: &str) -> String {
    let period = match (record.start_date, record.end_date) {
        (Some(start), Some(end)) => format!("{start} to {end}"),
        _ => "-".to_string(),
    };
    format!(
        "{headline}\n\nRequest: {}\nProject: {}\nRequested By: {}\nEmployee: {}\nPeriod: {period}\nAllocation: {}%",
        record.id,
        record.project.as_deref().unwrap_or("-"),
        record.requested_by,
        record.requested_employee.as_deref().unwrap_or("-"),
        record.allocation_percentage.unwrap_or_default(),
    )
}
