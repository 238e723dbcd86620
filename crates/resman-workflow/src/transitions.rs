//! Allocation request state machine.
//!
//! ```text
//! Draft --submit--> Requested --approve--> Approved
//!                             \--reject--> Rejected
//! ```
//!
//! Each function takes a snapshot of the record and the acting user and
//! either returns the [`StatusTransition`] to persist or the reason the
//! action is refused. Nothing here performs I/O.

use chrono::{DateTime, NaiveDate, Utc};
use resman_core::models::actor::{Actor, Role};
use resman_core::models::allocation::{
    AllocationRequest, AllocationStatus, StatusTransition, UpdateAllocationRequest,
};

use crate::error::WorkflowError;
use crate::permissions::{Access, compute_editable, has_permission};
use crate::selection::single_selection;

fn require_status(
    record: &AllocationRequest,
    expected: AllocationStatus,
    action: &'static str,
) -> Result<(), WorkflowError> {
    if record.status == expected {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition {
            from: record.status,
            action,
        })
    }
}

/// Draft -> Requested.
///
/// The candidate table is re-validated here: exactly one row must be
/// flagged, it must be `selected_employee`, and it must be available.
pub fn submit(
    record: &AllocationRequest,
    actor: &Actor,
    selected_employee: &str,
    restrict_to_requester: bool,
    now: DateTime<Utc>,
) -> Result<StatusTransition, WorkflowError> {
    require_status(record, AllocationStatus::Draft, "submit")?;

    if restrict_to_requester && record.requested_by != actor.user {
        return Err(WorkflowError::RequesterRequired);
    }
    if record.availability_query().is_none() {
        return Err(WorkflowError::IncompleteRequest);
    }

    let candidate = single_selection(&record.candidate_employees)?;
    if candidate.employee != selected_employee {
        return Err(WorkflowError::SelectionMismatch(
            selected_employee.to_string(),
        ));
    }
    if !candidate.is_available {
        return Err(WorkflowError::EmployeeUnavailable(
            candidate.employee_name.clone(),
        ));
    }

    Ok(StatusTransition {
        requested_employee: Some(selected_employee.to_string()),
        request_date: Some(now),
        ..StatusTransition::to(AllocationStatus::Requested)
    })
}

/// Requested -> Approved. Approver only.
pub fn approve(
    record: &AllocationRequest,
    actor: &Actor,
) -> Result<StatusTransition, WorkflowError> {
    require_status(record, AllocationStatus::Requested, "approve")?;

    if !actor.is_approver() {
        return Err(WorkflowError::ApproverRequired("approve"));
    }
    if record.requested_employee.is_none() {
        return Err(WorkflowError::NoEmployeeSelected);
    }

    Ok(StatusTransition::to(AllocationStatus::Approved))
}

/// Requested -> Rejected. Approver only; the reason must not be blank.
///
/// The reason is stored verbatim and a dated copy is appended to the
/// request notes.
pub fn reject(
    record: &AllocationRequest,
    actor: &Actor,
    reason: &str,
    today: NaiveDate,
) -> Result<StatusTransition, WorkflowError> {
    require_status(record, AllocationStatus::Requested, "reject")?;

    if !actor.is_approver() {
        return Err(WorkflowError::ApproverRequired("reject"));
    }
    if reason.trim().is_empty() {
        return Err(WorkflowError::EmptyReason);
    }

    let entry = format!("Rejection Reason ({today}): {reason}");
    let notes = if record.notes.is_empty() {
        entry
    } else {
        format!("{}\n\n{entry}", record.notes)
    };

    Ok(StatusTransition {
        notes: Some(notes),
        rejection_reason: Some(reason.to_string()),
        ..StatusTransition::to(AllocationStatus::Rejected)
    })
}

/// Privileged status override, the only change allowed on a finalized
/// request. System managers only.
pub fn override_status(
    record: &AllocationRequest,
    actor: &Actor,
    status: AllocationStatus,
) -> Result<StatusTransition, WorkflowError> {
    if actor.role != Role::SystemManager {
        return Err(WorkflowError::SystemManagerRequired);
    }
    if record.status == status {
        return Err(WorkflowError::InvalidTransition {
            from: record.status,
            action: "override",
        });
    }
    Ok(StatusTransition::to(status))
}

/// Check that `actor` may apply `update` to `record`, and that the
/// resulting field values are consistent.
pub fn check_update(
    record: &AllocationRequest,
    actor: &Actor,
    update: &UpdateAllocationRequest,
) -> Result<(), WorkflowError> {
    if record.status.is_terminal() {
        return Err(WorkflowError::InvalidTransition {
            from: record.status,
            action: "edit",
        });
    }
    if !has_permission(Some(record), actor, Access::Write) {
        return Err(WorkflowError::AccessDenied);
    }

    let editable = compute_editable(record.status, actor.role);
    let edits = [
        ("project", update.project.is_some(), editable.project),
        ("start_date", update.start_date.is_some(), editable.start_date),
        ("end_date", update.end_date.is_some(), editable.end_date),
        (
            "allocation_percentage",
            update.allocation_percentage.is_some(),
            editable.allocation_percentage,
        ),
        ("notes", update.notes.is_some(), editable.notes),
    ];
    if let Some((field, _, _)) = edits
        .iter()
        .find(|(_, requested, allowed)| *requested && !*allowed)
    {
        return Err(WorkflowError::FieldReadOnly(*field));
    }

    validate_fields(
        update.start_date.or(record.start_date),
        update.end_date.or(record.end_date),
        update.allocation_percentage.or(record.allocation_percentage),
    )
}

/// Date range and percentage checks shared by create and update.
pub fn validate_fields(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    allocation_percentage: Option<u8>,
) -> Result<(), WorkflowError> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            return Err(WorkflowError::EndBeforeStart);
        }
    }
    if let Some(pct) = allocation_percentage {
        if pct > 100 {
            return Err(WorkflowError::PercentageOutOfRange(i64::from(pct)));
        }
    }
    Ok(())
}
