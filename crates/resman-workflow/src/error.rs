//! Workflow error types.

use chrono::NaiveDate;
use resman_core::error::ResmanError;
use resman_core::models::allocation::AllocationStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WorkflowError {
    #[error("please select an employee from the available employees table")]
    NoEmployeeSelected,

    #[error("please select only one employee")]
    MultipleEmployeesSelected,

    #[error("selected employee {0} is not in the candidate list")]
    EmployeeNotInCandidates(String),

    #[error("selected employee {0} does not match the flagged candidate")]
    SelectionMismatch(String),

    #[error("employee {0} is not available for this allocation")]
    EmployeeUnavailable(String),

    #[error("project, dates and allocation percentage must all be set")]
    IncompleteRequest,

    #[error("end date cannot be before start date")]
    EndBeforeStart,

    #[error("allocation percentage must be between 0 and 100, got {0}")]
    PercentageOutOfRange(i64),

    #[error("effective date must be after the assignment start date")]
    EffectiveDateTooEarly,

    #[error("effective date must not be after the assignment end date")]
    EffectiveDateTooLate,

    #[error("a reason is required")]
    EmptyReason,

    #[error("this period has already been split; change its successor instead")]
    AlreadySuperseded,

    #[error("end date must be before the successor period starting {0}")]
    EndOverlapsSuccessor(NaiveDate),

    #[error("field {0} is read-only")]
    FieldReadOnly(&'static str),

    #[error("only the approver role can {0} allocation requests")]
    ApproverRequired(&'static str),

    #[error("only the requester can submit this allocation request")]
    RequesterRequired,

    #[error("only a system manager can override the status of a finalized request")]
    SystemManagerRequired,

    #[error("not permitted to modify this allocation request")]
    AccessDenied,

    #[error("cannot {action} a {from} allocation request")]
    InvalidTransition {
        from: AllocationStatus,
        action: &'static str,
    },
}

impl From<WorkflowError> for ResmanError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::ApproverRequired(_)
            | WorkflowError::RequesterRequired
            | WorkflowError::SystemManagerRequired
            | WorkflowError::AccessDenied
            | WorkflowError::FieldReadOnly(_) => ResmanError::AuthorizationDenied {
                reason: err.to_string(),
            },
            WorkflowError::InvalidTransition { from, action } => {
                ResmanError::InvalidStateTransition {
                    from: from.to_string(),
                    action: action.into(),
                }
            }
            other => ResmanError::Validation {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_errors_are_validation() {
        for err in [
            WorkflowError::NoEmployeeSelected,
            WorkflowError::MultipleEmployeesSelected,
            WorkflowError::EmptyReason,
            WorkflowError::AlreadySuperseded,
            WorkflowError::EndOverlapsSuccessor(NaiveDate::MIN),
        ] {
            assert!(matches!(
                ResmanError::from(err),
                ResmanError::Validation { .. }
            ));
        }
    }

    #[test]
    fn role_errors_are_authorization() {
        let err: ResmanError = WorkflowError::ApproverRequired("approve").into();
        assert!(matches!(err, ResmanError::AuthorizationDenied { .. }));
    }

    #[test]
    fn transition_error_keeps_the_source_status() {
        let err: ResmanError = WorkflowError::InvalidTransition {
            from: AllocationStatus::Approved,
            action: "approve",
        }
        .into();
        match err {
            ResmanError::InvalidStateTransition { from, action } => {
                assert_eq!(from, "Approved");
                assert_eq!(action, "approve");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
