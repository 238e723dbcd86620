//! Field and record permissions for allocation requests.
//!
//! Both policies are pure functions of the request status and the acting
//! role; they read nothing else and have no side effects.

use resman_core::models::actor::{Actor, Role};
use resman_core::models::allocation::{AllocationRequest, AllocationStatus};
use serde::Serialize;

/// Which fields of an allocation request the actor may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditableFields {
    pub project: bool,
    pub start_date: bool,
    pub end_date: bool,
    pub allocation_percentage: bool,
    pub status: bool,
    pub notes: bool,
    /// System-assigned; always false.
    pub requested_by: bool,
    /// System-assigned; always false.
    pub request_date: bool,
}

/// Derive the editable field set for `status` and `role`.
pub fn compute_editable(status: AllocationStatus, role: Role) -> EditableFields {
    let is_approver = role == Role::Approver;
    let core = status == AllocationStatus::Draft && !is_approver;

    EditableFields {
        project: core,
        start_date: core,
        end_date: core,
        allocation_percentage: core,
        status: is_approver,
        notes: status == AllocationStatus::Draft || is_approver,
        requested_by: false,
        request_date: false,
    }
}

/// Kinds of record access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Delete,
}

/// Record-level permission check.
///
/// `record` is `None` for a request that has not been saved yet, which
/// anyone may create.
pub fn has_permission(record: Option<&AllocationRequest>, actor: &Actor, access: Access) -> bool {
    if actor.role == Role::SystemManager {
        return true;
    }
    let Some(record) = record else {
        return true;
    };
    let is_requester = record.requested_by == actor.user;

    match record.status {
        AllocationStatus::Draft => {
            if actor.is_approver() {
                access == Access::Read
            } else if is_requester {
                true
            } else {
                access == Access::Read
            }
        }
        // Approvers write to change status while Requested and to keep
        // notes once finalized.
        AllocationStatus::Requested | AllocationStatus::Approved | AllocationStatus::Rejected => {
            if actor.is_approver() {
                matches!(access, Access::Read | Access::Write)
            } else {
                access == Access::Read
            }
        }
    }
}

/// Whether `record` shows up in `actor`'s list view.
pub fn can_list(record: &AllocationRequest, actor: &Actor) -> bool {
    match actor.role {
        Role::Approver | Role::SystemManager => true,
        Role::Employee => record.requested_by == actor.user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn request(status: AllocationStatus, requested_by: &str) -> AllocationRequest {
        AllocationRequest {
            id: Uuid::new_v4(),
            status,
            project: None,
            requested_employee: None,
            start_date: None,
            end_date: None,
            allocation_percentage: None,
            requested_by: requested_by.into(),
            request_date: None,
            notes: String::new(),
            rejection_reason: None,
            candidate_employees: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn compute_editable_is_total_and_deterministic() {
        for status in AllocationStatus::ALL {
            for role in Role::ALL {
                let first = compute_editable(status, role);
                assert_eq!(first, compute_editable(status, role));

                let core = status == AllocationStatus::Draft && role != Role::Approver;
                assert_eq!(first.project, core, "{status} / {role:?}");
                assert_eq!(first.start_date, core);
                assert_eq!(first.end_date, core);
                assert_eq!(first.allocation_percentage, core);
                assert_eq!(first.status, role == Role::Approver);
                assert_eq!(
                    first.notes,
                    status == AllocationStatus::Draft || role == Role::Approver
                );
                assert!(!first.requested_by);
                assert!(!first.request_date);
            }
        }
    }

    #[test]
    fn approver_cannot_edit_draft_core_fields() {
        let fields = compute_editable(AllocationStatus::Draft, Role::Approver);
        assert!(!fields.project);
        assert!(fields.notes);
        assert!(fields.status);
    }

    #[test]
    fn employee_notes_lock_after_submission() {
        let fields = compute_editable(AllocationStatus::Requested, Role::Employee);
        assert!(!fields.notes);
        assert!(!fields.status);
    }

    #[test]
    fn draft_belongs_to_its_requester() {
        let record = request(AllocationStatus::Draft, "alice");
        let alice = Actor::new("alice", Role::Employee);
        let bob = Actor::new("bob", Role::Employee);
        let cgo = Actor::new("carol", Role::Approver);

        assert!(has_permission(Some(&record), &alice, Access::Delete));
        assert!(has_permission(Some(&record), &bob, Access::Read));
        assert!(!has_permission(Some(&record), &bob, Access::Write));
        assert!(!has_permission(Some(&record), &cgo, Access::Write));
    }

    #[test]
    fn requested_and_final_records_are_approver_writable() {
        let alice = Actor::new("alice", Role::Employee);
        let cgo = Actor::new("carol", Role::Approver);
        for status in [
            AllocationStatus::Requested,
            AllocationStatus::Approved,
            AllocationStatus::Rejected,
        ] {
            let record = request(status, "alice");
            assert!(has_permission(Some(&record), &cgo, Access::Write));
            assert!(!has_permission(Some(&record), &cgo, Access::Delete));
            assert!(!has_permission(Some(&record), &alice, Access::Write));
            assert!(has_permission(Some(&record), &alice, Access::Read));
        }
    }

    #[test]
    fn system_manager_and_new_records() {
        let admin = Actor::new("root", Role::SystemManager);
        let record = request(AllocationStatus::Approved, "alice");
        assert!(has_permission(Some(&record), &admin, Access::Delete));
        assert!(has_permission(
            None,
            &Actor::new("bob", Role::Employee),
            Access::Write
        ));
    }

    #[test]
    fn employees_list_only_their_own_requests() {
        let record = request(AllocationStatus::Requested, "alice");
        assert!(can_list(&record, &Actor::new("alice", Role::Employee)));
        assert!(!can_list(&record, &Actor::new("bob", Role::Employee)));
        assert!(can_list(&record, &Actor::new("carol", Role::Approver)));
    }
}
