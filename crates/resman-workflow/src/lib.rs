//! Allocation request approval, field permissions, candidate selection
//! and assignment change requests.

pub mod candidates;
pub mod change_request;
pub mod config;
pub mod error;
pub mod permissions;
pub mod progress;
pub mod reports;
pub mod selection;
pub mod service;
pub mod status_sync;
pub mod transitions;
pub mod workload;

pub use change_request::{ChangeHistory, ChangeRequestService};
pub use config::{SyncConfig, WorkflowConfig};
pub use error::WorkflowError;
pub use permissions::{Access, EditableFields, compute_editable, has_permission};
pub use reports::ReportService;
pub use service::AllocationWorkflow;
pub use status_sync::sync_assignment_statuses;
pub use workload::{WorkloadAssessment, WorkloadLevel, check_employee_workload};
