//! Workflow configuration.

/// Configuration for the allocation workflow.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Only the user who created a request may submit it (default: true).
    pub restrict_submit_to_requester: bool,
    /// Ask the availability resolver again before approving (default: true).
    pub recheck_availability_on_approve: bool,
    /// Create a project assignment when a request is approved
    /// (default: true).
    pub create_assignment_on_approve: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            restrict_submit_to_requester: true,
            recheck_availability_on_approve: true,
            create_assignment_on_approve: true,
        }
    }
}

/// Schedule for the assignment status sync job.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Seconds between runs (default: 86400, once a day).
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 86_400,
        }
    }
}
