//! Projected workload warnings for an employee.

use resman_core::error::ResmanResult;
use resman_core::models::assignment::ActiveAllocation;
use resman_core::repository::AssignmentRepository;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Projected totals above this are worth a caution.
pub const CAUTION_THRESHOLD: u32 = 80;
/// Projected totals above this mean the employee is over-allocated.
pub const OVER_ALLOCATION_THRESHOLD: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkloadLevel {
    Normal,
    Caution,
    OverAllocated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkloadAssessment {
    pub projected_total: u32,
    pub level: WorkloadLevel,
}

impl WorkloadAssessment {
    pub fn message(&self) -> Option<String> {
        match self.level {
            WorkloadLevel::Normal => None,
            WorkloadLevel::Caution => Some(format!(
                "Employee will be {}% allocated",
                self.projected_total
            )),
            WorkloadLevel::OverAllocated => Some(format!(
                "Warning: Employee will be {}% allocated (over-allocated)",
                self.projected_total
            )),
        }
    }
}

/// Classify a projected allocation total.
pub fn level_for(projected_total: u32) -> WorkloadLevel {
    if projected_total > OVER_ALLOCATION_THRESHOLD {
        WorkloadLevel::OverAllocated
    } else if projected_total > CAUTION_THRESHOLD {
        WorkloadLevel::Caution
    } else {
        WorkloadLevel::Normal
    }
}

/// Sum `existing` allocations (skipping `current_record` itself) plus
/// `proposed`, and classify the total.
pub fn assess(
    existing: &[ActiveAllocation],
    current_record: Option<Uuid>,
    proposed: u8,
) -> WorkloadAssessment {
    let others: u32 = existing
        .iter()
        .filter(|a| Some(a.record_id) != current_record)
        .map(|a| u32::from(a.allocation_percentage))
        .sum();
    let projected_total = others + u32::from(proposed);

    WorkloadAssessment {
        projected_total,
        level: level_for(projected_total),
    }
}

/// Look up `employee`'s active assignments and assess the projected load
/// of adding `proposed` percent.
pub async fn check_employee_workload<S: AssignmentRepository>(
    assignments: &S,
    employee: &str,
    current_record: Option<Uuid>,
    proposed: u8,
) -> ResmanResult<WorkloadAssessment> {
    let existing = assignments
        .fetch_active_assignments_for_employee(employee)
        .await?;
    let assessment = assess(&existing, current_record, proposed);
    debug!(
        employee,
        projected_total = assessment.projected_total,
        level = ?assessment.level,
        "Assessed employee workload"
    );
    Ok(assessment)
}
