//! Employee candidates offered for an allocation request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Working hours assumed per calendar day for cost estimates.
pub const HOURS_PER_DAY: f64 = 8.0;

/// One row of the candidate table. Derived from the availability lookup,
/// never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeCandidate {
    pub employee: String,
    pub employee_name: String,
    pub department: Option<String>,
    /// Percentage already committed in the requested period.
    pub current_allocation: f64,
    /// `100 - current_allocation`.
    pub available_allocation: f64,
    pub hourly_cost_rate: f64,
    pub estimated_cost: f64,
    pub is_available: bool,
    pub selected: bool,
}

/// Parameters for an availability lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub project: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub allocation_percentage: u8,
    /// Assignments created from this request are not counted as load.
    pub excluding_request: Option<Uuid>,
}

impl AvailabilityQuery {
    /// Inclusive number of days in the requested period.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Estimated cost of the allocation at `hourly_cost_rate`, rounded to
    /// cents.
    pub fn estimated_cost(&self, hourly_cost_rate: f64) -> f64 {
        let hours = self.days() as f64 * HOURS_PER_DAY;
        let allocated = hours * f64::from(self.allocation_percentage) / 100.0;
        (allocated * hourly_cost_rate * 100.0).round() / 100.0
    }
}

/// Result of an availability lookup, partitioned by availability.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AvailabilityResult {
    pub available: Vec<EmployeeCandidate>,
    pub unavailable: Vec<EmployeeCandidate>,
}
