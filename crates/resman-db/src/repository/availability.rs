//! SurrealDB implementation of [`AvailabilityResolver`].

use std::collections::HashMap;

use resman_core::error::ResmanResult;
use resman_core::models::candidate::{AvailabilityQuery, AvailabilityResult, EmployeeCandidate};
use resman_core::repository::AvailabilityResolver;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct EmployeeLoadRow {
    record_id: String,
    employee_name: String,
    department: Option<String>,
    hourly_cost_rate: f64,
}

#[derive(Debug, SurrealValue)]
struct OverlapRow {
    employee: String,
    allocation_percentage: i64,
}

/// Computes candidate availability from active employees and their Active
/// assignments overlapping the requested period.
#[derive(Clone)]
pub struct SurrealAvailabilityResolver<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAvailabilityResolver<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AvailabilityResolver for SurrealAvailabilityResolver<C> {
    async fn fetch_available_employees(
        &self,
        query: AvailabilityQuery,
    ) -> ResmanResult<AvailabilityResult> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, employee_name, department, \
                 hourly_cost_rate FROM employee WHERE status = 'Active' \
                 ORDER BY employee_name ASC; \
                 SELECT employee, allocation_percentage FROM project_assignment \
                 WHERE status = 'Active' \
                 AND start_date <= $end_date AND end_date >= $start_date \
                 AND (allocation_reference = NONE \
                 OR allocation_reference != $excluding);",
            )
            .bind(("start_date", query.start_date.to_string()))
            .bind(("end_date", query.end_date.to_string()))
            .bind(("excluding", query.excluding_request.map(|id| id.to_string())))
            .await
            .map_err(DbError::from)?;

        let employees: Vec<EmployeeLoadRow> = result.take(0).map_err(DbError::from)?;
        let overlaps: Vec<OverlapRow> = result.take(1).map_err(DbError::from)?;

        let mut load: HashMap<String, i64> = HashMap::new();
        for row in overlaps {
            *load.entry(row.employee).or_default() += row.allocation_percentage;
        }

        let requested = f64::from(query.allocation_percentage);
        let mut availability = AvailabilityResult::default();
        for employee in employees {
            let current_allocation = load.get(&employee.record_id).copied().unwrap_or(0) as f64;
            let available_allocation = 100.0 - current_allocation;
            let is_available = available_allocation >= requested;
            let candidate = EmployeeCandidate {
                estimated_cost: query.estimated_cost(employee.hourly_cost_rate),
                employee: employee.record_id,
                employee_name: employee.employee_name,
                department: employee.department,
                current_allocation,
                available_allocation,
                hourly_cost_rate: employee.hourly_cost_rate,
                is_available,
                selected: false,
            };
            if is_available {
                availability.available.push(candidate);
            } else {
                availability.unavailable.push(candidate);
            }
        }

        availability
            .available
            .sort_by(|a, b| b.available_allocation.total_cmp(&a.available_allocation));
        availability
            .unavailable
            .sort_by(|a, b| a.current_allocation.total_cmp(&b.current_allocation));

        debug!(
            project = %query.project,
            start_date = %query.start_date,
            end_date = %query.end_date,
            available = availability.available.len(),
            unavailable = availability.unavailable.len(),
            "Resolved employee availability"
        );
        Ok(availability)
    }
}
