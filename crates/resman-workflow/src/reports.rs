//! Read-only reports over project assignments.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::assignment::{AssignmentFilter, AssignmentStatus, ProjectAssignment};
use resman_core::models::employee::Employee;
use resman_core::repository::{AssignmentRepository, EmployeeRepository};
use serde::Serialize;
use uuid::Uuid;

use crate::workload::OVER_ALLOCATION_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: AssignmentStatus,
    pub count: u64,
}

/// Number of assignments per status, in Planned, Active, Completed order.
/// Statuses with no assignments are left out.
pub fn assignment_summary(assignments: &[ProjectAssignment]) -> Vec<StatusCount> {
    AssignmentStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: assignments.iter().filter(|a| a.status == status).count() as u64,
        })
        .filter(|c| c.count > 0)
        .collect()
}

/// Filters for the allocation status report. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AllocationReportFilter {
    pub employee: Option<String>,
    pub project: Option<String>,
    pub department: Option<String>,
    pub status: Option<AssignmentStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationReportRow {
    pub assignment_id: Uuid,
    pub employee: String,
    pub employee_name: String,
    pub department: Option<String>,
    pub project: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub allocation_percentage: u8,
    pub status: AssignmentStatus,
    pub estimated_total_cost: f64,
    pub remaining_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCost {
    pub project: String,
    pub estimated_total_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationReport {
    /// Ordered by start date, newest first.
    pub rows: Vec<AllocationReportRow>,
    /// Estimated cost summed per project, ordered by project.
    pub cost_by_project: Vec<ProjectCost>,
}

/// Build the allocation status report from already-filtered assignments.
/// Only the department filter is applied here, since it lives on the
/// employee.
pub fn allocation_report(
    assignments: Vec<ProjectAssignment>,
    employees: &HashMap<String, Employee>,
    department: Option<&str>,
    today: NaiveDate,
) -> AllocationReport {
    let mut rows: Vec<AllocationReportRow> = assignments
        .into_iter()
        .filter_map(|a| {
            let employee = employees.get(&a.employee);
            let dept = employee.and_then(|e| e.department.clone());
            if department.is_some_and(|wanted| dept.as_deref() != Some(wanted)) {
                return None;
            }
            Some(AllocationReportRow {
                assignment_id: a.id,
                employee_name: employee
                    .map(|e| e.employee_name.clone())
                    .unwrap_or_else(|| a.employee.clone()),
                employee: a.employee,
                department: dept,
                project: a.project,
                start_date: a.start_date,
                end_date: a.end_date,
                allocation_percentage: a.allocation_percentage,
                status: a.status,
                estimated_total_cost: a.estimated_total_cost,
                remaining_days: (a.end_date - today).num_days().max(0),
            })
        })
        .collect();
    rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in &rows {
        *totals.entry(row.project.as_str()).or_default() += row.estimated_total_cost;
    }
    let cost_by_project = totals
        .into_iter()
        .map(|(project, total)| ProjectCost {
            project: project.to_string(),
            estimated_total_cost: (total * 100.0).round() / 100.0,
        })
        .collect();

    AllocationReport {
        rows,
        cost_by_project,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AllocationLevel {
    Available,
    Allocated,
    OverAllocated,
}

impl AllocationLevel {
    pub fn for_total(total: u32) -> Self {
        if total == 0 {
            AllocationLevel::Available
        } else if total <= OVER_ALLOCATION_THRESHOLD {
            AllocationLevel::Allocated
        } else {
            AllocationLevel::OverAllocated
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeDashboardRow {
    pub employee: String,
    pub employee_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub total_assignments: u64,
    pub active_assignments: u64,
    pub planned_assignments: u64,
    pub completed_assignments: u64,
    /// Sum of Active assignments covering today.
    pub current_allocation: u32,
    pub allocation_status: AllocationLevel,
    pub last_assignment_end: Option<NaiveDate>,
    /// Latest end of any Active or Planned assignment, never before today.
    pub next_available_date: NaiveDate,
}

/// One row per employee in `employees`, in the given order.
pub fn employee_dashboard(
    employees: &[Employee],
    assignments: &[ProjectAssignment],
    today: NaiveDate,
) -> Vec<EmployeeDashboardRow> {
    employees
        .iter()
        .map(|employee| {
            let own: Vec<&ProjectAssignment> = assignments
                .iter()
                .filter(|a| a.employee == employee.id)
                .collect();
            let count = |status: AssignmentStatus| {
                own.iter().filter(|a| a.status == status).count() as u64
            };
            let current_allocation: u32 = own
                .iter()
                .filter(|a| {
                    a.status == AssignmentStatus::Active
                        && a.start_date <= today
                        && today <= a.end_date
                })
                .map(|a| u32::from(a.allocation_percentage))
                .sum();
            let committed_until = own
                .iter()
                .filter(|a| a.status != AssignmentStatus::Completed)
                .map(|a| a.end_date)
                .max();

            EmployeeDashboardRow {
                employee: employee.id.clone(),
                employee_name: employee.employee_name.clone(),
                department: employee.department.clone(),
                designation: employee.designation.clone(),
                total_assignments: own.len() as u64,
                active_assignments: count(AssignmentStatus::Active),
                planned_assignments: count(AssignmentStatus::Planned),
                completed_assignments: count(AssignmentStatus::Completed),
                current_allocation,
                allocation_status: AllocationLevel::for_total(current_allocation),
                last_assignment_end: own.iter().map(|a| a.end_date).max(),
                next_available_date: committed_until.map_or(today, |end| end.max(today)),
            }
        })
        .collect()
}

/// Report service over assignment and employee storage.
pub struct ReportService<S, E>
where
    S: AssignmentRepository,
    E: EmployeeRepository,
{
    assignments: S,
    employees: E,
}

impl<S, E> ReportService<S, E>
where
    S: AssignmentRepository,
    E: EmployeeRepository,
{
    pub fn new(assignments: S, employees: E) -> Self {
        Self {
            assignments,
            employees,
        }
    }

    pub async fn assignment_summary(&self) -> ResmanResult<Vec<StatusCount>> {
        let all = self.assignments.list(AssignmentFilter::default()).await?;
        Ok(assignment_summary(&all))
    }

    pub async fn allocation_status(
        &self,
        filter: AllocationReportFilter,
    ) -> ResmanResult<AllocationReport> {
        let assignments = self
            .assignments
            .list(AssignmentFilter {
                employee: filter.employee,
                project: filter.project,
                status: filter.status,
                from_date: filter.from_date,
                to_date: filter.to_date,
            })
            .await?;
        let employees: HashMap<String, Employee> = self
            .employees
            .list_current()
            .await?
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();

        Ok(allocation_report(
            assignments,
            &employees,
            filter.department.as_deref(),
            Utc::now().date_naive(),
        ))
    }

    pub async fn employee_dashboard(&self) -> ResmanResult<Vec<EmployeeDashboardRow>> {
        let employees = self.employees.list_current().await?;
        let assignments = self.assignments.list(AssignmentFilter::default()).await?;
        Ok(employee_dashboard(
            &employees,
            &assignments,
            Utc::now().date_naive(),
        ))
    }

    /// Active assignments of `employee`, earliest first.
    pub async fn active_assignments(&self, employee: &str) -> ResmanResult<Vec<ProjectAssignment>> {
        let mut rows = self
            .assignments
            .list(AssignmentFilter {
                employee: Some(employee.to_string()),
                status: Some(AssignmentStatus::Active),
                ..Default::default()
            })
            .await?;
        rows.sort_by_key(|a| a.start_date);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resman_core::models::employee::EmployeeStatus;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn employee(id: &str, department: &str) -> Employee {
        Employee {
            id: id.into(),
            employee_name: format!("Name of {id}"),
            department: Some(department.into()),
            designation: None,
            status: EmployeeStatus::Active,
            hourly_cost_rate: 10.0,
        }
    }

    fn assignment(
        employee: &str,
        project: &str,
        start: &str,
        end: &str,
        pct: u8,
        status: AssignmentStatus,
        cost: f64,
    ) -> ProjectAssignment {
        ProjectAssignment {
            id: Uuid::new_v4(),
            project: project.into(),
            employee: employee.into(),
            start_date: d(start),
            end_date: d(end),
            allocation_percentage: pct,
            status,
            allocation_reference: None,
            estimated_total_cost: cost,
            supersedes: None,
            superseded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn summary_keeps_status_order_and_skips_empty() {
        let rows = [
            assignment("E1", "P1", "2024-01-01", "2024-01-31", 50, AssignmentStatus::Completed, 0.0),
            assignment("E1", "P1", "2024-03-01", "2024-03-31", 50, AssignmentStatus::Planned, 0.0),
            assignment("E2", "P1", "2024-02-01", "2024-02-28", 50, AssignmentStatus::Completed, 0.0),
        ];
        assert_eq!(
            assignment_summary(&rows),
            vec![
                StatusCount { status: AssignmentStatus::Planned, count: 1 },
                StatusCount { status: AssignmentStatus::Completed, count: 2 },
            ]
        );
    }

    #[test]
    fn report_filters_department_and_totals_costs() {
        let employees: HashMap<String, Employee> = [employee("E1", "R&D"), employee("E2", "Sales")]
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();
        let rows = vec![
            assignment("E1", "P1", "2024-01-01", "2024-01-31", 50, AssignmentStatus::Active, 100.0),
            assignment("E1", "P2", "2024-02-01", "2024-02-10", 50, AssignmentStatus::Planned, 50.5),
            assignment("E2", "P1", "2024-01-01", "2024-01-31", 50, AssignmentStatus::Active, 70.0),
            assignment("E1", "P1", "2023-12-01", "2023-12-31", 50, AssignmentStatus::Completed, 20.25),
        ];

        let report = allocation_report(rows, &employees, Some("R&D"), d("2024-01-21"));
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0].project, "P2");
        assert_eq!(report.rows[0].remaining_days, 20);
        assert_eq!(report.rows[1].remaining_days, 10);
        assert_eq!(report.rows[2].remaining_days, 0);
        assert_eq!(report.rows[1].employee_name, "Name of E1");
        assert_eq!(
            report.cost_by_project,
            vec![
                ProjectCost { project: "P1".into(), estimated_total_cost: 120.25 },
                ProjectCost { project: "P2".into(), estimated_total_cost: 50.5 },
            ]
        );
    }

    #[test]
    fn dashboard_sums_current_load() {
        let employees = [employee("E1", "R&D"), employee("E2", "R&D")];
        let today = d("2024-01-15");
        let rows = [
            assignment("E1", "P1", "2024-01-01", "2024-01-31", 60, AssignmentStatus::Active, 0.0),
            assignment("E1", "P2", "2024-01-10", "2024-03-31", 50, AssignmentStatus::Active, 0.0),
            assignment("E1", "P3", "2024-06-01", "2024-06-30", 50, AssignmentStatus::Planned, 0.0),
            assignment("E1", "P4", "2023-06-01", "2023-06-30", 50, AssignmentStatus::Completed, 0.0),
        ];

        let dashboard = employee_dashboard(&employees, &rows, today);
        let e1 = &dashboard[0];
        assert_eq!(e1.total_assignments, 4);
        assert_eq!(e1.active_assignments, 2);
        assert_eq!(e1.planned_assignments, 1);
        assert_eq!(e1.completed_assignments, 1);
        assert_eq!(e1.current_allocation, 110);
        assert_eq!(e1.allocation_status, AllocationLevel::OverAllocated);
        assert_eq!(e1.last_assignment_end, Some(d("2024-06-30")));
        assert_eq!(e1.next_available_date, d("2024-06-30"));

        let e2 = &dashboard[1];
        assert_eq!(e2.total_assignments, 0);
        assert_eq!(e2.allocation_status, AllocationLevel::Available);
        assert_eq!(e2.last_assignment_end, None);
        assert_eq!(e2.next_available_date, today);
    }

    #[test]
    fn allocation_levels() {
        assert_eq!(AllocationLevel::for_total(0), AllocationLevel::Available);
        assert_eq!(AllocationLevel::for_total(100), AllocationLevel::Allocated);
        assert_eq!(AllocationLevel::for_total(101), AllocationLevel::OverAllocated);
    }
}
