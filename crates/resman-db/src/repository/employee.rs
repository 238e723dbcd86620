//! SurrealDB implementation of [`EmployeeRepository`].

use resman_core::error::ResmanResult;
use resman_core::models::employee::{CreateEmployee, Employee, EmployeeStatus};
use resman_core::repository::EmployeeRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct EmployeeRow {
    employee_name: String,
    department: Option<String>,
    designation: Option<String>,
    status: String,
    hourly_cost_rate: f64,
}

#[derive(Debug, SurrealValue)]
struct EmployeeRowWithId {
    record_id: String,
    employee_name: String,
    department: Option<String>,
    designation: Option<String>,
    status: String,
    hourly_cost_rate: f64,
}

fn parse_status(s: &str) -> Result<EmployeeStatus, DbError> {
    match s {
        "Active" => Ok(EmployeeStatus::Active),
        "Inactive" => Ok(EmployeeStatus::Inactive),
        "Left" => Ok(EmployeeStatus::Left),
        other => Err(DbError::Migration(format!(
            "unknown employee status: {other}"
        ))),
    }
}

fn status_to_string(s: &EmployeeStatus) -> &'static str {
    match s {
        EmployeeStatus::Active => "Active",
        EmployeeStatus::Inactive => "Inactive",
        EmployeeStatus::Left => "Left",
    }
}

impl EmployeeRow {
    fn into_employee(self, id: String) -> Result<Employee, DbError> {
        Ok(Employee {
            id,
            employee_name: self.employee_name,
            department: self.department,
            designation: self.designation,
            status: parse_status(&self.status)?,
            hourly_cost_rate: self.hourly_cost_rate,
        })
    }
}

impl EmployeeRowWithId {
    fn try_into_employee(self) -> Result<Employee, DbError> {
        EmployeeRow {
            employee_name: self.employee_name,
            department: self.department,
            designation: self.designation,
            status: self.status,
            hourly_cost_rate: self.hourly_cost_rate,
        }
        .into_employee(self.record_id)
    }
}

/// SurrealDB implementation of the Employee repository.
///
/// Employees are keyed by their business identifier (e.g. `EMP-0001`).
#[derive(Clone)]
pub struct SurrealEmployeeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEmployeeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> EmployeeRepository for SurrealEmployeeRepository<C> {
    async fn create(&self, input: CreateEmployee) -> ResmanResult<Employee> {
        let result = self
            .db
            .query(
                "CREATE type::record('employee', $id) SET \
                 employee_name = $employee_name, \
                 department = $department, \
                 designation = $designation, \
                 status = 'Active', \
                 hourly_cost_rate = $hourly_cost_rate",
            )
            .bind(("id", input.id.clone()))
            .bind(("employee_name", input.employee_name))
            .bind(("department", input.department))
            .bind(("designation", input.designation))
            .bind(("hourly_cost_rate", input.hourly_cost_rate))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: input.id.clone(),
        })?;

        Ok(row.into_employee(input.id)?)
    }

    async fn get_by_id(&self, id: &str) -> ResmanResult<Employee> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('employee', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_employee(id.to_string())?)
    }

    async fn list_current(&self) -> ResmanResult<Vec<Employee>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM employee \
                 WHERE status != 'Left' ORDER BY employee_name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRowWithId> = result.take(0).map_err(DbError::from)?;
        let employees = rows
            .into_iter()
            .map(|r| r.try_into_employee())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(employees)
    }

    async fn set_status(&self, id: &str, status: EmployeeStatus) -> ResmanResult<()> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('employee', $id) SET \
                 status = $status, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("status", status_to_string(&status).to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "employee".into(),
                id: id.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
