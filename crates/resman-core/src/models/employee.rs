//! Employee domain model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmployeeStatus {
    Active,
    Inactive,
    Left,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    /// Employee code, e.g. `EMP-0001`.
    pub id: String,
    pub employee_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub status: EmployeeStatus,
    pub hourly_cost_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployee {
    pub id: String,
    pub employee_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub hourly_cost_rate: f64,
}
