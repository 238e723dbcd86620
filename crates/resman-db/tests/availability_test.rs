//! Integration tests for the SurrealDB availability resolver.

use chrono::NaiveDate;
use resman_core::models::assignment::{AssignmentStatus, CreateProjectAssignment};
use resman_core::models::candidate::AvailabilityQuery;
use resman_core::models::employee::{CreateEmployee, EmployeeStatus};
use resman_core::repository::{AssignmentRepository, AvailabilityResolver, EmployeeRepository};
use resman_db::repository::{
    SurrealAssignmentRepository, SurrealAvailabilityResolver, SurrealEmployeeRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    resman_db::run_migrations(&db).await.unwrap();

    let employees = SurrealEmployeeRepository::new(db.clone());
    for (id, name, rate) in [
        ("EMP-0001", "Ada", 50.0),
        ("EMP-0002", "Grace", 40.0),
        ("EMP-0003", "Alan", 30.0),
        ("EMP-0004", "Edsger", 20.0),
    ] {
        employees
            .create(CreateEmployee {
                id: id.into(),
                employee_name: name.into(),
                department: Some("R&D".into()),
                designation: None,
                hourly_cost_rate: rate,
            })
            .await
            .unwrap();
    }
    employees
        .set_status("EMP-0004", EmployeeStatus::Inactive)
        .await
        .unwrap();
    db
}

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

async fn assign(
    repo: &SurrealAssignmentRepository<Db>,
    employee: &str,
    start: &str,
    end: &str,
    pct: u8,
    status: AssignmentStatus,
    reference: Option<Uuid>,
) {
    repo.create(CreateProjectAssignment {
        project: "PROJ-0009".into(),
        employee: employee.into(),
        start_date: d(start),
        end_date: d(end),
        allocation_percentage: pct,
        status,
        allocation_reference: reference,
        estimated_total_cost: 0.0,
        supersedes: None,
    })
    .await
    .unwrap();
}

fn query(pct: u8, excluding: Option<Uuid>) -> AvailabilityQuery {
    AvailabilityQuery {
        project: "PROJ-0001".into(),
        start_date: d("2024-03-01"),
        end_date: d("2024-03-10"),
        allocation_percentage: pct,
        excluding_request: excluding,
    }
}

#[tokio::test]
async fn partitions_and_sorts_candidates() {
    let db = setup().await;
    let assignments = SurrealAssignmentRepository::new(db.clone());
    let resolver = SurrealAvailabilityResolver::new(db);

    // Ada: 70% overlapping. Grace: 30% overlapping + 50% outside range.
    assign(&assignments, "EMP-0001", "2024-02-01", "2024-03-05", 70, AssignmentStatus::Active, None).await;
    assign(&assignments, "EMP-0002", "2024-03-08", "2024-04-30", 30, AssignmentStatus::Active, None).await;
    assign(&assignments, "EMP-0002", "2024-01-01", "2024-02-28", 50, AssignmentStatus::Active, None).await;
    // Planned periods do not count.
    assign(&assignments, "EMP-0003", "2024-03-01", "2024-03-10", 90, AssignmentStatus::Planned, None).await;

    let result = resolver.fetch_available_employees(query(50, None)).await.unwrap();

    let available: Vec<&str> = result.available.iter().map(|c| c.employee.as_str()).collect();
    assert_eq!(available, vec!["EMP-0003", "EMP-0002"]);
    let unavailable: Vec<&str> = result.unavailable.iter().map(|c| c.employee.as_str()).collect();
    assert_eq!(unavailable, vec!["EMP-0001"]);

    let grace = &result.available[1];
    assert_eq!(grace.current_allocation, 30.0);
    assert_eq!(grace.available_allocation, 70.0);
    // 10 days * 8h * 50% * 40.0
    assert_eq!(grace.estimated_cost, 1600.0);
    assert!(grace.is_available);
    assert!(!grace.selected);

    assert!(!result.unavailable[0].is_available);
    // Inactive employees are never offered.
    assert!(
        result
            .available
            .iter()
            .chain(&result.unavailable)
            .all(|c| c.employee != "EMP-0004")
    );
}

#[tokio::test]
async fn exact_fit_is_available() {
    let db = setup().await;
    let assignments = SurrealAssignmentRepository::new(db.clone());
    let resolver = SurrealAvailabilityResolver::new(db);

    assign(&assignments, "EMP-0001", "2024-03-01", "2024-03-10", 60, AssignmentStatus::Active, None).await;

    let result = resolver.fetch_available_employees(query(40, None)).await.unwrap();
    assert!(result.available.iter().any(|c| c.employee == "EMP-0001"));
}

#[tokio::test]
async fn own_request_is_not_counted_as_load() {
    let db = setup().await;
    let assignments = SurrealAssignmentRepository::new(db.clone());
    let resolver = SurrealAvailabilityResolver::new(db);
    let request_id = Uuid::new_v4();

    assign(
        &assignments,
        "EMP-0001",
        "2024-03-01",
        "2024-03-10",
        80,
        AssignmentStatus::Active,
        Some(request_id),
    )
    .await;

    let counted = resolver.fetch_available_employees(query(50, None)).await.unwrap();
    assert!(counted.unavailable.iter().any(|c| c.employee == "EMP-0001"));

    let excluded = resolver
        .fetch_available_employees(query(50, Some(request_id)))
        .await
        .unwrap();
    let ada = excluded
        .available
        .iter()
        .find(|c| c.employee == "EMP-0001")
        .unwrap();
    assert_eq!(ada.current_allocation, 0.0);
}
