//! Integration tests for the employee workload check against in-memory
//! SurrealDB.

use chrono::NaiveDate;
use resman_core::models::assignment::{AssignmentStatus, CreateProjectAssignment};
use resman_core::repository::AssignmentRepository;
use resman_db::repository::SurrealAssignmentRepository;
use resman_workflow::{WorkloadLevel, check_employee_workload};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> SurrealAssignmentRepository<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    resman_db::run_migrations(&db).await.unwrap();
    SurrealAssignmentRepository::new(db)
}

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

async fn seed(
    repo: &SurrealAssignmentRepository<Db>,
    employee: &str,
    project: &str,
    pct: u8,
    status: AssignmentStatus,
) {
    repo.create(CreateProjectAssignment {
        project: project.into(),
        employee: employee.into(),
        start_date: d("2024-01-01"),
        end_date: d("2024-03-31"),
        allocation_percentage: pct,
        status,
        allocation_reference: None,
        estimated_total_cost: 0.0,
        supersedes: None,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn seventy_active_plus_twenty_is_caution() {
    let repo = setup().await;
    seed(&repo, "EMP-0001", "PROJ-0001", 40, AssignmentStatus::Active).await;
    seed(&repo, "EMP-0001", "PROJ-0002", 30, AssignmentStatus::Active).await;
    // Planned work and other employees do not count.
    seed(&repo, "EMP-0001", "PROJ-0003", 50, AssignmentStatus::Planned).await;
    seed(&repo, "EMP-0002", "PROJ-0001", 90, AssignmentStatus::Active).await;

    let assessment = check_employee_workload(&repo, "EMP-0001", None, 20)
        .await
        .unwrap();
    assert_eq!(assessment.projected_total, 90);
    assert_eq!(assessment.level, WorkloadLevel::Caution);
    assert!(assessment.message().is_some());
}

#[tokio::test]
async fn current_record_is_not_counted_twice() {
    let repo = setup().await;
    seed(&repo, "EMP-0001", "PROJ-0001", 60, AssignmentStatus::Active).await;
    let existing = repo
        .fetch_active_assignments_for_employee("EMP-0001")
        .await
        .unwrap();
    let current = existing[0].record_id;

    let assessment = check_employee_workload(&repo, "EMP-0001", Some(current), 100)
        .await
        .unwrap();
    assert_eq!(assessment.projected_total, 100);
    assert_eq!(assessment.level, WorkloadLevel::Caution);

    let over = check_employee_workload(&repo, "EMP-0001", None, 50)
        .await
        .unwrap();
    assert_eq!(over.projected_total, 110);
    assert_eq!(over.level, WorkloadLevel::OverAllocated);
}

#[tokio::test]
async fn no_active_assignments_is_normal() {
    let repo = setup().await;
    let assessment = check_employee_workload(&repo, "EMP-0009", None, 50)
        .await
        .unwrap();
    assert_eq!(assessment.projected_total, 50);
    assert_eq!(assessment.level, WorkloadLevel::Normal);
}
