//! Daily assignment status synchronisation.

use chrono::NaiveDate;
use resman_core::error::ResmanResult;
use resman_core::models::assignment::{AssignmentFilter, AssignmentStatus, ProjectAssignment};
use resman_core::repository::AssignmentRepository;
use tracing::{debug, info};
use uuid::Uuid;

/// Assignments whose stored status disagrees with the calendar on `today`,
/// paired with the status they should have.
pub fn stale_statuses(
    assignments: &[ProjectAssignment],
    today: NaiveDate,
) -> Vec<(Uuid, AssignmentStatus)> {
    assignments
        .iter()
        .filter_map(|a| {
            let status = AssignmentStatus::for_date(a.start_date, a.end_date, today);
            (status != a.status).then_some((a.id, status))
        })
        .collect()
}

/// Bring every assignment's status in line with `today`. Returns how many
/// rows were written.
pub async fn sync_assignment_statuses<S: AssignmentRepository>(
    assignments: &S,
    today: NaiveDate,
) -> ResmanResult<u64> {
    let all = assignments.list(AssignmentFilter::default()).await?;
    let stale = stale_statuses(&all, today);

    for (id, status) in &stale {
        assignments.update_status(*id, *status).await?;
        debug!(assignment_id = %id, status = %status, "Assignment status updated");
    }

    let updated = stale.len() as u64;
    info!(
        checked = all.len(),
        updated,
        today = %today,
        "Assignment statuses synchronised"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn assignment(start: &str, end: &str, status: AssignmentStatus) -> ProjectAssignment {
        ProjectAssignment {
            id: Uuid::new_v4(),
            project: "PROJ-0001".into(),
            employee: "EMP-0001".into(),
            start_date: d(start),
            end_date: d(end),
            allocation_percentage: 50,
            status,
            allocation_reference: None,
            estimated_total_cost: 0.0,
            supersedes: None,
            superseded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_changed_rows_are_reported() {
        let rows = [
            assignment("2024-01-01", "2024-01-31", AssignmentStatus::Active),
            assignment("2024-01-01", "2024-01-31", AssignmentStatus::Planned),
            assignment("2023-12-01", "2023-12-31", AssignmentStatus::Active),
            assignment("2024-02-01", "2024-02-28", AssignmentStatus::Planned),
        ];
        let stale = stale_statuses(&rows, d("2024-01-15"));
        assert_eq!(
            stale,
            vec![
                (rows[1].id, AssignmentStatus::Active),
                (rows[2].id, AssignmentStatus::Completed),
            ]
        );
    }
}
