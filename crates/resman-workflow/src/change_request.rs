//! Change requests against project assignments.
//!
//! An end date change edits the period in place. An allocation change
//! closes the current period the day before the effective date and opens a
//! successor carrying the new percentage, so every period keeps the
//! percentage it was actually worked at.
//!
//! The planners are pure; [`ChangeRequestService`] loads, plans and hands
//! the whole write to the repository in one call.

use std::collections::HashSet;

use chrono::{Days, NaiveDate, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::actor::Actor;
use resman_core::models::assignment::{
    AssignmentStatus, CreateProjectAssignment, EndDateChange, PeriodSplit, ProjectAssignment,
};
use resman_core::models::change_note::{ChangeKind, ChangeNote, CreateChangeNote};
use resman_core::repository::{AssignmentRepository, ChangeNoteRepository};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::WorkflowError;

/// Plan an in-place end date change.
///
/// `successor_start` is the start of the period that supersedes this one,
/// if any; the new end date must stay before it.
pub fn plan_end_date_change(
    assignment: &ProjectAssignment,
    successor_start: Option<NaiveDate>,
    new_end_date: NaiveDate,
    reason: &str,
    author: &str,
    today: NaiveDate,
) -> Result<EndDateChange, WorkflowError> {
    if new_end_date < assignment.start_date {
        return Err(WorkflowError::EndBeforeStart);
    }
    if let Some(successor_start) = successor_start.filter(|s| new_end_date >= *s) {
        return Err(WorkflowError::EndOverlapsSuccessor(successor_start));
    }
    if reason.trim().is_empty() {
        return Err(WorkflowError::EmptyReason);
    }

    Ok(EndDateChange {
        new_end_date,
        status: AssignmentStatus::for_date(assignment.start_date, new_end_date, today),
        note: CreateChangeNote {
            assignment_id: assignment.id,
            kind: ChangeKind::EndDate,
            author: author.to_string(),
            content: format!(
                "End date changed from {} to {new_end_date}",
                assignment.end_date
            ),
            reason: reason.to_string(),
        },
    })
}

/// Plan an allocation change taking effect on `effective_date`.
///
/// The original period must keep at least one day and the successor must
/// not be empty, so `start_date < effective_date <= end_date`. Only the last
/// period of a chain can be split.
pub fn plan_allocation_change(
    assignment: &ProjectAssignment,
    new_percentage: i64,
    effective_date: NaiveDate,
    reason: &str,
    author: &str,
    today: NaiveDate,
) -> Result<PeriodSplit, WorkflowError> {
    if assignment.superseded_by.is_some() {
        return Err(WorkflowError::AlreadySuperseded);
    }
    if effective_date <= assignment.start_date {
        return Err(WorkflowError::EffectiveDateTooEarly);
    }
    if effective_date > assignment.end_date {
        return Err(WorkflowError::EffectiveDateTooLate);
    }
    let new_percentage = u8::try_from(new_percentage)
        .ok()
        .filter(|pct| *pct <= 100)
        .ok_or(WorkflowError::PercentageOutOfRange(new_percentage))?;
    if reason.trim().is_empty() {
        return Err(WorkflowError::EmptyReason);
    }

    let closed_end_date = effective_date
        .checked_sub_days(Days::new(1))
        .ok_or(WorkflowError::EffectiveDateTooEarly)?;
    let closed_days = (closed_end_date - assignment.start_date).num_days() + 1;
    let successor_days = (assignment.end_date - effective_date).num_days() + 1;

    // Cost per day per percentage point of the original period.
    let weight = assignment.duration_days() as f64 * f64::from(assignment.allocation_percentage);
    let unit_cost = if weight > 0.0 {
        assignment.estimated_total_cost / weight
    } else {
        0.0
    };
    let closed_estimated_cost = round_cents(
        unit_cost * closed_days as f64 * f64::from(assignment.allocation_percentage),
    );
    let successor_cost =
        round_cents(unit_cost * successor_days as f64 * f64::from(new_percentage));

    Ok(PeriodSplit {
        closed_end_date,
        closed_status: AssignmentStatus::for_date(assignment.start_date, closed_end_date, today),
        closed_estimated_cost,
        successor: CreateProjectAssignment {
            project: assignment.project.clone(),
            employee: assignment.employee.clone(),
            start_date: effective_date,
            end_date: assignment.end_date,
            allocation_percentage: new_percentage,
            status: AssignmentStatus::for_date(effective_date, assignment.end_date, today),
            allocation_reference: assignment.allocation_reference,
            estimated_total_cost: successor_cost,
            supersedes: Some(assignment.id),
        },
        note: CreateChangeNote {
            assignment_id: assignment.id,
            kind: ChangeKind::AllocationPercentage,
            author: author.to_string(),
            content: format!(
                "Allocation changed from {}% to {new_percentage}% effective {effective_date}",
                assignment.allocation_percentage
            ),
            reason: reason.to_string(),
        },
    })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// All periods linked to an assignment plus their audit notes.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeHistory {
    /// Ordered by start date.
    pub periods: Vec<ProjectAssignment>,
    /// Ordered by creation time.
    pub notes: Vec<ChangeNote>,
}

/// Change-request service over assignment and change note storage.
pub struct ChangeRequestService<S, C>
where
    S: AssignmentRepository,
    C: ChangeNoteRepository,
{
    assignments: S,
    notes: C,
}

impl<S, C> ChangeRequestService<S, C>
where
    S: AssignmentRepository,
    C: ChangeNoteRepository,
{
    pub fn new(assignments: S, notes: C) -> Self {
        Self { assignments, notes }
    }

    /// Move the end date of an assignment and record why.
    pub async fn change_end_date(
        &self,
        actor: &Actor,
        assignment_id: Uuid,
        new_end_date: NaiveDate,
        reason: &str,
    ) -> ResmanResult<ProjectAssignment> {
        let assignment = self.assignments.get_by_id(assignment_id).await?;
        let successor_start = match assignment.superseded_by {
            Some(successor_id) => Some(self.assignments.get_by_id(successor_id).await?.start_date),
            None => None,
        };
        let change = plan_end_date_change(
            &assignment,
            successor_start,
            new_end_date,
            reason,
            &actor.user,
            Utc::now().date_naive(),
        )?;

        let updated = self
            .assignments
            .change_end_date(assignment_id, change)
            .await?;
        info!(
            assignment_id = %assignment_id,
            from = %assignment.end_date,
            to = %updated.end_date,
            author = %actor.user,
            "Assignment end date changed"
        );
        Ok(updated)
    }

    /// Split an assignment at `effective_date` and give the successor
    /// period `new_percentage`. Returns `(original, successor)`.
    pub async fn change_allocation_percentage(
        &self,
        actor: &Actor,
        assignment_id: Uuid,
        new_percentage: i64,
        effective_date: NaiveDate,
        reason: &str,
    ) -> ResmanResult<(ProjectAssignment, ProjectAssignment)> {
        let assignment = self.assignments.get_by_id(assignment_id).await?;
        let split = plan_allocation_change(
            &assignment,
            new_percentage,
            effective_date,
            reason,
            &actor.user,
            Utc::now().date_naive(),
        )?;

        let (original, successor) = self.assignments.supersede(assignment_id, split).await?;
        info!(
            assignment_id = %original.id,
            successor_id = %successor.id,
            effective_date = %effective_date,
            from = original.allocation_percentage,
            to = successor.allocation_percentage,
            author = %actor.user,
            "Assignment allocation changed"
        );
        Ok((original, successor))
    }

    /// Walk the supersede chain in both directions from `assignment_id`.
    pub async fn change_history(&self, assignment_id: Uuid) -> ResmanResult<ChangeHistory> {
        let start = self.assignments.get_by_id(assignment_id).await?;
        let mut seen = HashSet::from([start.id]);
        let mut backward = start.supersedes;
        let mut forward = start.superseded_by;
        let mut periods = vec![start];

        while let Some(id) = backward.filter(|id| seen.insert(*id)) {
            let period = self.assignments.get_by_id(id).await?;
            backward = period.supersedes;
            periods.push(period);
        }
        while let Some(id) = forward.filter(|id| seen.insert(*id)) {
            let period = self.assignments.get_by_id(id).await?;
            forward = period.superseded_by;
            periods.push(period);
        }
        periods.sort_by_key(|p| p.start_date);

        let ids: Vec<Uuid> = periods.iter().map(|p| p.id).collect();
        let mut notes = self.notes.list_for_assignments(&ids).await?;
        notes.sort_by_key(|n| n.created_at);

        Ok(ChangeHistory { periods, notes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn assignment(start: &str, end: &str, pct: u8, cost: f64) -> ProjectAssignment {
        ProjectAssignment {
            id: Uuid::new_v4(),
            project: "PROJ-0001".into(),
            employee: "EMP-0001".into(),
            start_date: d(start),
            end_date: d(end),
            allocation_percentage: pct,
            status: AssignmentStatus::Active,
            allocation_reference: Some(Uuid::new_v4()),
            estimated_total_cost: cost,
            supersedes: None,
            superseded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn effective_date_on_start_is_rejected() {
        let a = assignment("2024-01-01", "2024-01-31", 50, 0.0);
        let err =
            plan_allocation_change(&a, 80, a.start_date, "scope", "pm", d("2024-01-02")).unwrap_err();
        assert_eq!(err, WorkflowError::EffectiveDateTooEarly);
    }

    #[test]
    fn effective_date_day_after_start_leaves_one_day() {
        let a = assignment("2024-01-01", "2024-01-31", 50, 0.0);
        let split =
            plan_allocation_change(&a, 80, d("2024-01-02"), "scope", "pm", d("2024-01-01"))
                .unwrap();

        assert_eq!(split.closed_end_date, a.start_date);
        assert_eq!(split.successor.start_date, d("2024-01-02"));
        assert_eq!(split.successor.end_date, a.end_date);
        assert_eq!(split.successor.allocation_percentage, 80);
        assert_eq!(split.successor.project, a.project);
        assert_eq!(split.successor.employee, a.employee);
        assert_eq!(split.successor.supersedes, Some(a.id));
        assert_eq!(split.note.assignment_id, a.id);
        assert_eq!(split.note.reason, "scope");
    }

    #[test]
    fn allocation_change_validates_inputs() {
        let a = assignment("2024-01-01", "2024-01-31", 50, 0.0);
        let today = d("2024-01-10");
        assert_eq!(
            plan_allocation_change(&a, 80, d("2024-02-01"), "x", "pm", today).unwrap_err(),
            WorkflowError::EffectiveDateTooLate
        );
        assert_eq!(
            plan_allocation_change(&a, 101, d("2024-01-15"), "x", "pm", today).unwrap_err(),
            WorkflowError::PercentageOutOfRange(101)
        );
        assert_eq!(
            plan_allocation_change(&a, -5, d("2024-01-15"), "x", "pm", today).unwrap_err(),
            WorkflowError::PercentageOutOfRange(-5)
        );
        assert_eq!(
            plan_allocation_change(&a, 20, d("2024-01-15"), "  ", "pm", today).unwrap_err(),
            WorkflowError::EmptyReason
        );
        assert!(plan_allocation_change(&a, 0, d("2024-01-31"), "x", "pm", today).is_ok());
    }

    #[test]
    fn split_statuses_follow_the_calendar() {
        let a = assignment("2024-01-01", "2024-01-31", 50, 0.0);
        let split =
            plan_allocation_change(&a, 80, d("2024-01-20"), "x", "pm", d("2024-01-10")).unwrap();
        assert_eq!(split.closed_status, AssignmentStatus::Active);
        assert_eq!(split.successor.status, AssignmentStatus::Planned);

        let split =
            plan_allocation_change(&a, 80, d("2024-01-05"), "x", "pm", d("2024-01-10")).unwrap();
        assert_eq!(split.closed_status, AssignmentStatus::Completed);
        assert_eq!(split.successor.status, AssignmentStatus::Active);
    }

    #[test]
    fn cost_is_prorated_by_days_and_percentage() {
        // 10 days at 50% cost 1000, i.e. 2 per day per point.
        let a = assignment("2024-01-01", "2024-01-10", 50, 1000.0);
        let split =
            plan_allocation_change(&a, 100, d("2024-01-05"), "x", "pm", d("2024-01-01")).unwrap();
        assert_eq!(split.closed_estimated_cost, 400.0);
        assert_eq!(split.successor.estimated_total_cost, 1200.0);
    }

    #[test]
    fn end_date_change_validates_and_records_reason() {
        let a = assignment("2024-01-01", "2024-01-31", 50, 0.0);
        assert_eq!(
            plan_end_date_change(&a, None, d("2023-12-31"), "x", "pm", d("2024-01-10")).unwrap_err(),
            WorkflowError::EndBeforeStart
        );
        assert_eq!(
            plan_end_date_change(&a, None, d("2024-02-15"), "", "pm", d("2024-01-10")).unwrap_err(),
            WorkflowError::EmptyReason
        );

        let change =
            plan_end_date_change(&a, None, d("2024-01-05"), "Client paused", "pm", d("2024-01-10"))
                .unwrap();
        assert_eq!(change.new_end_date, d("2024-01-05"));
        assert_eq!(change.status, AssignmentStatus::Completed);
        assert_eq!(change.note.kind, ChangeKind::EndDate);
        assert_eq!(change.note.reason, "Client paused");

        // A single-day period is allowed.
        assert!(plan_end_date_change(&a, None, a.start_date, "x", "pm", d("2024-01-10")).is_ok());
    }

    #[test]
    fn end_date_must_stay_before_the_successor() {
        let mut a = assignment("2024-01-01", "2024-01-15", 50, 0.0);
        a.superseded_by = Some(Uuid::new_v4());
        let successor_start = Some(d("2024-01-16"));
        let today = d("2024-01-10");

        assert_eq!(
            plan_end_date_change(&a, successor_start, d("2024-01-31"), "x", "pm", today)
                .unwrap_err(),
            WorkflowError::EndOverlapsSuccessor(d("2024-01-16"))
        );
        assert_eq!(
            plan_end_date_change(&a, successor_start, d("2024-01-16"), "x", "pm", today)
                .unwrap_err(),
            WorkflowError::EndOverlapsSuccessor(d("2024-01-16"))
        );
        assert!(plan_end_date_change(&a, successor_start, d("2024-01-12"), "x", "pm", today).is_ok());
    }

    #[test]
    fn superseded_period_cannot_be_split_again() {
        let mut a = assignment("2024-01-01", "2024-01-15", 50, 0.0);
        a.superseded_by = Some(Uuid::new_v4());
        let err = plan_allocation_change(&a, 30, d("2024-01-08"), "x", "pm", d("2024-01-02"))
            .unwrap_err();
        assert_eq!(err, WorkflowError::AlreadySuperseded);
    }
}
