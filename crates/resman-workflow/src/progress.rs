//! Time progress of an assignment period.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AssignmentProgress {
    /// Inclusive length of the period in days.
    pub duration_days: i64,
    /// Days elapsed including today; zero before the start.
    pub elapsed_days: i64,
    /// `elapsed / duration * 100`, capped at 100.
    pub progress_percent: f64,
    /// Days left after today; zero once the period has ended.
    pub remaining_days: i64,
}

/// Compute progress of the period `[start_date, end_date]` on `today`.
///
/// `elapsed_days` is not capped at `duration_days`; only the percentage
/// is.
pub fn progress(
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> Result<AssignmentProgress, WorkflowError> {
    if end_date < start_date {
        return Err(WorkflowError::EndBeforeStart);
    }

    let duration_days = (end_date - start_date).num_days() + 1;
    let elapsed_days = ((today - start_date).num_days() + 1).max(0);
    let progress_percent = (elapsed_days as f64 / duration_days as f64 * 100.0).min(100.0);
    let remaining_days = (end_date - today).num_days().max(0);

    Ok(AssignmentProgress {
        duration_days,
        elapsed_days,
        progress_percent,
        remaining_days,
    })
}
