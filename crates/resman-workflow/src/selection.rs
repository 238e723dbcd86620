//! Single-selection rule for the candidate table.
//!
//! At most one candidate row is selected at any time. Selecting a row
//! clears every other row in the same pass; the submit path re-checks the
//! rule with [`single_selection`] instead of trusting earlier toggles,
//! since the table may have been rebuilt in between.

use resman_core::models::candidate::EmployeeCandidate;

use crate::error::WorkflowError;

/// Set the selection flag of `employee`'s row.
///
/// Selecting a row deselects all others. Deselecting simply clears the
/// row. Unavailable candidates cannot be selected. On error no row is
/// touched.
pub fn set_selected(
    candidates: &mut [EmployeeCandidate],
    employee: &str,
    selected: bool,
) -> Result<(), WorkflowError> {
    let index = candidates
        .iter()
        .position(|c| c.employee == employee)
        .ok_or_else(|| WorkflowError::EmployeeNotInCandidates(employee.to_string()))?;

    if !selected {
        candidates[index].selected = false;
        return Ok(());
    }

    if !candidates[index].is_available {
        return Err(WorkflowError::EmployeeUnavailable(
            candidates[index].employee_name.clone(),
        ));
    }

    for (i, candidate) in candidates.iter_mut().enumerate() {
        candidate.selected = i == index;
    }
    Ok(())
}

/// The one selected candidate, or an error if zero or several are flagged.
pub fn single_selection(
    candidates: &[EmployeeCandidate],
) -> Result<&EmployeeCandidate, WorkflowError> {
    let mut selected = candidates.iter().filter(|c| c.selected);
    match (selected.next(), selected.next()) {
        (Some(candidate), None) => Ok(candidate),
        (None, _) => Err(WorkflowError::NoEmployeeSelected),
        (Some(_), Some(_)) => Err(WorkflowError::MultipleEmployeesSelected),
    }
}
