//! Candidate table reconciliation.
//!
//! Turns an availability lookup into the ordered candidate sequence
//! stored on a request. The sequence is always rebuilt from scratch;
//! earlier selections are not carried over.

use std::cmp::Ordering;

use resman_core::models::candidate::{AvailabilityResult, EmployeeCandidate};

/// Build the candidate sequence: available employees by spare capacity
/// (most first), then unavailable employees by current load (least
/// first). Every row starts deselected.
pub fn reconcile(result: AvailabilityResult) -> Vec<EmployeeCandidate> {
    let AvailabilityResult {
        mut available,
        mut unavailable,
    } = result;

    available.sort_by(|a, b| descending(a.available_allocation, b.available_allocation));
    unavailable.sort_by(|a, b| a.current_allocation.total_cmp(&b.current_allocation));

    let available = available.into_iter().map(|c| EmployeeCandidate {
        is_available: true,
        selected: false,
        ..c
    });
    let unavailable = unavailable.into_iter().map(|c| EmployeeCandidate {
        is_available: false,
        selected: false,
        ..c
    });

    available.chain(unavailable).collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::tests::candidate;

    fn with_load(employee: &str, current: f64) -> EmployeeCandidate {
        EmployeeCandidate {
            current_allocation: current,
            available_allocation: 100.0 - current,
            ..candidate(employee, true)
        }
    }

    #[test]
    fn available_rows_come_first_and_are_sorted() {
        let result = AvailabilityResult {
            available: vec![with_load("A", 50.0), with_load("B", 0.0), with_load("C", 30.0)],
            unavailable: vec![with_load("X", 95.0), with_load("Y", 60.0)],
        };

        let rows = reconcile(result);
        let order: Vec<_> = rows.iter().map(|c| c.employee.as_str()).collect();
        assert_eq!(order, vec!["B", "C", "A", "Y", "X"]);
        assert!(rows[..3].iter().all(|c| c.is_available));
        assert!(rows[3..].iter().all(|c| !c.is_available));
    }

    #[test]
    fn rebuild_drops_previous_selection() {
        let mut selected = with_load("A", 10.0);
        selected.selected = true;
        let rows = reconcile(AvailabilityResult {
            available: vec![selected],
            unavailable: Vec::new(),
        });
        assert!(rows.iter().all(|c| !c.selected));
    }

    #[test]
    fn empty_lookup_gives_empty_table() {
        assert!(reconcile(AvailabilityResult::default()).is_empty());
    }
}
