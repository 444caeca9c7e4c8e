//! Completed-operation counting.
//!
//! Self-calibration and subtraction run as two operations but are shown as
//! one step, so the raw number of completed operations is adjusted.

/// Operations whose name contains this are imaging passes
const IMAGING_MARKER: &str = "facetimage";

/// Operations whose name contains this redo subtraction and are not progress
const SUBRESET_MARKER: &str = "facetsubreset";

/// Number of completed steps, after the corrective rules.
///
/// Starts from one less than the number of completed operations (the
/// selfcal/subtract pair counts once), then:
/// - the whole-field pseudo direction gets two extra, since selfcal and
///   subtract do not apply to it;
/// - each `facetsubreset` removes one;
/// - if there is exactly one more imaging pass than the count so far,
///   selfcal was skipped or failed while imaging went on, and two are added.
pub fn completed_count(is_field: bool, completed: &[String]) -> u32 {
    let mut total = (completed.len() as i64 - 1).max(0);
    if is_field {
        total += 2;
    }

    let mut images: i64 = 0;
    for op in completed {
        if op.contains(IMAGING_MARKER) {
            images += 1;
        }
        if op.contains(SUBRESET_MARKER) {
            total -= 1;
        }
    }
    if images - 1 == total {
        total += 2;
    }

    total.max(0) as u32
}

/// Count used for shading: never below one
pub fn effective_count(count: u32) -> u32 {
    count.max(1)
}
