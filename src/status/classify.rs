//! Direction classification.

use serde::Serialize;

use super::count::{completed_count, effective_count};
use super::detail::describe;
use super::DisplayState;
use crate::artifact::ReadOutcome;
use crate::direction::Direction;
use crate::error::Result;
use crate::gate::{SELFCAL_OPERATION, verify_selfcal};
use crate::tracker::OperationTracker;

/// Classification of one direction at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub direction: String,
    pub state: DisplayState,
    /// Completed steps after the corrective rules (may be zero)
    pub completed_count: u32,
    pub detail: String,
}

impl Classification {
    /// Classification used when a direction could not be evaluated at all
    pub fn unavailable(direction: &Direction, reason: &str) -> Self {
        Self {
            direction: direction.name.clone(),
            state: DisplayState::Unprocessed,
            completed_count: 0,
            detail: format!("Selected direction: {}\nState not available ({})", direction.name, reason),
        }
    }

    /// Count used for shading; never below one
    pub fn effective_count(&self) -> u32 {
        effective_count(self.completed_count)
    }
}

/// Classify a direction from its current artifacts.
///
/// Pure with respect to the filesystem: nothing is written and nothing is
/// remembered between calls. Missing or half-written artifacts never cause
/// an error; only an unresolvable step declaration does.
pub fn classify(direction: &Direction) -> Result<Classification> {
    let tracker = OperationTracker::new(direction);
    classify_tracked(&tracker)
}

/// Classify using an existing tracker, sharing its reads
pub fn classify_tracked(tracker: &OperationTracker<'_>) -> Result<Classification> {
    let direction = tracker.direction();

    if !tracker.state_available() {
        let progress = ReadOutcome::Absent;
        return Ok(Classification {
            direction: direction.name.clone(),
            state: DisplayState::Unprocessed,
            completed_count: 0,
            detail: describe(tracker, &progress, DisplayState::Unprocessed),
        });
    }

    let progress = tracker.current_step()?;
    let completed = tracker.completed_operations();
    let count = completed_count(direction.is_field(), completed);

    let state = match &progress {
        ReadOutcome::Present(p) if tracker.has_error(&p.start_time) => DisplayState::Error,
        ReadOutcome::Present(_) => DisplayState::Processing,
        ReadOutcome::Absent | ReadOutcome::Malformed(_) => {
            if completed.iter().any(|op| op == SELFCAL_OPERATION) {
                if verify_selfcal(direction) {
                    DisplayState::SelfcalOk(effective_count(count))
                } else {
                    DisplayState::SelfcalFailed
                }
            } else if !completed.is_empty() {
                // Selfcal normally runs first, so this is rare
                DisplayState::SelfcalOk(effective_count(count))
            } else {
                DisplayState::Unprocessed
            }
        }
    };

    log::debug!("Classified {} as {:?} (completed {})", direction.name, state, count);

    Ok(Classification {
        direction: direction.name.clone(),
        state,
        completed_count: count,
        detail: describe(tracker, &progress, state),
    })
}
