//! Self-calibration quality gate.
//!
//! Self-calibration ends by checking that subtraction left clean residuals;
//! the result is written as a mapfile of per-host booleans.

use crate::artifact::{ReadOutcome, read_verification};
use crate::direction::Direction;

/// Operation that performs self-calibration and subtraction
pub const SELFCAL_OPERATION: &str = "facetselfcal";

/// Verification mapfile written at the end of self-calibration
pub const VERIFY_MAPFILE: &str = "verify_subtract.break.mapfile";

/// Outcome of the self-calibration check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateResult {
    /// Every host reported a clean subtraction
    Passed,
    /// At least one host reported failure
    Failed,
    /// Verification has not been written (or is unreadable)
    NotVerified,
}

impl GateResult {
    pub fn passed(self) -> bool {
        self == GateResult::Passed
    }
}

/// Evaluate the self-calibration gate with detail
pub fn check_selfcal(direction: &Direction) -> GateResult {
    let path = direction.operation(SELFCAL_OPERATION).mapfile(VERIFY_MAPFILE);
    match read_verification(&path) {
        ReadOutcome::Present(flags) => {
            if flags.iter().all(|(_, passed)| *passed) {
                GateResult::Passed
            } else {
                let failed: Vec<&str> = flags.iter().filter(|(_, ok)| !ok).map(|(h, _)| h.as_str()).collect();
                log::debug!("Selfcal verification failed for {} on {:?}", direction.name, failed);
                GateResult::Failed
            }
        }
        ReadOutcome::Absent => GateResult::NotVerified,
        ReadOutcome::Malformed(reason) => {
            log::debug!("Selfcal verification for {} unreadable: {}", direction.name, reason);
            GateResult::NotVerified
        }
    }
}

/// True iff the verification mapfile exists and every entry is `True`
pub fn verify_selfcal(direction: &Direction) -> bool {
    check_selfcal(direction).passed()
}
