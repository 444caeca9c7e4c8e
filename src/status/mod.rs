//! Status classification
//!
//! Turns a direction's artifacts into one display state plus a completed
//! operation count used to shade finished directions progressively darker.
//!
//! - `classify`: the priority rules and the `Classification` result
//! - `count`: completed-operation counting with its corrective rules
//! - `detail`: human-readable description of a direction's progress
//! - `color`: fixed state colors and the completed-count shading

pub mod classify;
pub mod color;
pub mod count;
pub mod detail;

use serde::Serialize;

pub use classify::{Classification, classify, classify_tracked};
pub use color::{Rgba, completed_color};
pub use count::{completed_count, effective_count};
pub use detail::{describe, wrap};

/// What a direction looks like right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum DisplayState {
    /// Nothing observable yet, or state unavailable
    Unprocessed,
    /// An operation is running and its step is known
    Processing,
    /// The running operation's log ended with a fatal message
    Error,
    /// Self-calibration finished but did not verify
    SelfcalFailed,
    /// Self-calibration verified; carries the effective completed count
    SelfcalOk(u32),
    /// Re-imaging stage reached after a verified self-calibration
    Reimaged(u32),
}

impl DisplayState {
    pub fn label(&self) -> String {
        match self {
            DisplayState::Unprocessed => "Unprocessed".to_string(),
            DisplayState::Processing => "Processing".to_string(),
            DisplayState::Error => "Pipeline Error".to_string(),
            DisplayState::SelfcalFailed => "Selfcal Failed".to_string(),
            DisplayState::SelfcalOk(_) => "Selfcal OK".to_string(),
            DisplayState::Reimaged(stage) => format!("Image {}", stage),
        }
    }

    pub fn color(&self) -> Rgba {
        match self {
            DisplayState::Unprocessed => color::UNPROCESSED,
            DisplayState::Processing => color::PROCESSING,
            DisplayState::Error => color::ERROR,
            DisplayState::SelfcalFailed => color::SELFCAL_FAILED,
            DisplayState::SelfcalOk(count) => completed_color(*count),
            DisplayState::Reimaged(stage) => completed_color(stage + 1),
        }
    }

    /// Express `SelfcalOk(n)` as a re-imaging stage when the run is
    /// configured for that many re-images.
    ///
    /// `SelfcalOk(n)` with `2 <= n <= reimages + 1` becomes `Reimaged(n - 1)`.
    /// The shade is unchanged.
    pub fn with_reimage_stage(self, reimages: u32) -> Self {
        match self {
            DisplayState::SelfcalOk(n) if n >= 2 && n - 1 <= reimages => DisplayState::Reimaged(n - 1),
            other => other,
        }
    }
}

/// Legend entries in display order, with `reimages` image stages appended
pub fn legend(reimages: u32) -> Vec<(String, Rgba)> {
    let mut entries: Vec<(String, Rgba)> = [
        DisplayState::Unprocessed,
        DisplayState::Processing,
        DisplayState::Error,
        DisplayState::SelfcalFailed,
    ]
    .iter()
    .map(|state| (state.label(), state.color()))
    .collect();
    entries.push((DisplayState::SelfcalOk(1).label(), color::SELFCAL_OK));

    for stage in 1..=reimages {
        let state = DisplayState::Reimaged(stage);
        entries.push((state.label(), state.color()));
    }
    entries
}
