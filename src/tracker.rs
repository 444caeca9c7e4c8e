//! Operation tracker
//!
//! Works out, for one direction, which operation is running, which of its
//! steps is active, when the run started, and whether its log shows a fatal
//! error. One tracker serves one evaluation: the direction state and the
//! statefile are each read at most once through it.

use std::cell::OnceCell;

use chrono::NaiveDateTime;

use crate::artifact::{ReadOutcome, StateRecord, newest_child, read_state, tail_last_line};
use crate::catalog::StepCatalog;
use crate::direction::{Direction, DirectionState, OperationPaths};
use crate::error::Result;

/// Last-line phrases the pipeline writes when a run dies
pub const FATAL_PHRASES: [&str; 2] = ["Processing interrupted: shutting down", "completed with errors"];

/// Timestamp format of log directory names and statefile start times
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Where the current operation is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepProgress {
    pub operation: String,
    /// Step believed to be running now
    pub step: String,
    /// Zero-based position of `step` in the catalog
    pub index: usize,
    pub total: usize,
    pub start_time: String,
}

/// Per-evaluation view of one direction's operations
pub struct OperationTracker<'a> {
    direction: &'a Direction,
    state: ReadOutcome<DirectionState>,
    statefile: OnceCell<ReadOutcome<StateRecord>>,
}

impl<'a> OperationTracker<'a> {
    /// Read the direction's state and prepare a tracker for one evaluation
    pub fn new(direction: &'a Direction) -> Self {
        Self {
            direction,
            state: direction.load_state(),
            statefile: OnceCell::new(),
        }
    }

    pub fn direction(&self) -> &Direction {
        self.direction
    }


    pub fn state_available(&self) -> bool {
        self.state.is_present()
    }

    /// Completed operations; empty if the state is unavailable
    pub fn completed_operations(&self) -> &[String] {
        self.state
            .as_present()
            .map(|s| s.completed_operations.as_slice())
            .unwrap_or(&[])
    }

    /// Started operations; empty if the state is unavailable
    pub fn started_operations(&self) -> &[String] {
        self.state
            .as_present()
            .map(|s| s.started_operations.as_slice())
            .unwrap_or(&[])
    }

    /// Most recently started operation that has not completed
    pub fn current_operation(&self) -> Option<&str> {
        self.state.as_present().and_then(DirectionState::current_operation)
    }

    fn current_paths(&self) -> Option<(String, OperationPaths)> {
        let op = self.current_operation()?;
        Some((op.to_string(), self.direction.operation(op)))
    }

    /// Statefile of the current operation, read once per tracker
    pub fn state_record(&self) -> &ReadOutcome<StateRecord> {
        self.statefile.get_or_init(|| match self.current_paths() {
            Some((_, paths)) => read_state(&paths.statefile()),
            None => ReadOutcome::Absent,
        })
    }


    /// Locate the active step of the current operation.
    ///
    /// The statefile is scanned from its newest result backward for the last
    /// step that appears in the catalog; the active step is the one after it,
    /// clamped to the final step. Within a loop that is still iterating this
    /// reports the step after the loop body, because the statefile does not
    /// record loop iterations.
    ///
    /// Returns `Absent` when there is no current operation or no step has
    /// finished yet, and `Malformed` when the statefile is mid-write.
    pub fn current_step(&self) -> Result<ReadOutcome<StepProgress>> {
        let Some((operation, paths)) = self.current_paths() else {
            return Ok(ReadOutcome::Absent);
        };

        let record = match self.state_record() {
            ReadOutcome::Present(record) => record,
            ReadOutcome::Absent => return Ok(ReadOutcome::Absent),
            ReadOutcome::Malformed(reason) => return Ok(ReadOutcome::Malformed(reason.clone())),
        };

        let catalog = match StepCatalog::load(&paths.parset())? {
            ReadOutcome::Present(catalog) => catalog,
            ReadOutcome::Absent => return Ok(ReadOutcome::Absent),
            ReadOutcome::Malformed(reason) => return Ok(ReadOutcome::Malformed(reason)),
        };

        let Some(previous) = record.finished_steps_newest_first().find(|step| catalog.contains(step)) else {
            log::debug!(
                "No catalogued step finished yet for {} in {}",
                self.direction.name,
                operation
            );
            return Ok(ReadOutcome::Absent);
        };

        let Some(index) = catalog.index_after(&previous) else {
            return Ok(ReadOutcome::Absent);
        };

        let start_time = corrected_start_time(record.start_time(), &paths);

        Ok(ReadOutcome::Present(StepProgress {
            operation,
            step: catalog.steps()[index].clone(),
            index,
            total: catalog.len(),
            start_time,
        }))
    }

    /// Whether the current operation's log for the run started at
    /// `start_time` ends with a fatal message.
    ///
    /// A missing, empty, or unreadable log counts as "no error".
    pub fn has_error(&self, start_time: &str) -> bool {
        let Some((_, paths)) = self.current_paths() else {
            return false;
        };

        match tail_last_line(&paths.pipeline_log(start_time)) {
            ReadOutcome::Present(line) => is_fatal_line(&line),
            ReadOutcome::Absent | ReadOutcome::Malformed(_) => false,
        }
    }
}

/// True if a log line carries one of the fatal phrases
pub fn is_fatal_line(line: &str) -> bool {
    FATAL_PHRASES.iter().any(|phrase| line.contains(phrase))
}

/// Correct the statefile's start time with the newest log directory.
///
/// The statefile is only rewritten once a step finishes, so a freshly
/// restarted run still carries the previous run's start time. The newest
/// log directory's name wins unless both parse as timestamps and the log
/// directory is not later.
fn corrected_start_time(recorded: &str, paths: &OperationPaths) -> String {
    let Some(newest) = newest_child(&paths.logs()) else {
        return recorded.to_string();
    };
    let Some(name) = newest.file_name().and_then(|n| n.to_str()) else {
        return recorded.to_string();
    };

    let parse = |s: &str| NaiveDateTime::parse_from_str(s, LOG_TIMESTAMP_FORMAT).ok();
    match (parse(recorded), parse(name)) {
        (Some(recorded_at), Some(logged_at)) if logged_at <= recorded_at => recorded.to_string(),
        _ => name.to_string(),
    }
}
