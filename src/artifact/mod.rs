//! Failure-tolerant readers for the artifacts a running pipeline leaves on disk.
//!
//! The pipeline writes these files while we read them, so every reader
//! returns a [`ReadOutcome`] instead of an error:
//! - `state`: the per-operation statefile (step results + start time)
//! - `decode_record`: Python pickle or JSON records
//! - `mapfile`: host/value/flag association lists, used for verification
//! - `log_tail`: last line of an append-only log
//! - `mtime`: newest-directory selection by modification time

pub mod log_tail;
pub mod mapfile;
pub mod mtime;
pub mod state;

pub use log_tail::tail_last_line;
pub use mapfile::{MapEntry, read_mapfile, read_verification};
pub use mtime::{newest_child, newest_subdirectory};
pub use state::{StateHeader, StateRecord, StepResult, read_state};

use serde::de::DeserializeOwned;

/// Result of reading one artifact.
///
/// `Absent` and `Malformed` are both transient from the engine's point of
/// view; they are kept apart so callers can tell "not written yet" from
/// "caught mid-write".
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    /// The artifact was read and parsed
    Present(T),
    /// The artifact does not exist (yet)
    Absent,
    /// The artifact exists but could not be parsed, usually a torn write
    Malformed(String),
}

impl<T> ReadOutcome<T> {
    /// Returns the parsed value, if any
    pub fn present(self) -> Option<T> {
        match self {
            ReadOutcome::Present(value) => Some(value),
            ReadOutcome::Absent | ReadOutcome::Malformed(_) => None,
        }
    }

    /// Borrowing variant of [`ReadOutcome::present`]
    pub fn as_present(&self) -> Option<&T> {
        match self {
            ReadOutcome::Present(value) => Some(value),
            ReadOutcome::Absent | ReadOutcome::Malformed(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ReadOutcome::Present(_))
    }

    /// Transform the parsed value, keeping the unavailable variants
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ReadOutcome<U> {
        match self {
            ReadOutcome::Present(value) => ReadOutcome::Present(f(value)),
            ReadOutcome::Absent => ReadOutcome::Absent,
            ReadOutcome::Malformed(reason) => ReadOutcome::Malformed(reason),
        }
    }

    /// Chain another fallible step onto a parsed value
    pub fn and_then<U, F: FnOnce(T) -> ReadOutcome<U>>(self, f: F) -> ReadOutcome<U> {
        match self {
            ReadOutcome::Present(value) => f(value),
            ReadOutcome::Absent => ReadOutcome::Absent,
            ReadOutcome::Malformed(reason) => ReadOutcome::Malformed(reason),
        }
    }
}

/// Decode a record the pipeline wrote as a Python pickle or as JSON.
///
/// The pipeline pickles its records (protocol 0 by default, which is plain
/// text); JSON is accepted for hand-written or converted runs. A pickle of
/// protocol 0 or 1 never starts with `[` or `{`, so the first byte picks the
/// decoder. Python 2 `str` values are decoded as UTF-8 and globals that
/// cannot be resolved (numpy scalars, custom classes) become `None`.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> std::result::Result<T, String> {
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'[') | Some(b'{') => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
        _ => {
            let options = serde_pickle::DeOptions::new()
                .decode_strings()
                .replace_unresolved_globals();
            serde_pickle::from_slice(bytes, options).map_err(|e| e.to_string())
        }
    }
}

/// Map a file open/read error onto the tolerant outcome.
///
/// NotFound means the producer has not written the file yet; anything else
/// (permission flaps on network mounts, a file replaced mid-read) is treated
/// as a torn read.
pub(crate) fn outcome_from_io<T>(err: std::io::Error) -> ReadOutcome<T> {
    if err.kind() == std::io::ErrorKind::NotFound {
        ReadOutcome::Absent
    } else {
        ReadOutcome::Malformed(err.to_string())
    }
}
