//! Directions (work units) and the on-disk layout of their results.
//!
//! A direction's completed/started operation lists are read fresh from
//! `<working_dir>/state/<name>_save.pkl` (pickled by the pipeline) or its
//! JSON counterpart `<name>_save.json` on every evaluation; nothing is
//! cached between polls.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::artifact::{ReadOutcome, decode_record, outcome_from_io};
use crate::error::{CheckError, Result};

/// Pseudo direction standing for the whole-field mosaic
pub const FIELD_DIRECTION: &str = "field";

const STATE_DIR: &str = "state";
/// State file suffixes, in lookup order
const STATE_SUFFIXES: [&str; 2] = ["_save.pkl", "_save.json"];

/// One independently processed direction of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Direction {
    pub name: String,
    pub working_dir: PathBuf,
}

impl Direction {
    pub fn new(name: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            working_dir: working_dir.into(),
        }
    }

    /// True for the whole-field pseudo direction
    pub fn is_field(&self) -> bool {
        self.name == FIELD_DIRECTION
    }

    /// Name for compact displays: `facet_patch_12` becomes `12`
    pub fn display_name(&self, trim: bool) -> &str {
        if trim {
            self.name.rsplit('_').next().unwrap_or(&self.name)
        } else {
            &self.name
        }
    }

    /// The state file in use: the first one present, else the pickle path
    pub fn state_path(&self) -> PathBuf {
        let [pickled, json] =
            STATE_SUFFIXES.map(|suffix| self.working_dir.join(STATE_DIR).join(format!("{}{}", self.name, suffix)));
        if !pickled.exists() && json.exists() { json } else { pickled }
    }

    /// Results directory of `operation` for this direction
    pub fn operation(&self, operation: &str) -> OperationPaths {
        OperationPaths {
            root: self.working_dir.join("results").join(operation).join(&self.name),
        }
    }

    /// Read the persisted operation lists
    pub fn load_state(&self) -> ReadOutcome<DirectionState> {
        let path = self.state_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => return outcome_from_io(e),
        };
        match decode_record::<DirectionState>(&bytes) {
            Ok(state) => ReadOutcome::Present(state),
            Err(e) => {
                log::debug!("State for {} not parsable ({}), treating as mid-write", self.name, e);
                ReadOutcome::Malformed(e)
            }
        }
    }
}

/// Persisted progress of one direction
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DirectionState {
    /// Operations that finished, in completion order
    #[serde(default)]
    pub completed_operations: Vec<String>,
    /// Operations that were started, in start order
    #[serde(default)]
    pub started_operations: Vec<String>,
}

impl DirectionState {
    pub fn is_completed(&self, operation: &str) -> bool {
        self.completed_operations.iter().any(|op| op == operation)
    }

    /// The most recently started operation that has not completed.
    ///
    /// `None` means the direction is idle: either never started or done
    /// with its last operation.
    pub fn current_operation(&self) -> Option<&str> {
        self.started_operations
            .iter()
            .rev()
            .find(|op| !self.is_completed(op))
            .map(String::as_str)
    }
}

/// Paths inside `results/<operation>/<direction>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPaths {
    pub root: PathBuf,
}

impl OperationPaths {
    pub fn statefile(&self) -> PathBuf {
        self.root.join("statefile")
    }

    pub fn parset(&self) -> PathBuf {
        self.root.join("pipeline.parset")
    }

    pub fn mapfile(&self, name: &str) -> PathBuf {
        self.root.join("mapfiles").join(name)
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn pipeline_log(&self, start_time: &str) -> PathBuf {
        self.logs().join(start_time).join("pipeline.log")
    }
}

/// Discover the directions of a run from its state directory.
///
/// Directions are returned in name order, followed by the whole-field
/// pseudo direction.
pub fn discover(working_dir: &Path) -> Result<Vec<Direction>> {
    let state_dir = working_dir.join(STATE_DIR);
    if !state_dir.is_dir() {
        return Err(CheckError::WorkingDir(format!(
            "{} has no {} directory; run this after directions are defined",
            working_dir.display(),
            STATE_DIR
        )));
    }

    let mut names: Vec<String> = fs::read_dir(&state_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let file_name = entry.file_name();
            let file_name = file_name.to_str()?;
            STATE_SUFFIXES
                .iter()
                .find_map(|suffix| file_name.strip_suffix(suffix))
                .map(str::to_string)
        })
        .filter(|name| !name.is_empty() && name != FIELD_DIRECTION)
        .collect();
    names.sort();
    names.dedup();

    log::debug!("Discovered {} directions in {}", names.len(), working_dir.display());

    let mut directions: Vec<Direction> = names.into_iter().map(|name| Direction::new(name, working_dir)).collect();
    directions.push(Direction::new(FIELD_DIRECTION, working_dir));
    Ok(directions)
}

/// Build directions from explicit names, appending the field pseudo direction
pub fn from_names(working_dir: &Path, names: &[String]) -> Vec<Direction> {
    let mut directions: Vec<Direction> = names
        .iter()
        .filter(|name| name.as_str() != FIELD_DIRECTION)
        .map(|name| Direction::new(name.clone(), working_dir))
        .collect();
    directions.push(Direction::new(FIELD_DIRECTION, working_dir));
    directions
}

/// Look up a direction by full name, or by its trimmed display name
pub fn find<'a>(directions: &'a [Direction], name: &str) -> Result<&'a Direction> {
    directions
        .iter()
        .find(|d| d.name == name)
        .or_else(|| directions.iter().find(|d| d.display_name(true) == name))
        .ok_or_else(|| CheckError::UnknownDirection(name.to_string()))
}
