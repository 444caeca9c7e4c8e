//! Statefile reader.
//!
//! The pipeline persists each operation's run as a two-part record:
//! a header carrying the run's start time, and the ordered list of step
//! results so far. Each result points at a completion marker whose file
//! name identifies the step that produced it.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{ReadOutcome, decode_record, outcome_from_io};

/// Key under which a step result records its completion marker
pub const OK_MAPFILE_KEY: &str = "ok.mapfile";

/// Suffix the pipeline appends to completion marker file names
const OK_MAPFILE_SUFFIX: &str = ".ok.mapfile";

/// Header of a statefile
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateHeader {
    /// Timestamp the run started, as written by the pipeline
    pub start_time: String,
}

/// One `[step, outputs]` pair from the statefile
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepResult(pub String, pub serde_json::Map<String, serde_json::Value>);

impl StepResult {
    /// Path of the completion marker, if this result carries one
    pub fn marker(&self) -> Option<&str> {
        self.1.get(OK_MAPFILE_KEY).and_then(|v| v.as_str())
    }

    /// Name of the step that wrote the completion marker.
    ///
    /// Derived from the marker's file name rather than the recorded step
    /// name, since plugin steps record results under borrowed names.
    pub fn finished_step(&self) -> Option<String> {
        let marker = self.marker()?;
        let file_name = Path::new(marker).file_name()?.to_str()?;
        let step = file_name.split(OK_MAPFILE_SUFFIX).next().unwrap_or(file_name);
        if step.is_empty() { None } else { Some(step.to_string()) }
    }
}

#[derive(Deserialize)]
struct RawStateRecord(StateHeader, Vec<StepResult>);

/// A parsed statefile
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawStateRecord")]
pub struct StateRecord {
    pub header: StateHeader,
    pub results: Vec<StepResult>,
}

impl From<RawStateRecord> for StateRecord {
    fn from(raw: RawStateRecord) -> Self {
        Self {
            header: raw.0,
            results: raw.1,
        }
    }
}

impl StateRecord {
    pub fn start_time(&self) -> &str {
        &self.header.start_time
    }

    /// Finished step names, newest first
    pub fn finished_steps_newest_first(&self) -> impl Iterator<Item = String> + '_ {
        self.results.iter().rev().filter_map(StepResult::finished_step)
    }
}

/// Read and parse a statefile.
///
/// The pipeline pickles the `(inputs, results)` pair; a JSON array of the
/// same shape is also accepted. A truncated or otherwise unparsable file is reported as `Malformed`:
/// the pipeline rewrites the statefile after every step, and a reader can
/// land in the middle of that rewrite.
pub fn read_state(path: &Path) -> ReadOutcome<StateRecord> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return outcome_from_io(e),
    };

    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        log::debug!("Statefile {} is empty, treating as mid-write", path.display());
        return ReadOutcome::Malformed("empty statefile".to_string());
    }

    match decode_record::<StateRecord>(&bytes) {
        Ok(record) => ReadOutcome::Present(record),
        Err(e) => {
            log::debug!("Statefile {} not parsable ({}), treating as mid-write", path.display(), e);
            ReadOutcome::Malformed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"[
        {"start_time": "2017-03-01T10:00:00", "parset": "pipeline.parset"},
        [
            ["create_ms_map", {"ok.mapfile": "/run/results/facetselfcal/s1/mapfiles/create_ms_map.ok.mapfile"}],
            ["add_images", {"mapfile": "/run/results/facetselfcal/s1/mapfiles/images.mapfile"}],
            ["concat", {"ok.mapfile": "/run/results/facetselfcal/s1/mapfiles/concat.ok.mapfile"}]
        ]
    ]"#;

    // pickle.dumps((inputs, results), protocol=0) from Python 3
    const PICKLED: &str = "((dp0\nVstart_time\np1\nV2017-03-01T10:00:00\np2\nsVparset\np3\nVpipeline.parset\np4\ns\
(lp5\n(Vcreate_ms_map\np6\n(dp7\nVok.mapfile\np8\nV/run/results/facetselfcal/s1/mapfiles/create_ms_map.ok.mapfile\n\
p9\nstp10\na(Vprepare\np11\n(dp12\ng8\nV/run/results/facetselfcal/s1/mapfiles/prepare.ok.mapfile\np13\nstp14\natp15\n.";

    // Same shape as written by a Python 2 pipeline (`str` opcodes)
    const PICKLED_PY2: &[u8] = b"((dp0\nS'start_time'\np1\nS'2017-03-01T10:00:00'\np2\nsS'parset'\np3\n\
S'pipeline.parset'\np4\ns(lp5\n(S'prepare'\np6\n(dp7\nS'ok.mapfile'\np8\n\
S'/run/results/facetselfcal/s1/mapfiles/prepare.ok.mapfile'\np9\nstp10\natp11\n.";

    #[test]
    fn test_read_state_pickled_record() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("statefile");
        fs::write(&path, PICKLED).unwrap();

        let record = read_state(&path).present().unwrap();
        assert_eq!(record.start_time(), "2017-03-01T10:00:00");
        let steps: Vec<String> = record.finished_steps_newest_first().collect();
        assert_eq!(steps, vec!["prepare".to_string(), "create_ms_map".to_string()]);
    }

    #[test]
    fn test_read_state_python2_pickle() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("statefile");
        fs::write(&path, PICKLED_PY2).unwrap();

        let record = read_state(&path).present().unwrap();
        assert_eq!(record.start_time(), "2017-03-01T10:00:00");
        assert_eq!(record.results[0].finished_step().as_deref(), Some("prepare"));
    }

    #[test]
    fn test_read_state_truncated_pickle_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("statefile");
        fs::write(&path, &PICKLED.as_bytes()[..PICKLED.len() / 2]).unwrap();

        assert!(matches!(read_state(&path), ReadOutcome::Malformed(_)));
    }

    #[test]
    fn test_read_state_parses_record() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("statefile");
        fs::write(&path, SAMPLE).unwrap();

        let record = read_state(&path).present().unwrap();
        assert_eq!(record.start_time(), "2017-03-01T10:00:00");
        assert_eq!(record.results.len(), 3);
    }

    #[test]
    fn test_finished_steps_skip_results_without_marker() {
        let record: StateRecord = serde_json::from_str(SAMPLE).unwrap();
        let steps: Vec<String> = record.finished_steps_newest_first().collect();
        assert_eq!(steps, vec!["concat".to_string(), "create_ms_map".to_string()]);
    }

    #[test]
    fn test_read_state_missing_is_absent() {
        let temp = TempDir::new().unwrap();
        assert_eq!(read_state(&temp.path().join("statefile")), ReadOutcome::Absent);
    }

    #[test]
    fn test_read_state_truncated_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("statefile");
        fs::write(&path, &SAMPLE.as_bytes()[..SAMPLE.len() / 2]).unwrap();

        assert!(matches!(read_state(&path), ReadOutcome::Malformed(_)));
    }

    #[test]
    fn test_read_state_empty_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("statefile");
        fs::write(&path, "").unwrap();

        assert!(matches!(read_state(&path), ReadOutcome::Malformed(_)));
    }

    #[test]
    fn test_finished_step_strips_suffix() {
        let result: StepResult =
            serde_json::from_str(r#"["x", {"ok.mapfile": "/a/b/wsclean_image12.ok.mapfile"}]"#).unwrap();
        assert_eq!(result.finished_step().as_deref(), Some("wsclean_image12"));
    }
}
