//! Last-line reader for append-only logs.
//!
//! Pipeline logs can grow to hundreds of megabytes; only the final line is
//! of interest, so the file is scanned backward from its end.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::{ReadOutcome, outcome_from_io};

const CHUNK_SIZE: u64 = 4096;

/// How far back to look for a line boundary before giving up
pub const DEFAULT_SCAN_BUDGET: u64 = 64 * 1024;

/// Return the last line of a log file, without its line terminator.
///
/// A single trailing newline is ignored, so a file ending in `"...done\n"`
/// and one ending in `"...done"` both yield `"...done"`.
pub fn tail_last_line(path: &Path) -> ReadOutcome<String> {
    tail_last_line_with_budget(path, DEFAULT_SCAN_BUDGET)
}

/// Like [`tail_last_line`], with an explicit scan budget in bytes.
///
/// If no line boundary is found within `budget` bytes of the end (and the
/// start of the file was not reached) the file is reported as `Malformed`.
pub fn tail_last_line_with_budget(path: &Path, budget: u64) -> ReadOutcome<String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return outcome_from_io(e),
    };

    match scan_last_line(&mut file, budget) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::debug!("Log {} changed while tailing: {}", path.display(), e);
            ReadOutcome::Malformed(e.to_string())
        }
    }
}

fn scan_last_line(file: &mut File, budget: u64) -> std::io::Result<ReadOutcome<String>> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(ReadOutcome::Absent);
    }

    let mut end = len;
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        end -= 1;
    }

    let mut pos = end;
    let line_start = loop {
        let chunk_start = pos.saturating_sub(CHUNK_SIZE);
        let mut chunk = vec![0u8; (pos - chunk_start) as usize];
        file.seek(SeekFrom::Start(chunk_start))?;
        file.read_exact(&mut chunk)?;

        if let Some(i) = chunk.iter().rposition(|&b| b == b'\n') {
            break chunk_start + i as u64 + 1;
        }
        if chunk_start == 0 {
            break 0;
        }
        if end - chunk_start >= budget {
            return Ok(ReadOutcome::Malformed(format!(
                "no line boundary in last {} bytes",
                end - chunk_start
            )));
        }
        pos = chunk_start;
    };

    let mut line = vec![0u8; (end - line_start) as usize];
    file.seek(SeekFrom::Start(line_start))?;
    file.read_exact(&mut line)?;

    let text = String::from_utf8_lossy(&line);
    Ok(ReadOutcome::Present(text.trim_end_matches('\r').to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_log(temp: &TempDir, content: &str) -> std::path::PathBuf {
        let path = temp.path().join("pipeline.log");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_last_line_with_trailing_newline() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "first\nsecond\nthird line\n");
        assert_eq!(tail_last_line(&path), ReadOutcome::Present("third line".to_string()));
    }

    #[test]
    fn test_last_line_without_trailing_newline() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "first\nsecond\nthird line");
        assert_eq!(tail_last_line(&path), ReadOutcome::Present("third line".to_string()));
    }

    #[test]
    fn test_single_line_file() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "only line\n");
        assert_eq!(tail_last_line(&path), ReadOutcome::Present("only line".to_string()));
    }

    #[test]
    fn test_crlf_terminators() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "a\r\nb\r\n");
        assert_eq!(tail_last_line(&path), ReadOutcome::Present("b".to_string()));
    }

    #[test]
    fn test_long_file_spanning_chunks() {
        let temp = TempDir::new().unwrap();
        let mut content = String::new();
        for i in 0..5000 {
            content.push_str(&format!("2017-03-01 10:00:00 INFO line {}\n", i));
        }
        content.push_str("genericpipeline: completed with errors\n");
        let path = write_log(&temp, &content);
        assert_eq!(
            tail_last_line(&path),
            ReadOutcome::Present("genericpipeline: completed with errors".to_string())
        );
    }

    #[test]
    fn test_empty_file_is_absent() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "");
        assert_eq!(tail_last_line(&path), ReadOutcome::Absent);
    }

    #[test]
    fn test_missing_file_is_absent() {
        let temp = TempDir::new().unwrap();
        assert_eq!(tail_last_line(&temp.path().join("pipeline.log")), ReadOutcome::Absent);
    }

    #[test]
    fn test_no_boundary_within_budget_is_malformed() {
        let temp = TempDir::new().unwrap();
        let content = format!("head\n{}", "x".repeat(20_000));
        let path = write_log(&temp, &content);
        assert!(matches!(tail_last_line_with_budget(&path, 8192), ReadOutcome::Malformed(_)));
    }
}
