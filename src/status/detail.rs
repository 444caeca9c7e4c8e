//! Human-readable progress description for one direction.

use super::DisplayState;
use crate::artifact::ReadOutcome;
use crate::tracker::{OperationTracker, StepProgress};

const WRAP_WIDTH: usize = 60;

/// Describe a direction's progress.
///
/// `progress` is the current-step lookup already made by the caller, so the
/// statefile and parset are not read a second time.
pub fn describe(tracker: &OperationTracker<'_>, progress: &ReadOutcome<StepProgress>, state: DisplayState) -> String {
    let mut info = format!("Selected direction: {}\n", tracker.direction().name);

    if !tracker.state_available() {
        info.push_str("State not available");
        return info;
    }

    let completed = tracker.completed_operations();
    if completed.is_empty() {
        info.push_str("Completed ops: None\n");
    } else {
        let lines = wrap(&completed.join(", "), WRAP_WIDTH);
        info.push_str(&format!("Completed ops: {}\n", lines.join("\n  ")));
    }

    match tracker.current_operation() {
        None => info.push_str("Current op: None"),
        Some(op) => {
            info.push_str(&format!("Current op: {}", op));
            match progress {
                ReadOutcome::Present(p) => {
                    info.push_str(&format!("\n- Started at: {}\n", p.start_time));
                    info.push_str(&format!("- Current step: {} (step {} of {})", p.step, p.index + 1, p.total));
                }
                ReadOutcome::Absent | ReadOutcome::Malformed(_) => {
                    info.push_str("\n- Waiting for state update...");
                }
            }
            if state == DisplayState::Error {
                info.push_str("\n- Pipeline reported an error");
            }
        }
    }

    info
}

/// Greedy word wrap at `width` columns, one entry per output line
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line: Vec<&str> = Vec::new();
        let mut len_line = 0;
        for word in paragraph.split(' ') {
            let len_word = word.chars().count();
            if len_line + len_word <= width || line.is_empty() {
                line.push(word);
                len_line += len_word + 1;
            } else {
                lines.push(line.join(" "));
                line = vec![word];
                len_line = len_word + 1;
            }
        }
        lines.push(line.join(" "));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_short_text() {
        assert_eq!(wrap("facetselfcal, facetsub", 60), vec!["facetselfcal, facetsub"]);
    }

    #[test]
    fn test_wrap_breaks_long_text() {
        let lines = wrap("aaaa bbbb cccc dddd", 9);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn test_wrap_overlong_word_kept_whole() {
        let lines = wrap("abcdefghijkl xy", 5);
        assert_eq!(lines, vec!["abcdefghijkl", "xy"]);
    }

    #[test]
    fn test_wrap_paragraphs() {
        assert_eq!(wrap("a b\nc", 60), vec!["a b", "c"]);
    }
}
