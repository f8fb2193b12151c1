use std::io::{self, Write};

use crate::app::{ProgressEvent, ProgressSink};

pub const PROGRESS_HEADER: &str = "N\tAccn\tResult";

pub fn format_event(event: &ProgressEvent) -> String {
    format!("{}\t{}\t{}", event.row, event.accn, event.outcome)
}

/// Live progress table on standard output.
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn start(&self) {
        write_line(PROGRESS_HEADER);
    }

    fn event(&self, event: ProgressEvent) {
        write_line(&format_event(&event));
    }
}

fn write_line(line: &str) {
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{line}");
    let _ = stdout.flush();
}

/// Discards progress.
pub struct QuietProgress;

impl ProgressSink for QuietProgress {
    fn event(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LookupOutcome;

    #[test]
    fn progress_line_layout() {
        let event = ProgressEvent {
            row: 1,
            accn: "ABC123".to_string(),
            outcome: LookupOutcome::Failed,
        };
        assert_eq!(format_event(&event), "1\tABC123\tfailed");
    }
}
