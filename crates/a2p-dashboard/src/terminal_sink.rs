use std::io::{self, Write};

use a2p_report::{ProgressUpdate, ReportLine, ReportSink};

/// Writes report lines as markdown to `out` and, when enabled, a single
/// rewritten progress line to `progress`.
pub(crate) struct TerminalSink<O: Write, P: Write> {
    out: O,
    progress: P,
    show_progress: bool,
    write_error: Option<io::Error>,
}

impl<O: Write, P: Write> TerminalSink<O, P> {
    pub(crate) fn new(out: O, progress: P, show_progress: bool) -> Self {
        Self {
            out,
            progress,
            show_progress,
            write_error: None,
        }
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(error) = result {
            self.write_error.get_or_insert(error);
        }
    }

    pub(crate) fn write_raw(&mut self, text: &str) {
        let result = writeln!(self.out, "{text}");
        self.record(result);
    }

    /// Flushes output and surfaces the first write failure, if any.
    pub(crate) fn finish(mut self) -> io::Result<()> {
        if let Some(error) = self.write_error.take() {
            return Err(error);
        }
        self.out.flush()?;
        self.progress.flush()
    }
}

impl<O: Write, P: Write> ReportSink for TerminalSink<O, P> {
    fn progress(&mut self, update: &ProgressUpdate) {
        if !self.show_progress {
            return;
        }
        let percent = (update.fraction() * 100.0).round() as u32;
        let result = match update {
            ProgressUpdate::Step {
                current,
                total,
                label,
            } => write!(
                self.progress,
                "\r\x1b[2K[{current}/{total} {percent:>3}%] {label}"
            )
                .and_then(|_| self.progress.flush()),
            ProgressUpdate::Finished => {
                write!(self.progress, "\r\x1b[2K").and_then(|_| self.progress.flush())
            }
        };
        self.record(result);
    }

    fn emit(&mut self, line: &ReportLine) {
        let result = writeln!(self.out, "{}", line.to_markdown());
        self.record(result);
    }
}
