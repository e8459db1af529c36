//! Coarse progress events emitted while a body is streamed to disk.

use std::io::Write;

/// Chunks between two `ProgressEvent::Chunks` events.
pub const PROGRESS_INTERVAL: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Another `PROGRESS_INTERVAL` chunks were written; carries the running total.
    Chunks(u64),
    /// Streaming finished successfully.
    Completed { chunks: u64, bytes: u64 },
}

/// Receiver for progress events.
///
/// Any `Fn(ProgressEvent) + Send + Sync` closure is a reporter.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Prints one `*` per event on stdout, ending the line on completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        let mut stdout = std::io::stdout().lock();
        // Progress output is best effort.
        let _ = match event {
            ProgressEvent::Chunks(_) => write!(stdout, "*"),
            ProgressEvent::Completed { .. } => writeln!(stdout, "*"),
        };
        let _ = stdout.flush();
    }
}
