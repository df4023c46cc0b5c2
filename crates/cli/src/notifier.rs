use std::io::Write;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dealerdash_client::toaster::{Notifier, ToastId};

/// Prints toasts to stderr and mirrors them as tracing events.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    counter: AtomicU64,
    errors_shown: AtomicUsize,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of error toasts printed so far.
    pub fn errors_shown(&self) -> usize {
        self.errors_shown.load(Ordering::Relaxed)
    }

    fn print(&self, marker: &str, message: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{marker} {message}");
    }
}

impl Notifier for ConsoleNotifier {
    fn loading(&self, message: &str) -> ToastId {
        let id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(toast = id, message, "Loading");
        self.print("..", message);
        id
    }

    fn success(&self, id: ToastId, message: &str) {
        tracing::debug!(toast = id, message, "Success");
        self.print("ok", message);
    }

    fn error(&self, id: ToastId, message: &str) {
        self.errors_shown.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(toast = id, message, "Error");
        self.print("!!", message);
    }
}
