//! Loading / success / error notifications around mutations.
//!
//! [`handle_req_with_toaster`] wraps a request future: it raises a loading
//! toast, awaits the request, then resolves the toast with the success text
//! or the error's [`toast_message`](crate::error::ClientError::toast_message).

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::ClientResult;

pub type ToastId = u64;

/// Sink for toasts. The dashboard shell decides how they are shown.
pub trait Notifier: Send + Sync {
    fn loading(&self, message: &str) -> ToastId;
    fn success(&self, id: ToastId, message: &str);
    fn error(&self, id: ToastId, message: &str);
}

/// Texts shown while a request runs and after it succeeds.
#[derive(Debug, Clone, Copy)]
pub struct ToastMessages<'a> {
    pub loading: &'a str,
    pub success: &'a str,
}

impl<'a> ToastMessages<'a> {
    pub fn new(loading: &'a str, success: &'a str) -> Self {
        Self { loading, success }
    }
}

/// Run `request` under a loading toast and resolve it with the outcome.
pub async fn handle_req_with_toaster<T, F>(
    notifier: &dyn Notifier,
    messages: ToastMessages<'_>,
    request: F,
) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    let id = notifier.loading(messages.loading);
    match request.await {
        Ok(value) => {
            notifier.success(id, messages.success);
            Ok(value)
        }
        Err(err) => {
            notifier.error(id, &err.toast_message());
            Err(err)
        }
    }
}

fn next_id(counter: &AtomicU64) -> ToastId {
    counter.fetch_add(1, Ordering::Relaxed) + 1
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// Emits toasts as tracing events.
#[derive(Debug, Default)]
pub struct TracingNotifier {
    counter: AtomicU64,
}

impl Notifier for TracingNotifier {
    fn loading(&self, message: &str) -> ToastId {
        let id = next_id(&self.counter);
        tracing::debug!(toast = id, message, "Loading");
        id
    }

    fn success(&self, id: ToastId, message: &str) {
        tracing::info!(toast = id, message, "Success");
    }

    fn error(&self, id: ToastId, message: &str) {
        tracing::error!(toast = id, message, "Error");
    }
}

/// A toast as seen by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toast {
    Loading(ToastId, String),
    Success(ToastId, String),
    Error(ToastId, String),
}

/// Keeps every toast in memory; used by tests and non-interactive callers.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    counter: AtomicU64,
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    /// Message of the most recent error toast.
    pub fn last_error(&self) -> Option<String> {
        self.lock().iter().rev().find_map(|t| match t {
            Toast::Error(_, message) => Some(message.clone()),
            _ => None,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Toast>> {
        self.toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, toast: Toast) {
        self.lock().push(toast);
    }
}

impl Notifier for RecordingNotifier {
    fn loading(&self, message: &str) -> ToastId {
        let id = next_id(&self.counter);
        self.push(Toast::Loading(id, message.to_string()));
        id
    }

    fn success(&self, id: ToastId, message: &str) {
        self.push(Toast::Success(id, message.to_string()));
    }

    fn error(&self, id: ToastId, message: &str) {
        self.push(Toast::Error(id, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[tokio::test]
    async fn success_resolves_loading_toast() {
        let notifier = RecordingNotifier::new();
        let value = handle_req_with_toaster(
            &notifier,
            ToastMessages::new("Saving brand...", "Brand saved"),
            async { Ok::<_, ClientError>(7) },
        )
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(
            notifier.toasts(),
            vec![
                Toast::Loading(1, "Saving brand...".into()),
                Toast::Success(1, "Brand saved".into()),
            ]
        );
    }

    #[tokio::test]
    async fn api_error_message_becomes_toast() {
        let notifier = RecordingNotifier::new();
        let result: ClientResult<()> = handle_req_with_toaster(
            &notifier,
            ToastMessages::new("Deleting...", "Deleted"),
            async {
                Err(ClientError::Api {
                    status: 409,
                    message: "Brand has models".into(),
                })
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(notifier.last_error().as_deref(), Some("Brand has models"));
    }
}
