//! Transient user notifications ("toasts").
//!
//! Stores report user-visible outcomes through a [`Notifier`]. The embedding
//! front end decides how to render them; the bundled implementations log
//! them ([`TracingNotifier`]) or record them for inspection ([`ToastLog`]).

use std::sync::{Arc, PoisonError, RwLock};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// A single transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    /// A success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    /// An error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    /// An informational notification.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            message: message.into(),
        }
    }
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    /// Present a notification to the user.
    fn notify(&self, toast: Toast);
}

/// Shared handle to a notifier.
pub type SharedNotifier = Arc<dyn Notifier>;

/// Notifier that writes toasts to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Error => tracing::warn!(target: "shopfront::toast", "{}", toast.message),
            ToastKind::Success | ToastKind::Info => {
                tracing::info!(target: "shopfront::toast", "{}", toast.message);
            }
        }
    }
}

/// Notifier that records every toast in order.
#[derive(Debug, Default)]
pub struct ToastLog {
    toasts: RwLock<Vec<Toast>>,
}

impl ToastLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded toasts, oldest first.
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of recorded error toasts.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.toasts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|t| t.kind == ToastKind::Error)
            .map(|t| t.message.clone())
            .collect()
    }

    /// Whether any toast carries exactly `message`.
    #[must_use]
    pub fn contains(&self, message: &str) -> bool {
        self.toasts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|t| t.message == message)
    }
}

impl Notifier for ToastLog {
    fn notify(&self, toast: Toast) {
        self.toasts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_log_records_in_order() {
        let log = ToastLog::new();
        log.notify(Toast::success("Added to cart"));
        log.notify(Toast::error("Out of stock"));

        let toasts = log.toasts();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].kind, ToastKind::Success);
        assert_eq!(log.errors(), vec!["Out of stock".to_string()]);
        assert!(log.contains("Added to cart"));
        assert!(!log.contains("Removed"));
    }
}
