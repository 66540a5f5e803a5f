//! User-facing notifications. Handlers receive a `Notifier` explicitly instead
//! of reaching for shared UI state.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const TOAST_TTL: Duration = Duration::from_secs(3);
const TOAST_HISTORY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

pub trait Notifier {
    fn notify(&mut self, message: &str, kind: ToastKind);

    fn success(&mut self, message: &str) {
        self.notify(message, ToastKind::Success);
    }

    fn error(&mut self, message: &str) {
        self.notify(message, ToastKind::Error);
    }

    fn info(&mut self, message: &str) {
        self.notify(message, ToastKind::Info);
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

/// Toasts for the TUI. Only the newest one is displayed, and only until it expires.
#[derive(Debug)]
pub struct Toasts {
    queue: VecDeque<Toast>,
    ttl: Duration,
}

impl Toasts {
    pub fn new(ttl: Duration) -> Self {
        Self {
            queue: VecDeque::with_capacity(TOAST_HISTORY),
            ttl,
        }
    }

    pub fn push_at(&mut self, message: &str, kind: ToastKind, at: Instant) {
        if self.queue.len() == TOAST_HISTORY {
            self.queue.pop_front();
        }
        self.queue.push_back(Toast {
            message: message.to_string(),
            kind,
            shown_at: at,
        });
    }

    pub fn current_at(&self, now: Instant) -> Option<&Toast> {
        self.queue
            .back()
            .filter(|t| now.saturating_duration_since(t.shown_at) < self.ttl)
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current_at(Instant::now())
    }
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(TOAST_TTL)
    }
}

impl Notifier for Toasts {
    fn notify(&mut self, message: &str, kind: ToastKind) {
        tracing::debug!(?kind, text = message, "toast");
        self.push_at(message, kind, Instant::now());
    }
}

/// Prints notifications for one-shot CLI commands.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, message: &str, kind: ToastKind) {
        match kind {
            ToastKind::Error => {
                tracing::warn!(text = message, "operation failed");
                eprintln!("{}", message);
            }
            ToastKind::Success | ToastKind::Info => println!("{}", message),
        }
    }
}
