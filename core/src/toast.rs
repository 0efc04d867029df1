//! Transient user notifications.
//!
//! Pages push toasts; the host renders and dismisses them. Expiry is the
//! host's job (`duration_ms` is a hint), the queue itself never times out.

use std::collections::VecDeque;
use std::fmt;

pub const DEFAULT_TOAST_DURATION_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
            ToastKind::Warning => "warning",
        }
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub duration_ms: u64,
}

#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, kind: ToastKind, message: impl Into<String>, duration_ms: u64) -> u64 {
        self.next_id += 1;
        let toast = Toast {
            id: self.next_id,
            kind,
            message: message.into(),
            duration_ms,
        };
        tracing::debug!(id = toast.id, %kind, message = %toast.message, "toast");
        self.toasts.push_back(toast);
        self.next_id
    }

    pub fn show_success(&mut self, message: impl Into<String>) -> u64 {
        self.show(ToastKind::Success, message, DEFAULT_TOAST_DURATION_MS)
    }

    pub fn show_error(&mut self, message: impl Into<String>) -> u64 {
        self.show(ToastKind::Error, message, DEFAULT_TOAST_DURATION_MS)
    }

    pub fn show_info(&mut self, message: impl Into<String>) -> u64 {
        self.show(ToastKind::Info, message, DEFAULT_TOAST_DURATION_MS)
    }

    pub fn show_warning(&mut self, message: impl Into<String>) -> u64 {
        self.show(ToastKind::Warning, message, DEFAULT_TOAST_DURATION_MS)
    }

    /// Remove one toast. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Take every queued toast, oldest first.
    pub fn drain(&mut self) -> Vec<Toast> {
        self.toasts.drain(..).collect()
    }
}
