//! Toast notifications and the shared loading flag.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_TOASTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

#[derive(Debug, Clone)]
pub struct Feedback {
    toasts: VecDeque<Toast>,
    ttl: Duration,
    loading: bool,
}

impl Feedback {
    pub fn new(ttl: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            ttl,
            loading: false,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message.into(), ToastKind::Success, Instant::now());
    }

    pub fn danger(&mut self, message: impl Into<String>) {
        self.push(message.into(), ToastKind::Danger, Instant::now());
    }

    pub fn push(&mut self, message: String, kind: ToastKind, now: Instant) {
        if self.toasts.len() == MAX_TOASTS {
            self.toasts.pop_front();
        }
        self.toasts.push_back(Toast {
            message,
            kind,
            shown_at: now,
        });
    }

    /// Drops toasts older than the configured lifetime.
    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.toasts
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < ttl);
    }

    pub fn toasts(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.back()
    }

    /// Last writer wins: concurrent operations may hide each other's indicator.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
