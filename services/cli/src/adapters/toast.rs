//! services/cli/src/adapters/toast.rs
//!
//! This module contains the terminal notification adapter, the concrete
//! implementation of the `NotificationSink` port from the `core` crate.
//! Messages are transient status lines, printed to stderr so they never mix
//! with command output meant for piping.

use kivo_core::ports::{NotificationKind, NotificationSink};

/// A notification adapter that prints toast-style messages to stderr.
#[derive(Clone, Default)]
pub struct TerminalToastAdapter;

impl TerminalToastAdapter {
    pub fn new() -> Self {
        Self
    }

    fn prefix(kind: NotificationKind) -> &'static str {
        match kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
            NotificationKind::Loading => "...",
        }
    }
}

impl NotificationSink for TerminalToastAdapter {
    fn notify(&self, message: &str, kind: NotificationKind) {
        eprintln!("[{}] {}", Self::prefix(kind), message);
    }
}
