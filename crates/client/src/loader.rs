// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transient loading indicator hooks.
//!
//! Best effort: a tagged request shows the indicator and hides it exactly
//! once, on response or after a fixed timeout, whichever comes first.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// UI capability toggled by tagged requests.
pub trait LoaderSignal: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Loader that ignores every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLoader;

impl LoaderSignal for NoopLoader {
    fn show(&self) {}
    fn hide(&self) {}
}

/// Counts outstanding `show()`s; visible while the count is non-zero.
#[derive(Debug, Default)]
pub struct CountingLoader {
    depth: AtomicU32,
    shown: AtomicU32,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.depth() > 0
    }

    pub fn depth(&self) -> u32 {
        self.depth.load(Ordering::Acquire)
    }

    /// Total `show()` calls observed.
    pub fn shown(&self) -> u32 {
        self.shown.load(Ordering::Acquire)
    }
}

impl LoaderSignal for CountingLoader {
    fn show(&self) {
        self.shown.fetch_add(1, Ordering::AcqRel);
        self.depth.fetch_add(1, Ordering::AcqRel);
    }

    fn hide(&self) {
        // Saturate at zero; a stray hide never underflows.
        let _ = self
            .depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| Some(d.saturating_sub(1)));
    }
}

/// One request's hold on the loader.
///
/// Shows on creation; hides on [`finish`](Self::finish), on drop, or when the
/// timeout elapses, and never more than once.
pub struct LoaderTicket {
    signal: Arc<dyn LoaderSignal>,
    done: Arc<AtomicBool>,
}

impl LoaderTicket {
    /// Show the loader and arm the unconditional hide after `timeout`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(signal: Arc<dyn LoaderSignal>, timeout: Duration) -> Self {
        signal.show();
        let done = Arc::new(AtomicBool::new(false));
        {
            let signal = Arc::clone(&signal);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if !done.swap(true, Ordering::AcqRel) {
                    tracing::debug!(?timeout, "loader timed out before the response");
                    signal.hide();
                }
            });
        }
        Self { signal, done }
    }

    /// Response arrived (success or error).
    pub fn finish(self) {
        drop(self);
    }

    fn release(&self) {
        if !self.done.swap(true, Ordering::AcqRel) {
            self.signal.hide();
        }
    }
}

impl Drop for LoaderTicket {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
