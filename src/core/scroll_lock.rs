use crate::domain::ports::ScrollSurface;
use std::sync::{Arc, Mutex};

/// Reference-counted scroll lock shared by every overlay that needs one.
///
/// The surface is locked on the first acquire and unlocked when the last
/// guard drops. Transitions happen under the counter's mutex.
pub struct ScrollLock {
    depth: Mutex<usize>,
    surface: Arc<dyn ScrollSurface>,
}

impl ScrollLock {
    pub fn new(surface: Arc<dyn ScrollSurface>) -> Arc<Self> {
        Arc::new(Self {
            depth: Mutex::new(0),
            surface,
        })
    }

    #[must_use = "the lock is released as soon as the guard is dropped"]
    pub fn acquire(self: &Arc<Self>) -> ScrollLockGuard {
        let mut depth = self.depth.lock().unwrap_or_else(|e| e.into_inner());
        *depth += 1;
        if *depth == 1 {
            tracing::debug!("Scroll lock engaged");
            self.surface.set_locked(true);
        }

        ScrollLockGuard {
            lock: Arc::clone(self),
        }
    }

    pub fn depth(&self) -> usize {
        *self.depth.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_locked(&self) -> bool {
        self.depth() > 0
    }

    fn release(&self) {
        let mut depth = self.depth.lock().unwrap_or_else(|e| e.into_inner());
        *depth = depth.saturating_sub(1);
        if *depth == 0 {
            tracing::debug!("Scroll lock released");
            self.surface.set_locked(false);
        }
    }
}

pub struct ScrollLockGuard {
    lock: Arc<ScrollLock>,
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollExtent {
    pub offset: f64,
    pub viewport: f64,
    pub content: f64,
}

impl ScrollExtent {
    pub fn max_offset(&self) -> f64 {
        (self.content - self.viewport).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSplit {
    pub inner: f64,
    pub outer: f64,
}

/// Splits a wheel delta between a nested scroll container and the page.
pub struct WheelChain;

impl WheelChain {
    pub fn split(extent: ScrollExtent, delta: f64, page_locked: bool) -> ScrollSplit {
        let offset = extent.offset.clamp(0.0, extent.max_offset());

        let inner = if delta > 0.0 {
            delta.min(extent.max_offset() - offset)
        } else {
            delta.max(-offset)
        };

        // 內層捲到底後，剩餘量交給外層；頁面鎖定時直接丟棄
        let remainder = delta - inner;
        let outer = if page_locked { 0.0 } else { remainder };

        ScrollSplit { inner, outer }
    }
}
