use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::common::Frame;
use crate::error::CaptureError;

/// Two frame slots plus an atomic active-slot indicator.
///
/// Writers always fill the inactive slot and then flip the indicator, so the
/// slot a reader copies from is never the slot being written. Both slots are
/// eagerly initialized at construction; `ready` distinguishes the pre-first-
/// capture state instead of an uninitialized-slot special case.
pub struct DoubleBuffer {
    slots: [Mutex<Frame>; 2],
    active: AtomicUsize,
    ready: AtomicBool,
}

impl DoubleBuffer {
    pub fn new(initial: Frame) -> Self {
        Self {
            slots: [Mutex::new(initial.clone()), Mutex::new(initial)],
            active: AtomicUsize::new(0),
            ready: AtomicBool::new(false),
        }
    }

    /// Publish a completed capture: write the inactive slot, then flip.
    /// Single-writer discipline; the critical section covers only the slot
    /// assignment.
    pub fn publish(&self, frame: Frame) {
        let write = self.active.load(Ordering::Acquire) ^ 1;
        {
            let mut slot = self.slots[write].lock().unwrap();
            *slot = frame;
        }
        self.active.store(write, Ordering::Release);
        self.ready.store(true, Ordering::Release);
    }

    /// Owned copy of the most recently published frame. Never blocks longer
    /// than the copy itself.
    pub fn latest(&self) -> Result<Frame, CaptureError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(CaptureError::NotReady);
        }
        let read = self.active.load(Ordering::Acquire);
        Ok(self.slots[read].lock().unwrap().clone())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Drop the retained pixel payloads and return to the not-ready state.
    /// Idempotent; called from `stop()`.
    pub fn release(&self) {
        self.ready.store(false, Ordering::Release);
        for slot in &self.slots {
            *slot.lock().unwrap() = Frame::blank(1, 1);
        }
    }
}
