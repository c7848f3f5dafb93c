//! Per-segment live state shared between a worker and observers.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;

use crate::segmenter::Segment;

/// Lifecycle of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SegmentState {
    Pending = 0,
    Running = 1,
    Succeeded = 2,
    Failed = 3,
}

impl SegmentState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => SegmentState::Running,
            2 => SegmentState::Succeeded,
            3 => SegmentState::Failed,
            _ => SegmentState::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SegmentState::Succeeded | SegmentState::Failed)
    }
}

/// Progress counter and terminal state for one segment. Only the worker that
/// owns the segment mutates it; anyone may read it at any time.
#[derive(Debug)]
pub struct SegmentTracker {
    segment: Segment,
    transferred: AtomicU64,
    state: AtomicU8,
    error: Mutex<Option<String>>,
}

impl SegmentTracker {
    pub fn new(segment: Segment) -> Self {
        Self {
            segment,
            transferred: AtomicU64::new(0),
            state: AtomicU8::new(SegmentState::Pending as u8),
            error: Mutex::new(None),
        }
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    /// Bytes written to the output file so far.
    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SegmentState {
        SegmentState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Error message recorded when the segment failed.
    pub fn error(&self) -> Option<String> {
        self.error.lock().ok().and_then(|e| e.clone())
    }

    /// Adds `n` freshly written bytes. Saturates at the segment length.
    pub(crate) fn add_transferred(&self, n: u64) {
        let cap = self.segment.len();
        let _ = self
            .transferred
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                Some(cur.saturating_add(n).min(cap))
            });
    }

    pub(crate) fn mark_running(&self) {
        self.state.store(SegmentState::Running as u8, Ordering::Release);
    }

    pub(crate) fn mark_succeeded(&self) {
        self.state.store(SegmentState::Succeeded as u8, Ordering::Release);
    }

    pub(crate) fn mark_failed(&self, message: String) {
        if let Ok(mut e) = self.error.lock() {
            *e = Some(message);
        }
        self.state.store(SegmentState::Failed as u8, Ordering::Release);
    }
}
