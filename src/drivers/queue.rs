use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::drivers::Sample;
#[derive(Default)]
struct QueueState {
    pending: VecDeque<Sample>,
    latest: Option<Sample>,
}
/// Unbounded hand-off between the reader thread and the foreground tick,
/// plus a slot holding the most recent sample.
///
/// Clones share the same buffer. The lock is only held for the duration of
/// a single push, drain or read.
#[derive(Clone, Default)]
pub struct SampleQueue {
    inner: Arc<Mutex<QueueState>>,
}
impl SampleQueue {
    pub fn new() -> Self {
        Self::default()
    }
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Critical sections never leave the state half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
    pub fn push(&self, sample: Sample) {
        let mut state = self.lock();
        state.latest = Some(sample.clone());
        state.pending.push_back(sample);
    }
    /// Removes and returns every queued sample in arrival order.
    pub fn drain_all(&self) -> Vec<Sample> {
        self.lock().pending.drain(..).collect()
    }
    pub fn latest(&self) -> Option<Sample> {
        self.lock().latest.clone()
    }
}
