//! Progress reporting (§4.6): an optional sink the Orchestrator notifies
//! once per piece. Absence is tolerated everywhere it's consumed.

/// One progress notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Machine-readable step identifier, e.g. `"generating_checksheet_chunk_3"`.
    pub step: String,
    /// Overall progress, `0..=100`.
    pub progress: u8,
    /// Human-readable message suitable for terminal display.
    pub message: String,
}

/// Receives [`ProgressEvent`]s as a generation proceeds.
pub trait ProgressSink: Send + Sync {
    /// Called once per piece as the Orchestrator works through a generation.
    fn on_progress(&self, event: ProgressEvent);
}

/// Maps piece `index` of `total` onto the `[low, high]` progress range
/// linearly, per §4.6 (work instructions uses `[10, 60]`, checksheets use
/// `[10, 40]`).
#[must_use]
pub fn piece_progress(index: usize, total: usize, low: u8, high: u8) -> u8 {
    if total <= 1 {
        return high;
    }
    let span = f64::from(high - low);
    let fraction = index as f64 / (total - 1) as f64;
    (f64::from(low) + span * fraction).round() as u8
}

/// A recording sink for tests: captures every event in order.
#[derive(Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of events recorded so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }
}
