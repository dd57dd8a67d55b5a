//! Progress observers and the phase tracker driving them.

use crate::conf::{
    C_MSG_FINALIZE, C_MSG_LOAD, C_MSG_PREPARE, N_PCT_DONE, N_PCT_FINALIZE_START,
    N_PCT_FINALIZE_STEP, N_PCT_LOAD, N_PCT_PREPARE, N_PCT_WRITE_SPAN,
};

/// Receiver of `(percent, message)` progress events.
pub trait ProgressObserver {
    /// Called once per event, in emission order.
    fn on_progress(&mut self, n_percent: u8, message: &str);
}

impl<F> ProgressObserver for F
where
    F: FnMut(u8, &str),
{
    fn on_progress(&mut self, n_percent: u8, message: &str) {
        self(n_percent, message)
    }
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressSilent;

impl ProgressObserver for ProgressSilent {
    fn on_progress(&mut self, _n_percent: u8, _message: &str) {}
}

/// Percent reported after writing vendor `n_idx_vendor` (1-based) of `n_vendors`.
pub fn calculate_vendor_progress(n_idx_vendor: usize, n_vendors: usize) -> u8 {
    if n_vendors == 0 {
        return N_PCT_PREPARE;
    }
    let n_idx = usize::min(n_idx_vendor, n_vendors);
    let n_span = n_idx * N_PCT_WRITE_SPAN as usize / n_vendors;
    N_PCT_PREPARE + n_span as u8
}

/// Phase-aware wrapper that keeps reported progress monotonic and within 0..=100.
pub struct ProgressTracker<'a> {
    observer: &'a mut dyn ProgressObserver,
    n_percent_last: u8,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(observer: &'a mut dyn ProgressObserver) -> Self {
        Self {
            observer,
            n_percent_last: 0,
        }
    }

    /// Last percent delivered to the observer.
    pub fn percent(&self) -> u8 {
        self.n_percent_last
    }

    /// Emit one event, clamped so progress never moves backwards or past 100.
    pub fn emit(&mut self, n_percent: u8, message: &str) {
        let n_percent = u8::min(u8::max(n_percent, self.n_percent_last), N_PCT_DONE);
        self.n_percent_last = n_percent;
        self.observer.on_progress(n_percent, message);
    }

    pub fn start_load(&mut self) {
        self.emit(N_PCT_LOAD, C_MSG_LOAD);
    }

    pub fn start_prepare(&mut self) {
        self.emit(N_PCT_PREPARE, C_MSG_PREPARE);
    }

    pub fn advance_vendor(&mut self, n_idx_vendor: usize, n_vendors: usize) {
        self.emit(
            calculate_vendor_progress(n_idx_vendor, n_vendors),
            &format!("처리 중... ({n_idx_vendor}/{n_vendors} 거래처)"),
        );
    }

    /// Ramp from 80 to 100 in fixed steps.
    pub fn finalize(&mut self) {
        let mut n_percent = N_PCT_FINALIZE_START;
        while n_percent <= N_PCT_DONE {
            self.emit(n_percent, C_MSG_FINALIZE);
            n_percent += N_PCT_FINALIZE_STEP;
        }
    }
}
