use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use run_core::GeoPosition;

use super::{AcquisitionError, GeoSampler, SampleEvent, SampleStream, WatchOptions};

type Slot = Arc<Mutex<Option<mpsc::UnboundedSender<SampleEvent>>>>;

// Slots hold no invariant a panicking holder could break.
fn lock<T>(mutex: &Arc<Mutex<T>>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sampler fed by an external platform layer through a [`FixSender`].
pub struct ChannelSampler {
    slot: Slot,
    options: Arc<Mutex<Option<WatchOptions>>>,
}

impl ChannelSampler {
    pub fn new() -> (Self, FixSender) {
        let slot: Slot = Arc::new(Mutex::new(None));
        let options = Arc::new(Mutex::new(None));
        let sender = FixSender {
            slot: Arc::clone(&slot),
            options: Arc::clone(&options),
        };
        (Self { slot, options }, sender)
    }
}

impl GeoSampler for ChannelSampler {
    fn start(&mut self, options: &WatchOptions) -> Result<SampleStream, AcquisitionError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.slot) = Some(tx);
        *lock(&self.options) = Some(*options);
        Ok(rx)
    }

    fn stop(&mut self) {
        lock(&self.slot).take();
        lock(&self.options).take();
    }
}

/// Platform-side handle pushing fixes into the active watch.
#[derive(Clone)]
pub struct FixSender {
    slot: Slot,
    options: Arc<Mutex<Option<WatchOptions>>>,
}

impl FixSender {
    /// Pushes a fix. Returns `false` when no watch is active.
    pub fn send_fix(&self, position: GeoPosition) -> bool {
        self.send(SampleEvent::Fix(position))
    }

    /// Pushes an acquisition failure. Returns `false` when no watch is active.
    pub fn send_error(&self, error: AcquisitionError) -> bool {
        self.send(SampleEvent::Error(error))
    }

    pub fn is_watching(&self) -> bool {
        lock(&self.slot).as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Options of the active watch, for configuring the platform service.
    pub fn watch_options(&self) -> Option<WatchOptions> {
        *lock(&self.options)
    }

    fn send(&self, event: SampleEvent) -> bool {
        match lock(&self.slot).as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => {
                tracing::trace!("Dropping location event: no active watch");
                false
            }
        }
    }
}
