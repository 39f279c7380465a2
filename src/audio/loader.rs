//! One-shot readiness signal for background asset loading.

use crate::error::{PianoError, Result};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::{error, info};

/// Result of a load running on a background thread.
///
/// [`poll`](Readiness::poll) hands out the loaded value at most once. If the
/// load fails, the error is logged and no value ever arrives. Nothing is
/// retried.
pub struct Readiness<T> {
    rx: Option<Receiver<Result<T>>>,
}

impl<T: Send + 'static> Readiness<T> {
    /// Runs `load` on a new thread.
    pub fn spawn<F>(load: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("sample-loader".into())
            .spawn(move || {
                // The receiver may be gone if the app quit while loading
                let _ = tx.send(load());
            });

        match spawned {
            Ok(_) => Self { rx: Some(rx) },
            Err(e) => {
                error!("failed to spawn sample loader: {}", e);
                Self { rx: None }
            }
        }
    }
}

impl<T> Readiness<T> {
    /// Returns the loaded value the first time it is available.
    pub fn poll(&mut self) -> Option<T> {
        let rx = self.rx.as_ref()?;
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(PianoError::LoaderStopped),
        };
        self.rx = None;

        match outcome {
            Ok(value) => {
                info!("samples loaded");
                Some(value)
            }
            Err(e) => {
                error!("sample loading failed: {}", e);
                None
            }
        }
    }

    /// Whether a result may still arrive.
    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn poll_until_settled<T>(readiness: &mut Readiness<T>) -> Option<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while readiness.is_pending() && Instant::now() < deadline {
            if let Some(value) = readiness.poll() {
                return Some(value);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_resolves_once() {
        let mut readiness = Readiness::spawn(|| Ok(42));
        assert_eq!(poll_until_settled(&mut readiness), Some(42));
        assert!(!readiness.is_pending());
        assert_eq!(readiness.poll(), None);
    }

    #[test]
    fn test_failed_load_never_resolves() {
        let mut readiness: Readiness<u32> = Readiness::spawn(|| Err(PianoError::NoSoundFont));
        assert_eq!(poll_until_settled(&mut readiness), None);
        assert!(!readiness.is_pending());
        assert_eq!(readiness.poll(), None);
    }
}
