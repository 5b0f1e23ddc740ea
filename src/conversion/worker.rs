/*!
 * Background correction worker.
 *
 * Corrections run on the tokio blocking pool so a long text never stalls the
 * caller. Each submission bumps a generation counter; outcomes travel back
 * over a channel tagged with their generation and only the outcome of the
 * most recent submission is handed to the receiver. Older ones are dropped.
 */

use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::corrector::ProtectedCorrector;
use crate::errors::ConversionError;

/// Result of one background correction
#[derive(Debug)]
pub struct CorrectionOutcome {
    /// Generation assigned at submission
    pub generation: u64,

    /// Corrected text, or the reason the pass failed
    pub result: Result<String, ConversionError>,
}

/// Submits corrections to the blocking pool
#[derive(Debug)]
pub struct CorrectionWorker {
    corrector: Arc<ProtectedCorrector>,
    generation: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<CorrectionOutcome>,
}

/// Receiving end, owned by whoever applies results
#[derive(Debug)]
pub struct CorrectionReceiver {
    rx: mpsc::UnboundedReceiver<CorrectionOutcome>,
    generation: Arc<AtomicU64>,
}

impl CorrectionWorker {
    /// Create a worker and the receiver its outcomes are delivered to
    pub fn new(corrector: ProtectedCorrector) -> (Self, CorrectionReceiver) {
        let generation = Arc::new(AtomicU64::new(0));
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = Self {
            corrector: Arc::new(corrector),
            generation: Arc::clone(&generation),
            tx,
        };
        let receiver = CorrectionReceiver { rx, generation };

        (worker, receiver)
    }

    /// Queue a correction of `text` against an owned snapshot of `words`.
    ///
    /// Returns the generation of this request. Must be called from inside a
    /// tokio runtime.
    pub fn submit(&self, text: String, words: Vec<String>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Submitting correction #{} ({} chars, {} protected words)",
            generation,
            text.chars().count(),
            words.len()
        );

        let corrector = Arc::clone(&self.corrector);
        let handle = tokio::task::spawn_blocking(move || corrector.correct(&text, &words));

        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Correction task #{} did not finish: {}", generation, e);
                    Err(ConversionError::TaskFailed(e.to_string()))
                }
            };
            // The receiver may be gone at shutdown
            let _ = tx.send(CorrectionOutcome { generation, result });
        });

        generation
    }

    /// Mark every in-flight request as stale
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    pub fn corrector(&self) -> &ProtectedCorrector {
        &self.corrector
    }
}

impl CorrectionReceiver {
    /// Wait for the outcome of the most recent submission.
    ///
    /// Stale outcomes that arrive first are discarded. Returns `None` once
    /// the worker is dropped and the channel is drained.
    pub async fn recv_latest(&mut self) -> Option<CorrectionOutcome> {
        while let Some(outcome) = self.rx.recv().await {
            if self.is_current(outcome.generation) {
                return Some(outcome);
            }
            debug!("Dropping stale correction #{}", outcome.generation);
        }
        None
    }

    /// Non-blocking variant: drain what has arrived, keep only a current outcome
    pub fn try_recv_latest(&mut self) -> Option<CorrectionOutcome> {
        let mut latest = None;
        while let Ok(outcome) = self.rx.try_recv() {
            if self.is_current(outcome.generation) {
                latest = Some(outcome);
            } else {
                debug!("Dropping stale correction #{}", outcome.generation);
            }
        }
        latest
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}
