//! Run-scoped cancellation.
//!
//! An interrupt only raises the flag; phases check it at their boundaries and
//! never in the middle of the insert transaction.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use log::warn;

use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `Cancelled` if an interrupt arrived before `phase` starts.
    pub fn checkpoint(&self, phase: &'static str) -> IngestResult<()> {
        if self.is_cancelled() {
            Err(IngestError::Cancelled { phase })
        } else {
            Ok(())
        }
    }

    /// Routes Ctrl+C to this flag. A second interrupt exits immediately;
    /// nothing has been committed at that point, so the destination is left
    /// untouched either way.
    pub fn install_interrupt_handler(&self) -> IngestResult<()> {
        let flag = self.clone();
        ctrlc::set_handler(move || {
            if flag.is_cancelled() {
                eprintln!("\nInterrupted again, exiting.");
                std::process::exit(130);
            }
            flag.cancel();
            warn!("Interrupt received; stopping at the next step (Ctrl+C again to abort now)");
        })
        .map_err(|err| IngestError::config(format!("Installing interrupt handler: {err}")))
    }
}
