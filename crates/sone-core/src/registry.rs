//! One supervised inserter per tracked Sone

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use sone_core_types::schema::{OP_ADD_SONE, OP_REMOVE_SONE};

use crate::errors::{Result, SoneError};
use crate::freenet::FreenetInterface;
use crate::inserter::{InserterConfig, InserterHandle, SoneInserter};
use crate::listener::InsertListener;
use crate::model::SoneHandle;
use crate::options::{DefaultOption, Options, INSERTION_DELAY};
use crate::{log_op_end, log_op_error, log_op_start};

pub struct InserterRegistry {
    freenet: Arc<dyn FreenetInterface>,
    insertion_delay: Arc<DefaultOption<u64>>,
    default_document: String,
    listeners: Vec<Arc<dyn InsertListener>>,
    inserters: Mutex<BTreeMap<String, InserterHandle>>,
}

impl InserterRegistry {
    /// Create an empty registry
    ///
    /// # Errors
    ///
    /// Returns `SoneError::UnknownOption` if `options` has no
    /// `InsertionDelay` option.
    pub fn new(
        freenet: Arc<dyn FreenetInterface>,
        options: &Options,
        default_document: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            freenet,
            insertion_delay: options.integer_option(INSERTION_DELAY)?,
            default_document: default_document.into(),
            listeners: Vec::new(),
            inserters: Mutex::new(BTreeMap::new()),
        })
    }

    /// Attach `listener` to every inserter started after this call
    pub fn add_listener(&mut self, listener: Arc<dyn InsertListener>) {
        self.listeners.push(listener);
    }

    /// Start publishing a Sone
    ///
    /// # Errors
    ///
    /// Returns `SoneError::SoneAlreadyTracked` if the Sone already has an
    /// inserter, or `SoneError::Io` if the worker cannot be spawned.
    pub fn add_sone(&self, sone: SoneHandle) -> Result<()> {
        let start = Instant::now();
        let sone_id = sone.id().to_string();
        log_op_start!(OP_ADD_SONE, sone_id = %sone_id);

        let result = self.spawn(sone);
        match &result {
            Ok(()) => {
                log_op_end!(
                    OP_ADD_SONE,
                    duration_ms = start.elapsed().as_millis() as u64,
                    sone_id = %sone_id
                );
            }
            Err(err) => {
                log_op_error!(
                    OP_ADD_SONE,
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    sone_id = %sone_id
                );
            }
        }
        result
    }

    fn spawn(&self, sone: SoneHandle) -> Result<()> {
        let mut inserters = self.inserters()?;
        if inserters.contains_key(sone.id()) {
            return Err(SoneError::SoneAlreadyTracked {
                sone_id: sone.id().to_string(),
            });
        }

        let config = InserterConfig {
            interval: Duration::from_secs(self.insertion_delay.get()),
            default_document: self.default_document.clone(),
        };
        let sone_id = sone.id().to_string();
        let mut inserter = SoneInserter::new(sone, self.freenet.clone(), config);
        for listener in &self.listeners {
            inserter.add_listener(listener.clone());
        }
        inserters.insert(sone_id, inserter.start()?);
        Ok(())
    }

    /// Stop a Sone's inserter and wait for it to exit
    ///
    /// An insert in flight runs to completion first.
    ///
    /// # Errors
    ///
    /// Returns `SoneError::SoneNotFound` if the Sone is not tracked, or
    /// `SoneError::WorkerPanicked` if its worker panicked.
    pub fn remove_sone(&self, sone_id: &str) -> Result<()> {
        let start = Instant::now();
        log_op_start!(OP_REMOVE_SONE, sone_id = %sone_id);

        // Joined outside the registry lock so other Sones stay manageable.
        let removed = self.inserters()?.remove(sone_id);
        let result = match removed {
            Some(handle) => handle.stop(),
            None => Err(SoneError::SoneNotFound {
                sone_id: sone_id.to_string(),
            }),
        };

        match &result {
            Ok(()) => {
                log_op_end!(
                    OP_REMOVE_SONE,
                    duration_ms = start.elapsed().as_millis() as u64,
                    sone_id = %sone_id
                );
            }
            Err(err) => {
                log_op_error!(
                    OP_REMOVE_SONE,
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    sone_id = %sone_id
                );
            }
        }
        result
    }

    pub fn is_tracked(&self, sone_id: &str) -> bool {
        self.inserters()
            .map(|inserters| inserters.contains_key(sone_id))
            .unwrap_or(false)
    }

    /// Tracked Sone IDs in ascending order
    pub fn tracked_ids(&self) -> Vec<String> {
        self.inserters()
            .map(|inserters| inserters.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Stop every inserter and wait for all of them
    ///
    /// All workers are signalled before the first join, so they wind down
    /// in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first `SoneError::WorkerPanicked` seen; remaining
    /// workers are still joined.
    pub fn stop_all(&self) -> Result<()> {
        let drained = std::mem::take(&mut *self.inserters()?);
        for handle in drained.values() {
            handle.request_stop();
        }

        let mut first_error = None;
        for (sone_id, handle) in drained {
            if let Err(err) = handle.stop() {
                tracing::error!(sone_id = %sone_id, error = %err, "inserter did not stop cleanly");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn inserters(&self) -> Result<MutexGuard<'_, BTreeMap<String, InserterHandle>>> {
        self.inserters.lock().map_err(|_| SoneError::LockPoisoned {
            what: "inserter registry".to_string(),
        })
    }
}

impl Drop for InserterRegistry {
    fn drop(&mut self) {
        if let Err(err) = self.stop_all() {
            tracing::warn!(error = %err, "error stopping inserters on shutdown");
        }
    }
}
