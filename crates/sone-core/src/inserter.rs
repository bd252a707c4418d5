//! Background publisher for one Sone
//!
//! A `SoneInserter` runs on its own thread. On every tick it looks at the
//! Sone's modification counter; if the Sone changed since the last
//! successful insert it copies what it needs out under the lock, renders
//! the manifest and publishes it with the lock released.
//!
//! ## Tick
//!
//! 1. `Snapshotting`: lock, read the counter, copy keys and content, unlock.
//!    A zero counter ends the tick.
//! 2. `Inserting`: build the manifest and call the network. No lock held.
//! 3. On success, lock again and reset the counter to zero only if it still
//!    has its snapshot value. A concurrent edit leaves it as is, so the next
//!    tick publishes the newer state.
//! 4. `Idle`: wait for the poll interval or a stop request, whichever comes
//!    first.
//!
//! Failures are logged and retried on the next tick at the same interval.
//! Only a stop request ends the loop; an insert in flight is never
//! interrupted.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{after, bounded, Receiver, Sender, TryRecvError};
use sone_core_types::schema::OP_INSERT_SONE;

use crate::config::{InserterSection, DEFAULT_DOCUMENT, DEFAULT_INSERTION_DELAY_SECS};
use crate::errors::{Result, SoneError};
use crate::freenet::FreenetInterface;
use crate::listener::InsertListener;
use crate::manifest::build_manifest;
use crate::model::{FreenetUri, KeyType, SoneHandle};
use crate::snapshot::InsertSnapshot;
use crate::{log_op_end, log_op_start, log_op_warn};

/// Where a worker currently is in its tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InserterState {
    /// Waiting for the next tick
    Idle = 0,
    /// Holding the Sone's lock to copy out a snapshot
    Snapshotting = 1,
    /// Network call in flight, lock released
    Inserting = 2,
    /// Stop requested or loop exited
    Stopping = 3,
}

impl InserterState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => InserterState::Snapshotting,
            2 => InserterState::Inserting,
            3 => InserterState::Stopping,
            _ => InserterState::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InserterConfig {
    /// Wait between the end of one tick and the start of the next
    pub interval: Duration,
    /// Manifest entry served for the bare key
    pub default_document: String,
}

impl Default for InserterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INSERTION_DELAY_SECS),
            default_document: DEFAULT_DOCUMENT.to_string(),
        }
    }
}

impl From<&InserterSection> for InserterConfig {
    fn from(section: &InserterSection) -> Self {
        Self {
            interval: section.insertion_delay(),
            default_document: section.default_document.clone(),
        }
    }
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// Counter was zero, nothing inserted
    Idle,
    /// Published; `counter_reset` is false if an edit raced the insert
    Inserted {
        final_uri: FreenetUri,
        counter_reset: bool,
    },
    /// Nothing published, counter untouched
    Failed { error: SoneError },
}

pub struct SoneInserter {
    sone: SoneHandle,
    freenet: Arc<dyn FreenetInterface>,
    config: InserterConfig,
    listeners: Vec<Arc<dyn InsertListener>>,
    state: Arc<AtomicU8>,
    consecutive_failures: u32,
}

impl SoneInserter {
    pub fn new(
        sone: SoneHandle,
        freenet: Arc<dyn FreenetInterface>,
        config: InserterConfig,
    ) -> Self {
        Self {
            sone,
            freenet,
            config,
            listeners: Vec::new(),
            state: Arc::new(AtomicU8::new(InserterState::Idle as u8)),
            consecutive_failures: 0,
        }
    }

    pub fn add_listener(&mut self, listener: Arc<dyn InsertListener>) {
        self.listeners.push(listener);
    }

    pub fn sone(&self) -> &SoneHandle {
        &self.sone
    }

    pub fn state(&self) -> InserterState {
        InserterState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Failed ticks since the last successful insert
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Run exactly one tick on the calling thread
    pub fn run_once(&mut self) -> InsertOutcome {
        self.set_state(InserterState::Snapshotting);
        let snapshot = match self.take_snapshot() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::trace!(sone_id = %self.sone.id(), "Sone unchanged, nothing to insert");
                self.set_state(InserterState::Idle);
                return InsertOutcome::Idle;
            }
            Err(error) => {
                self.consecutive_failures += 1;
                tracing::warn!(sone_id = %self.sone.id(), %error, "could not snapshot Sone");
                self.set_state(InserterState::Idle);
                return InsertOutcome::Failed { error };
            }
        };

        self.set_state(InserterState::Inserting);
        let outcome = self.insert(snapshot);
        self.set_state(InserterState::Idle);
        outcome
    }

    /// Spawn the worker thread
    ///
    /// The first tick runs immediately.
    ///
    /// # Errors
    ///
    /// Returns `SoneError::Io` if the thread cannot be spawned.
    pub fn start(self) -> Result<InserterHandle> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let sone_id = self.sone.id().to_string();
        let state = self.state.clone();

        let join = std::thread::Builder::new()
            .name(format!("sone-inserter-{}", self.sone.name()))
            .spawn(move || self.run(stop_rx))?;

        Ok(InserterHandle {
            sone_id,
            stop_tx,
            stop_requested: AtomicBool::new(false),
            state,
            join: Some(join),
        })
    }

    fn run(mut self, stop_rx: Receiver<()>) {
        tracing::debug!(sone_id = %self.sone.id(), "inserter started");
        loop {
            if stop_signalled(&stop_rx) {
                break;
            }

            self.run_once();

            tracing::trace!(
                sone_id = %self.sone.id(),
                interval_ms = self.config.interval.as_millis() as u64,
                "waiting before checking Sone again"
            );
            crossbeam::select! {
                recv(stop_rx) -> _ => break,
                recv(after(self.config.interval)) -> _ => {}
            }
        }
        self.set_state(InserterState::Stopping);
        tracing::debug!(sone_id = %self.sone.id(), "inserter stopped");
    }

    fn take_snapshot(&self) -> Result<Option<InsertSnapshot>> {
        let sone = self.sone.lock()?;
        if sone.modification_counter() == 0 {
            return Ok(None);
        }
        Ok(Some(InsertSnapshot::capture(&sone)))
    }

    fn insert(&mut self, snapshot: InsertSnapshot) -> InsertOutcome {
        let started = Instant::now();
        let sone_id = snapshot.sone_id().to_string();
        let insert_id = snapshot.insert_id.clone();

        log_op_start!(
            OP_INSERT_SONE,
            sone_id = %sone_id,
            insert_id = %insert_id,
            modification_counter = snapshot.modification_counter
        );
        for listener in &self.listeners {
            listener.sone_inserting(&sone_id);
        }

        let insert_uri = snapshot
            .insert_uri
            .expose()
            .clone()
            .with_key_type(KeyType::Usk)
            .with_doc_name(document_name(snapshot.sone_name()))
            .with_suggested_edition(0);

        let result = build_manifest(&snapshot).and_then(|manifest| {
            self.freenet
                .insert_directory(&insert_uri, &manifest, &self.config.default_document)
        });
        let duration = started.elapsed();

        match result {
            Ok(final_uri) => {
                self.consecutive_failures = 0;
                let counter_reset = self.reset_counter(snapshot.modification_counter);
                log_op_end!(
                    OP_INSERT_SONE,
                    duration_ms = duration.as_millis() as u64,
                    sone_id = %sone_id,
                    insert_id = %insert_id,
                    final_uri = %final_uri,
                    counter_reset = counter_reset
                );
                for listener in &self.listeners {
                    listener.sone_inserted(&sone_id, &final_uri, duration);
                }
                InsertOutcome::Inserted {
                    final_uri,
                    counter_reset,
                }
            }
            Err(error) => {
                self.consecutive_failures += 1;
                log_op_warn!(
                    OP_INSERT_SONE,
                    error.clone(),
                    duration_ms = duration.as_millis() as u64,
                    sone_id = %sone_id,
                    insert_id = %insert_id,
                    consecutive_failures = self.consecutive_failures
                );
                for listener in &self.listeners {
                    listener.sone_insert_aborted(&sone_id, &error);
                }
                InsertOutcome::Failed { error }
            }
        }
    }

    /// Clear the counter unless an edit happened since the snapshot
    fn reset_counter(&self, snapshot_counter: u64) -> bool {
        match self.sone.lock() {
            Ok(mut sone) if sone.modification_counter() == snapshot_counter => {
                sone.set_modification_counter(0);
                true
            }
            Ok(sone) => {
                tracing::debug!(
                    sone_id = %self.sone.id(),
                    snapshot_counter,
                    current_counter = sone.modification_counter(),
                    "Sone modified during insert, keeping counter"
                );
                false
            }
            Err(error) => {
                tracing::warn!(sone_id = %self.sone.id(), %error, "could not reset modification counter");
                false
            }
        }
    }

    fn set_state(&self, state: InserterState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Document name a Sone is published under
///
/// Path separators in the name become `-` so the name stays one component.
fn document_name(sone_name: &str) -> String {
    let name: String = sone_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    format!("Sone-{}", name)
}

fn stop_signalled(stop_rx: &Receiver<()>) -> bool {
    match stop_rx.try_recv() {
        Ok(()) | Err(TryRecvError::Disconnected) => true,
        Err(TryRecvError::Empty) => false,
    }
}

/// Control handle for a running inserter
///
/// Dropping the handle stops the worker at its next wait without joining.
pub struct InserterHandle {
    sone_id: String,
    stop_tx: Sender<()>,
    stop_requested: AtomicBool,
    state: Arc<AtomicU8>,
    join: Option<JoinHandle<()>>,
}

impl InserterHandle {
    pub fn sone_id(&self) -> &str {
        &self.sone_id
    }

    pub fn state(&self) -> InserterState {
        if self.stop_requested.load(Ordering::SeqCst) {
            return InserterState::Stopping;
        }
        InserterState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Ask the worker to exit after its current tick
    pub fn request_stop(&self) {
        if !self.stop_requested.swap(true, Ordering::SeqCst) {
            // Capacity 1 and a single sender: only a full channel or a
            // finished worker can refuse the signal, both already stopping.
            let _ = self.stop_tx.try_send(());
        }
    }

    /// Request a stop and wait for the worker thread to exit
    ///
    /// # Errors
    ///
    /// Returns `SoneError::WorkerPanicked` if the worker thread panicked.
    pub fn stop(mut self) -> Result<()> {
        self.request_stop();
        match self.join.take() {
            Some(join) => join.join().map_err(|_| SoneError::WorkerPanicked {
                sone_id: self.sone_id.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for InserterHandle {
    fn drop(&mut self) {
        self.request_stop();
    }
}
