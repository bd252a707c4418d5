//! Insert lifecycle notifications
//!
//! Listeners are called on the inserter's worker thread without the Sone's
//! lock held. They should return quickly; the next tick waits for them.

use std::time::Duration;

use crate::errors::SoneError;
use crate::model::FreenetUri;

pub trait InsertListener: Send + Sync {
    /// An insert of the Sone is about to start
    fn sone_inserting(&self, _sone_id: &str) {}

    /// The Sone was published at `final_uri`
    fn sone_inserted(&self, _sone_id: &str, _final_uri: &FreenetUri, _duration: Duration) {}

    /// The insert failed and will be retried on the next tick
    fn sone_insert_aborted(&self, _sone_id: &str, _error: &SoneError) {}
}
