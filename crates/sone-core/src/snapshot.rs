//! Point-in-time copy of a Sone taken for one insert attempt
//!
//! The copy is made while holding the Sone's lock and owned by the worker
//! iteration that took it; everything after that (manifest rendering, the
//! network call) works on the copy with the lock released.

use sone_core_types::{InsertId, Sensitive};

use crate::model::{FreenetUri, PublishedSone, Sone};

#[derive(Debug, Clone)]
pub struct InsertSnapshot {
    /// Correlates the log events and callbacks of this attempt
    pub insert_id: InsertId,
    /// Counter value at snapshot time, compared again after the insert
    pub modification_counter: u64,
    pub request_uri: FreenetUri,
    pub insert_uri: Sensitive<FreenetUri>,
    pub content: PublishedSone,
}

impl InsertSnapshot {
    /// Copy everything an insert needs out of a locked Sone
    pub fn capture(sone: &Sone) -> Self {
        Self {
            insert_id: InsertId::new(),
            modification_counter: sone.modification_counter(),
            request_uri: sone.request_uri().clone(),
            insert_uri: sone.insert_uri().clone(),
            content: sone.to_published(),
        }
    }

    pub fn sone_id(&self) -> &str {
        &self.content.id
    }

    pub fn sone_name(&self) -> &str {
        &self.content.name
    }
}
