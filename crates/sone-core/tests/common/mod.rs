use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, Receiver, Sender};
use sone_core::manifest::SONE_JSON;
use sone_core::model::PublishedSone;
use sone_core::{
    FreenetInterface, FreenetUri, InsertListener, Manifest, Result, Sone, SoneError, SoneHandle,
};

/// Generous upper bound for anything a worker thread should do promptly
#[allow(dead_code)]
pub const WAIT: Duration = Duration::from_secs(5);

/// One call received by the fake network
#[derive(Debug, Clone, PartialEq)]
pub struct InsertCall {
    pub insert_uri: FreenetUri,
    pub default_document: String,
    pub paths: Vec<String>,
    pub published: PublishedSone,
    pub at: Instant,
}

type Responder = dyn Fn(&InsertCall) -> Result<FreenetUri> + Send + Sync;

/// Network fake that reports every call on a channel
///
/// The responder runs on the inserter's thread before the call is reported.
pub struct FakeFreenet {
    responder: Box<Responder>,
    calls: Sender<InsertCall>,
}

#[allow(dead_code)]
impl FakeFreenet {
    pub fn new(
        responder: impl Fn(&InsertCall) -> Result<FreenetUri> + Send + Sync + 'static,
    ) -> (Arc<Self>, Receiver<InsertCall>) {
        let (calls, calls_rx) = unbounded();
        let fake = Arc::new(Self {
            responder: Box::new(responder),
            calls,
        });
        (fake, calls_rx)
    }

    pub fn succeeding() -> (Arc<Self>, Receiver<InsertCall>) {
        Self::new(|call| Ok(final_uri_for(call, 1)))
    }

    pub fn failing() -> (Arc<Self>, Receiver<InsertCall>) {
        Self::new(|_| {
            Err(SoneError::InsertionFailed {
                reason: "node unreachable".to_string(),
            })
        })
    }
}

impl FreenetInterface for FakeFreenet {
    fn insert_directory(
        &self,
        insert_uri: &FreenetUri,
        manifest: &Manifest,
        default_document: &str,
    ) -> Result<FreenetUri> {
        let published = manifest
            .get(SONE_JSON)
            .ok_or_else(|| SoneError::InsertionFailed {
                reason: "manifest without sone.json".to_string(),
            })
            .and_then(|entry| Ok(serde_json::from_slice(&entry.content)?))?;
        let call = InsertCall {
            insert_uri: insert_uri.clone(),
            default_document: default_document.to_string(),
            paths: manifest.entries().map(|(path, _)| path.clone()).collect(),
            published,
            at: Instant::now(),
        };
        let result = (self.responder)(&call);
        let _ = self.calls.send(call);
        result
    }
}

#[allow(dead_code)]
pub fn final_uri_for(call: &InsertCall, edition: u64) -> FreenetUri {
    FreenetUri::parse(&format!(
        "USK@final,key,AQACAAE/{}/{}",
        call.insert_uri.doc_name().unwrap_or("Sone"),
        edition
    ))
    .unwrap()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    Inserting(String),
    Inserted(String, FreenetUri),
    Aborted(String, SoneError),
}

/// Listener forwarding every callback to a channel
pub struct ChannelListener {
    events: Sender<ListenerEvent>,
}

#[allow(dead_code)]
impl ChannelListener {
    pub fn new() -> (Arc<Self>, Receiver<ListenerEvent>) {
        let (events, events_rx) = unbounded();
        (Arc::new(Self { events }), events_rx)
    }
}

impl InsertListener for ChannelListener {
    fn sone_inserting(&self, sone_id: &str) {
        let _ = self.events.send(ListenerEvent::Inserting(sone_id.to_string()));
    }

    fn sone_inserted(&self, sone_id: &str, final_uri: &FreenetUri, _duration: Duration) {
        let _ = self
            .events
            .send(ListenerEvent::Inserted(sone_id.to_string(), final_uri.clone()));
    }

    fn sone_insert_aborted(&self, sone_id: &str, error: &SoneError) {
        let _ = self
            .events
            .send(ListenerEvent::Aborted(sone_id.to_string(), error.clone()));
    }
}

/// Wait for the next event that ends an insert attempt
#[allow(dead_code)]
pub fn next_completion(events: &Receiver<ListenerEvent>) -> ListenerEvent {
    loop {
        let event = events
            .recv_timeout(WAIT)
            .expect("inserter did not finish an attempt in time");
        if !matches!(event, ListenerEvent::Inserting(_)) {
            return event;
        }
    }
}

/// An unmodified Sone with the given id and name
#[allow(dead_code)]
pub fn test_sone(id: &str, name: &str) -> Sone {
    Sone::new(
        id,
        name,
        FreenetUri::parse(&format!("USK@{}-public,key,AQACAAE/Sone/0", id)).unwrap(),
        FreenetUri::parse(&format!("SSK@{}-private,key,AQECAAE/", id)).unwrap(),
    )
}

/// A shared Sone whose modification counter is already `counter`
#[allow(dead_code)]
pub fn modified_handle(id: &str, name: &str, counter: u64) -> SoneHandle {
    let mut sone = test_sone(id, name);
    sone.set_modification_counter(counter);
    SoneHandle::new(sone)
}
