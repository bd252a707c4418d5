//! In-memory log capture for tests
//!
//! Inserter workers log from their own named threads, so the capture layer
//! is installed once as the process-wide subscriber and every event records
//! the thread it came from. Tests running in parallel share it and tell
//! their events apart by `sone_id` or by a unique op name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use sone_core_types::schema::{FIELD_EVENT, FIELD_OP, OP_INSERT_SONE};

/// One log event as the capture saw it
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    /// Name of the emitting thread, if it had one
    pub thread: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn op(&self) -> Option<&str> {
        self.field(FIELD_OP)
    }

    pub fn event(&self) -> Option<&str> {
        self.field(FIELD_EVENT)
    }

    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op() == Some(op) && self.event() == Some(event)
    }
}

/// Flattens event fields to strings
///
/// Strings are kept verbatim; everything else goes through `Debug`, which
/// prints numbers and booleans the way `Display` would.
#[derive(Default)]
struct Flatten(BTreeMap<String, String>);

impl Visit for Flatten {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

type Sink = Arc<Mutex<Vec<CapturedEvent>>>;

struct CaptureLayer(Sink);

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut flatten = Flatten::default();
        event.record(&mut flatten);
        let captured = CapturedEvent {
            level: *event.metadata().level(),
            thread: std::thread::current().name().map(str::to_string),
            fields: flatten.0,
        };
        if let Ok(mut sink) = self.0.lock() {
            sink.push(captured);
        }
    }
}

/// Read side of the capture
#[derive(Clone)]
pub struct TestCapture {
    sink: Sink,
}

impl TestCapture {
    /// Everything captured so far, in emission order
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.sink
            .lock()
            .map(|sink| sink.clone())
            .unwrap_or_default()
    }

    pub fn events_for_sone(&self, sone_id: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.field("sone_id") == Some(sone_id))
            .collect()
    }

    /// `insert_sone` events logged for one Sone
    pub fn insert_events(&self, sone_id: &str) -> Vec<CapturedEvent> {
        self.events_for_sone(sone_id)
            .into_iter()
            .filter(|e| e.op() == Some(OP_INSERT_SONE))
            .collect()
    }

    /// First event with the given op and event name
    pub fn find(&self, op: &str, event: &str) -> Option<CapturedEvent> {
        self.events().into_iter().find(|e| e.is(op, event))
    }

    /// # Panics
    ///
    /// Panics if no event has the given op and event name.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        if self.find(op, event).is_none() {
            let seen: Vec<String> = self
                .events()
                .iter()
                .map(|e| format!("{}/{}", e.op().unwrap_or("-"), e.event().unwrap_or("-")))
                .collect();
            panic!("no {}/{} event among {:?}", op, event, seen);
        }
    }
}

static CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture as the global subscriber on first use
///
/// Later calls return the same capture. If some other subscriber was
/// installed first, nothing is captured.
///
/// ```
/// use sone_core::logging_facility::test_capture::init_test_capture;
/// use sone_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_example_op");
/// capture.assert_event_exists("doc_example_op", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    CAPTURE
        .get_or_init(|| {
            let sink = Sink::default();
            tracing_subscriber::registry()
                .with(CaptureLayer(sink.clone()))
                .try_init()
                .ok();
            TestCapture { sink }
        })
        .clone()
}
