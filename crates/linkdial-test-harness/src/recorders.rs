//! Recording implementations of the orchestrator's outward collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use linkdial_core::descriptor::ConnectionDescriptor;
use linkdial_core::error::{Error, Result};
use linkdial_core::events::{ConnRecord, EventLog, StatusSink};
use linkdial_core::exchange::Exchange;
use linkdial_core::modem::Connection;

/// Records every "currently dialing" change as the rendered descriptor
/// (`None` when dialing ends).
#[derive(Debug, Default)]
pub struct RecordingStatus {
    changes: Mutex<Vec<Option<String>>>,
}

impl RecordingStatus {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All changes so far.
    pub fn changes(&self) -> Vec<Option<String>> {
        self.changes.lock().unwrap().clone()
    }

    /// The most recent value, `None` if idle or never notified.
    pub fn current(&self) -> Option<String> {
        self.changes.lock().unwrap().last().cloned().flatten()
    }
}

impl StatusSink for RecordingStatus {
    fn dialing_changed(&self, dialing: Option<&ConnectionDescriptor>) {
        self.changes
            .lock()
            .unwrap()
            .push(dialing.map(ToString::to_string));
    }
}

/// Keeps every connection record.
#[derive(Debug, Default)]
pub struct RecordingEventLog {
    records: Mutex<Vec<ConnRecord>>,
}

impl RecordingEventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records so far.
    pub fn records(&self) -> Vec<ConnRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl EventLog for RecordingEventLog {
    fn log_conn(&self, record: &ConnRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

/// An exchange that records targets and succeeds unless told to fail.
#[derive(Debug, Default)]
pub struct RecordingExchange {
    targets: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingExchange {
    /// Create an exchange that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent exchanges fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Targets exchanged with, in order.
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Exchange for RecordingExchange {
    async fn exchange(&self, conn: Connection, target: &str) -> Result<()> {
        self.targets.lock().unwrap().push(target.to_string());
        drop(conn);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Protocol("exchange aborted by remote".into()));
        }
        Ok(())
    }
}
