//! [`EventLog`] sinks: one through `tracing`, one appending JSON lines.

use std::io::Write;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use linkdial_core::events::{ConnOutcome, ConnRecord, EventLog};
use serde::Serialize;
use tracing::{info, warn};

/// Emits each connection record as an `info` event with target `linkdial::events`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn log_conn(&self, record: &ConnRecord) {
        let freq = record.frequency.map(|f| f.to_string());
        match &record.outcome {
            ConnOutcome::Connected { remote } => info!(
                target: "linkdial::events",
                descriptor = %record.descriptor,
                freq = freq.as_deref(),
                %remote,
                "connect"
            ),
            ConnOutcome::Cancelled => info!(
                target: "linkdial::events",
                descriptor = %record.descriptor,
                freq = freq.as_deref(),
                "connect cancelled"
            ),
            ConnOutcome::Failed { error } => info!(
                target: "linkdial::events",
                descriptor = %record.descriptor,
                freq = freq.as_deref(),
                %error,
                "connect failed"
            ),
        }
    }
}

#[derive(Serialize)]
struct Line<'a> {
    event: &'static str,
    time: u64,
    descriptor: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    freq_khz: Option<f64>,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> Line<'a> {
    fn new(record: &'a ConnRecord) -> Self {
        let (outcome, remote, error) = match &record.outcome {
            ConnOutcome::Connected { remote } => ("connected", Some(remote.as_str()), None),
            ConnOutcome::Cancelled => ("cancelled", None, None),
            ConnOutcome::Failed { error } => ("failed", None, Some(error.as_str())),
        };
        Line {
            event: "connect",
            time: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            descriptor: &record.descriptor,
            freq_khz: record.frequency.map(|f| f.khz()),
            outcome,
            remote,
            error,
        }
    }
}

/// Appends one JSON object per connection attempt to a writer.
///
/// ```json
/// {"event":"connect","time":1700000000,"descriptor":"ardop://LA1B?freq=3585","freq_khz":7101.0,"outcome":"connected","remote":"LA1B"}
/// ```
///
/// Write errors are logged and otherwise ignored.
pub struct JsonLinesEventLog<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesEventLog<W> {
    /// Log to `out`.
    pub fn new(out: W) -> Self {
        JsonLinesEventLog {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> EventLog for JsonLinesEventLog<W> {
    fn log_conn(&self, record: &ConnRecord) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let result = serde_json::to_writer(&mut *out, &Line::new(record))
            .map_err(std::io::Error::from)
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush());
        if let Err(e) = result {
            warn!(error = %e, "Unable to write event log");
        }
    }
}
