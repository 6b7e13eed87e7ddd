//! Dial status notifications and connection event records.
//!
//! Status changes are pushed to a [`StatusSink`] whenever the "currently
//! dialing" value changes. A [`tokio::sync::broadcast::Sender`] is a ready
//! sink: presentation layers subscribe and slow consumers simply lag.
//!
//! Every dial attempt produces exactly one [`ConnRecord`] for the
//! [`EventLog`].

use tokio::sync::broadcast;

use crate::descriptor::ConnectionDescriptor;
use crate::types::Frequency;

/// A change in the orchestrator's dialing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialEvent {
    /// A dial has begun.
    DialingStarted {
        /// The descriptor being dialed, with defaults applied.
        descriptor: ConnectionDescriptor,
    },
    /// No dial is in flight any more.
    DialingEnded,
}

/// Push-style receiver of dialing state changes.
///
/// Implementations must not block; they are called from the dial path.
pub trait StatusSink: Send + Sync {
    /// The "currently dialing" value changed to `dialing`.
    fn dialing_changed(&self, dialing: Option<&ConnectionDescriptor>);
}

impl StatusSink for broadcast::Sender<DialEvent> {
    fn dialing_changed(&self, dialing: Option<&ConnectionDescriptor>) {
        let event = match dialing {
            Some(descriptor) => DialEvent::DialingStarted {
                descriptor: descriptor.clone(),
            },
            None => DialEvent::DialingEnded,
        };
        // No subscribers is fine.
        let _ = self.send(event);
    }
}

/// A sink that discards status changes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn dialing_changed(&self, _dialing: Option<&ConnectionDescriptor>) {}
}

/// How a dial attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnOutcome {
    /// A byte stream was established.
    Connected {
        /// Remote address reported by the transport.
        remote: String,
    },
    /// The operator aborted the dial.
    Cancelled,
    /// The dial failed.
    Failed {
        /// The error message.
        error: String,
    },
}

/// One record per dial attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnRecord {
    /// The descriptor string as requested (after alias resolution).
    pub descriptor: String,
    /// Rig frequency at the time of the attempt, if known.
    pub frequency: Option<Frequency>,
    /// The result.
    pub outcome: ConnOutcome,
}

/// Write-only, best-effort log of connection attempts.
pub trait EventLog: Send + Sync {
    /// Record one attempt. Failures are the implementation's to swallow.
    fn log_conn(&self, record: &ConnRecord);
}
