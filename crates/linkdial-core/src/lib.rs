//! linkdial-core: Core traits, types, and error definitions for linkdial.
//!
//! This crate defines the transport-agnostic abstractions the dial
//! orchestrator is written against. Modem backends, rig-control clients,
//! and session exchanges depend on these types without pulling in the
//! orchestrator.
//!
//! # Key types
//!
//! - [`ConnectionDescriptor`] -- a parsed `scheme://...` connection target
//! - [`Modem`] / [`ModemFactory`] -- per-scheme modem handles
//! - [`Rig`] / [`RigLookup`] -- frequency and PTT control
//! - [`StatusSink`] / [`EventLog`] / [`Exchange`] -- outward collaborators
//! - [`Error`] / [`Result`] -- error handling

pub mod descriptor;
pub mod error;
pub mod events;
pub mod exchange;
pub mod helpers;
pub mod modem;
pub mod rig;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use linkdial_core::*`.
pub use descriptor::{ConnectionDescriptor, Params};
pub use error::{Error, Result};
pub use events::{ConnOutcome, ConnRecord, DialEvent, EventLog, NullStatus, StatusSink};
pub use exchange::Exchange;
pub use helpers::{has_ssid, parse_bool};
pub use modem::{BusyChannel, Connection, LinkStream, Modem, ModemFactory, ModemSettings};
pub use rig::{Rig, RigBinding, RigLookup};
pub use transport::Transport;
pub use types::{Frequency, Scheme};
