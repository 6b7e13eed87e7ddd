//! # linkdial -- connection dispatch for amateur radio data links
//!
//! `linkdial` takes a connection descriptor such as
//! `varahf://LA1B?freq=3585` and turns it into a session: it makes sure the
//! transport's modem is open and configured, tunes the rig (and tunes it
//! back afterwards), waits for a busy channel to clear, dials under a
//! cancellable context, and hands the resulting byte stream to the
//! application's [`Exchange`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use linkdial::{Config, DialerBuilder, RigTable};
//! # use linkdial::{Connection, Exchange};
//! # struct Terminal;
//! # #[async_trait::async_trait]
//! # impl Exchange for Terminal {
//! #     async fn exchange(&self, _c: Connection, _t: &str) -> linkdial::Result<()> { Ok(()) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("linkdial.toml")?;
//!     let rigs = RigTable::connect_rigctld(&config).await;
//!     let dialer = DialerBuilder::new(config, Arc::new(Terminal))
//!         .rigs(Arc::new(rigs))
//!         .build();
//!
//!     // Try VARA first, fall back to telnet.
//!     let ok = dialer
//!         .connect_any(&["varahf://LA1B?freq=3585", "telnet://LA1B"])
//!         .await;
//!     println!("connected: {ok}");
//!     dialer.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                   | Purpose                                          |
//! |-------------------------|--------------------------------------------------|
//! | `linkdial-core`         | Traits, descriptor parser, types, errors         |
//! | `linkdial-transport`    | TCP transport, telnet dialer, `rigctld` client   |
//! | **`linkdial`**          | This crate -- the orchestrator                    |
//!
//! ## Cancellation
//!
//! [`Dialer::start`] runs a connect in its own task and returns an
//! [`AbortHandle`] right away. [`Dialer::abort`] cancels whatever is
//! dialing. Either way the dial returns promptly, the pre-QSY frequency is
//! restored, and the modem handle stays usable.
//!
//! A new connect cancels the one before it and waits for that one's QSX
//! before touching the modem or the rig.
//!
//! ## Status
//!
//! Any [`StatusSink`] can observe dialing changes; a
//! `tokio::sync::broadcast::Sender<DialEvent>` is one:
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::broadcast;
//! use linkdial::{Config, DialEvent, DialerBuilder};
//! # use linkdial::{Connection, Exchange};
//! # struct Terminal;
//! # #[async_trait::async_trait]
//! # impl Exchange for Terminal {
//! #     async fn exchange(&self, _c: Connection, _t: &str) -> linkdial::Result<()> { Ok(()) }
//! # }
//! # async fn example() {
//! let (tx, mut rx) = broadcast::channel(16);
//! let dialer = DialerBuilder::new(Config::default(), Arc::new(Terminal))
//!     .status_sink(Arc::new(tx))
//!     .build();
//! tokio::spawn(async move {
//!     while let Ok(event) = rx.recv().await {
//!         if let DialEvent::DialingStarted { descriptor } = event {
//!             println!("dialing {descriptor}");
//!         }
//!     }
//! });
//! # }
//! ```

pub use linkdial_core::*;

pub mod alias;
pub mod builder;
pub mod busy;
pub mod config;
pub mod dialer;
pub mod event_log;
pub mod profile;
pub mod qsy;
pub mod registry;
pub mod rigs;

pub use alias::{resolve_alias, MAX_ALIAS_DEPTH};
pub use builder::DialerBuilder;
pub use busy::{wait_clear, DEFAULT_BUSY_POLL};
pub use config::Config;
pub use dialer::{AbortHandle, ConnectTask, Dialer, RADIO_ONLY_SUFFIX};
pub use event_log::{JsonLinesEventLog, TracingEventLog};
pub use profile::{profile, DefaultInterface, TransportProfile};
pub use qsy::{qsy, QsxGuard, QsxRevert, QsyTimings};
pub use registry::ModemRegistry;
pub use rigs::RigTable;
