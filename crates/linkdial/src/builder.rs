//! DialerBuilder -- fluent builder for constructing [`Dialer`] instances.
//!
//! Only the configuration and the exchange are required. Everything else
//! has a working default: network-only modems, a rig table with the
//! configured bindings but no rigs loaded, no status sink, and a
//! `tracing` event log.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use linkdial::{Config, DialerBuilder, RigTable};
//! # use linkdial::{Connection, Exchange};
//! # struct Terminal;
//! # #[async_trait::async_trait]
//! # impl Exchange for Terminal {
//! #     async fn exchange(&self, _c: Connection, _t: &str) -> linkdial::Result<()> { Ok(()) }
//! # }
//!
//! # async fn example() -> linkdial::Result<()> {
//! let config = Config::load("linkdial.toml")?;
//! let rigs = RigTable::connect_rigctld(&config).await;
//! let dialer = DialerBuilder::new(config, Arc::new(Terminal))
//!     .rigs(Arc::new(rigs))
//!     .busy_poll(Duration::from_millis(500))
//!     .build();
//! dialer.connect("telnet://LA1B").await;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use linkdial_core::events::{EventLog, NullStatus, StatusSink};
use linkdial_core::exchange::Exchange;
use linkdial_core::modem::ModemFactory;
use linkdial_core::rig::RigLookup;
use linkdial_transport::NetworkModems;
use tokio::sync::Mutex as AsyncMutex;

use crate::busy::DEFAULT_BUSY_POLL;
use crate::config::Config;
use crate::dialer::Dialer;
use crate::event_log::TracingEventLog;
use crate::qsy::QsyTimings;
use crate::registry::ModemRegistry;
use crate::rigs::RigTable;

/// Fluent builder for [`Dialer`].
pub struct DialerBuilder {
    config: Config,
    exchange: Arc<dyn Exchange>,
    modems: Option<Arc<dyn ModemFactory>>,
    rigs: Option<Arc<dyn RigLookup>>,
    status: Arc<dyn StatusSink>,
    events: Arc<dyn EventLog>,
    qsy: QsyTimings,
    busy_poll: Duration,
}

impl DialerBuilder {
    /// Create a builder for a dialer that hands connections to `exchange`.
    pub fn new(config: Config, exchange: Arc<dyn Exchange>) -> Self {
        DialerBuilder {
            config,
            exchange,
            modems: None,
            rigs: None,
            status: Arc::new(NullStatus),
            events: Arc::new(TracingEventLog),
            qsy: QsyTimings::default(),
            busy_poll: DEFAULT_BUSY_POLL,
        }
    }

    /// Open modems through `factory` (default: [`NetworkModems`]).
    pub fn modem_factory(mut self, factory: Arc<dyn ModemFactory>) -> Self {
        self.modems = Some(factory);
        self
    }

    /// Resolve rigs through `rigs` (default: [`RigTable::from_config`]).
    pub fn rigs(mut self, rigs: Arc<dyn RigLookup>) -> Self {
        self.rigs = Some(rigs);
        self
    }

    /// Report dialing changes to `status`.
    pub fn status_sink(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    /// Record connection attempts in `events`.
    pub fn event_log(mut self, events: Arc<dyn EventLog>) -> Self {
        self.events = events;
        self
    }

    /// Set the wait after a QSY before dialing (default: 3s).
    pub fn qsy_settle(mut self, settle: Duration) -> Self {
        self.qsy.settle = settle;
        self
    }

    /// Set the wait before restoring the pre-QSY frequency (default: 1s).
    pub fn qsx_delay(mut self, delay: Duration) -> Self {
        self.qsy.revert_delay = delay;
        self
    }

    /// Set the busy-channel poll interval (default: 300ms).
    pub fn busy_poll(mut self, interval: Duration) -> Self {
        self.busy_poll = interval;
        self
    }

    /// Build the dialer.
    pub fn build(self) -> Dialer {
        let modems = self.modems.unwrap_or_else(|| {
            Arc::new(NetworkModems::new(Duration::from_secs(
                self.config.telnet.connect_timeout_secs,
            )))
        });
        let rigs = self
            .rigs
            .unwrap_or_else(|| Arc::new(RigTable::from_config(&self.config)));

        Dialer {
            config: self.config,
            registry: AsyncMutex::new(ModemRegistry::new(modems)),
            rigs,
            status: self.status,
            events: self.events,
            exchange: self.exchange,
            qsy_timings: self.qsy,
            busy_poll: self.busy_poll,
            active: Arc::new(Mutex::new(None)),
            session: AsyncMutex::new(()),
            claim: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }
}
