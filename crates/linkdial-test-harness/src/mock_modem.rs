//! Scriptable modem handles and the factory that opens them.
//!
//! [`MockModemFactory`] keeps every [`MockModem`] it opens so tests can
//! count open/close cycles, inspect post-open configuration, and see which
//! descriptors were dialed.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use linkdial_core::descriptor::ConnectionDescriptor;
use linkdial_core::error::{Error, Result};
use linkdial_core::modem::{BusyChannel, Connection, Modem, ModemFactory, ModemSettings};
use linkdial_core::rig::Rig;
use linkdial_core::types::Scheme;

/// What a mock modem does when dialed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialBehavior {
    /// Connect immediately with an in-memory stream.
    Connect,
    /// Fail with [`Error::Dial`] carrying this message.
    Fail(String),
    /// Never complete (until the dial is cancelled).
    Hang,
}

/// A scripted modem handle.
#[derive(Debug)]
pub struct MockModem {
    scheme: Scheme,
    settings: ModemSettings,
    healthy: AtomicBool,
    busy_polls: AtomicUsize,
    busy_broken: AtomicBool,
    dial_behavior: Mutex<DialBehavior>,
    dials: Mutex<Vec<ConnectionDescriptor>>,
    dials_started: AtomicUsize,
    closes: AtomicUsize,
    busy_queries: AtomicUsize,
    arq_bandwidth: Mutex<Option<String>>,
    cwid: Mutex<Option<bool>>,
    ptt_rig: Mutex<Option<String>>,
    reject_config: AtomicBool,
}

impl MockModem {
    /// Create a healthy handle for `scheme` opened with `settings`.
    pub fn new(scheme: Scheme, settings: ModemSettings) -> Self {
        MockModem {
            scheme,
            settings,
            healthy: AtomicBool::new(true),
            busy_polls: AtomicUsize::new(0),
            busy_broken: AtomicBool::new(false),
            dial_behavior: Mutex::new(DialBehavior::Connect),
            dials: Mutex::new(Vec::new()),
            dials_started: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            busy_queries: AtomicUsize::new(0),
            arq_bandwidth: Mutex::new(None),
            cwid: Mutex::new(None),
            ptt_rig: Mutex::new(None),
            reject_config: AtomicBool::new(false),
        }
    }

    /// The settings this handle was opened with.
    pub fn settings(&self) -> &ModemSettings {
        &self.settings
    }

    /// Make the liveness probe pass or fail.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Report the channel busy for the next `polls` queries.
    pub fn set_busy_polls(&self, polls: usize) {
        self.busy_polls.store(polls, Ordering::SeqCst);
    }

    /// Make busy queries fail.
    pub fn set_busy_broken(&self, broken: bool) {
        self.busy_broken.store(broken, Ordering::SeqCst);
    }

    /// Change what the next dial does.
    pub fn set_dial_behavior(&self, behavior: DialBehavior) {
        *self.dial_behavior.lock().unwrap() = behavior;
    }

    /// Make post-open configuration calls fail.
    pub fn set_reject_config(&self, reject: bool) {
        self.reject_config.store(reject, Ordering::SeqCst);
    }

    /// Descriptors that reached `dial`, in order.
    pub fn dials(&self) -> Vec<ConnectionDescriptor> {
        self.dials.lock().unwrap().clone()
    }

    /// Number of dials that have started (including hung ones).
    pub fn dials_started(&self) -> usize {
        self.dials_started.load(Ordering::SeqCst)
    }

    /// Number of times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Number of busy queries answered.
    pub fn busy_queries(&self) -> usize {
        self.busy_queries.load(Ordering::SeqCst)
    }

    /// ARQ bandwidth applied after open.
    pub fn arq_bandwidth(&self) -> Option<String> {
        self.arq_bandwidth.lock().unwrap().clone()
    }

    /// CW ID setting applied after open.
    pub fn cwid(&self) -> Option<bool> {
        *self.cwid.lock().unwrap()
    }

    /// Name of the rig wired for PTT.
    pub fn ptt_rig(&self) -> Option<String> {
        self.ptt_rig.lock().unwrap().clone()
    }

    fn check_config(&self) -> Result<()> {
        if self.reject_config.load(Ordering::SeqCst) {
            return Err(Error::Protocol("modem rejected command".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BusyChannel for MockModem {
    async fn busy(&self) -> Result<bool> {
        self.busy_queries.fetch_add(1, Ordering::SeqCst);
        if self.busy_broken.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }
        let remaining = self.busy_polls.load(Ordering::SeqCst);
        if remaining > 0 {
            self.busy_polls.store(remaining - 1, Ordering::SeqCst);
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl Modem for MockModem {
    fn scheme(&self) -> Scheme {
        self.scheme
    }

    async fn ping(&self) -> Result<()> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Timeout)
        }
    }

    async fn version(&self) -> Result<String> {
        Ok("mock 1.0".into())
    }

    async fn set_arq_bandwidth(&self, bandwidth: &str) -> Result<()> {
        self.check_config()?;
        *self.arq_bandwidth.lock().unwrap() = Some(bandwidth.to_string());
        Ok(())
    }

    async fn set_cwid(&self, enabled: bool) -> Result<()> {
        self.check_config()?;
        *self.cwid.lock().unwrap() = Some(enabled);
        Ok(())
    }

    async fn set_ptt(&self, rig: Arc<dyn Rig>) -> Result<()> {
        self.check_config()?;
        *self.ptt_rig.lock().unwrap() = Some(rig.name().to_string());
        Ok(())
    }

    async fn dial(&self, descriptor: &ConnectionDescriptor) -> Result<Connection> {
        self.dials_started.fetch_add(1, Ordering::SeqCst);
        let behavior = self.dial_behavior.lock().unwrap().clone();
        match behavior {
            DialBehavior::Connect => {
                self.dials.lock().unwrap().push(descriptor.clone());
                let (local, _remote) = tokio::io::duplex(1024);
                Ok(Connection {
                    stream: Box::new(local),
                    remote: descriptor.target().to_string(),
                })
            }
            DialBehavior::Fail(msg) => {
                self.dials.lock().unwrap().push(descriptor.clone());
                Err(Error::Dial(msg))
            }
            DialBehavior::Hang => {
                self.dials.lock().unwrap().push(descriptor.clone());
                std::future::pending::<()>().await;
                unreachable!("pending never resolves")
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A [`ModemFactory`] that opens [`MockModem`]s and remembers them.
#[derive(Debug, Default)]
pub struct MockModemFactory {
    opened: Mutex<Vec<Arc<MockModem>>>,
    failing: Mutex<HashSet<Scheme>>,
    dial_behavior: Mutex<Option<DialBehavior>>,
    busy_polls: AtomicUsize,
}

impl MockModemFactory {
    /// Create a factory whose modems connect on dial.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make opens for `scheme` fail.
    pub fn fail_open(&self, scheme: Scheme) {
        self.failing.lock().unwrap().insert(scheme);
    }

    /// Dial behavior for modems opened from now on.
    pub fn set_dial_behavior(&self, behavior: DialBehavior) {
        *self.dial_behavior.lock().unwrap() = Some(behavior);
    }

    /// Busy polls for modems opened from now on.
    pub fn set_busy_polls(&self, polls: usize) {
        self.busy_polls.store(polls, Ordering::SeqCst);
    }

    /// Every handle opened so far, oldest first.
    pub fn opened(&self) -> Vec<Arc<MockModem>> {
        self.opened.lock().unwrap().clone()
    }

    /// Handles opened for `scheme`, oldest first.
    pub fn opened_for(&self, scheme: Scheme) -> Vec<Arc<MockModem>> {
        self.opened()
            .into_iter()
            .filter(|m| m.scheme == scheme)
            .collect()
    }

    /// Total number of opens.
    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    /// Most recently opened handle.
    pub fn last(&self) -> Option<Arc<MockModem>> {
        self.opened.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModemFactory for MockModemFactory {
    async fn open(&self, scheme: Scheme, settings: &ModemSettings) -> Result<Arc<dyn Modem>> {
        if self.failing.lock().unwrap().contains(&scheme) {
            return Err(Error::Transport(format!("{scheme} modem unreachable")));
        }
        let modem = Arc::new(MockModem::new(scheme, settings.clone()));
        if let Some(behavior) = self.dial_behavior.lock().unwrap().clone() {
            modem.set_dial_behavior(behavior);
        }
        modem.set_busy_polls(self.busy_polls.load(Ordering::SeqCst));
        self.opened.lock().unwrap().push(Arc::clone(&modem));
        Ok(modem)
    }
}
