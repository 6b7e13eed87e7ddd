//! The dial orchestrator.
//!
//! [`Dialer::connect`] takes one connection descriptor through the whole
//! attempt: alias resolution, defaults, radio-only rules, modem
//! readiness, QSY, the busy-channel gate, the cancellable dial, and the
//! hand-off to the exchange. Every failure is logged and reported as
//! `false`; nothing escapes as an error.
//!
//! At most one attempt owns the radio session. A new attempt cancels the
//! one holding it and waits for that attempt's cleanup (QSX included)
//! before it touches the modem or the rig. An [`AbortHandle`] cancels
//! exactly the attempt it was issued for.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use linkdial_core::descriptor::{ConnectionDescriptor, PARAM_IGNORE_BUSY, PARAM_RADIO_ONLY};
use linkdial_core::error::{Error, Result};
use linkdial_core::events::{ConnOutcome, ConnRecord, EventLog, StatusSink};
use linkdial_core::exchange::Exchange;
use linkdial_core::helpers::{has_ssid, parse_bool};
use linkdial_core::modem::Modem;
use linkdial_core::rig::{RigBinding, RigLookup};
use linkdial_core::types::{Frequency, Scheme};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::alias::resolve_alias;
use crate::busy::wait_clear;
use crate::config::Config;
use crate::profile::{profile, TransportProfile};
use crate::qsy::{qsy, QsyTimings};
use crate::registry::ModemRegistry;

/// Appended to the station callsign in radio-only mode.
pub const RADIO_ONLY_SUFFIX: &str = "-T";

#[derive(Debug)]
pub(crate) struct ActiveDial {
    id: u64,
    descriptor: ConnectionDescriptor,
    token: CancellationToken,
}

pub(crate) type ActiveSlot = Mutex<Option<ActiveDial>>;

/// The attempt that most recently claimed the radio session.
#[derive(Debug)]
pub(crate) struct Claim {
    id: u64,
    token: CancellationToken,
}

fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cancels one specific dial.
///
/// Once that dial has finished, aborting is a no-op; it never touches a
/// later dial.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    id: u64,
    token: CancellationToken,
    active: Weak<ActiveSlot>,
}

impl AbortHandle {
    /// Clear the dialing marker (if it is still this dial's) and cancel.
    pub fn abort(&self) {
        if let Some(active) = self.active.upgrade() {
            let mut slot = lock(&active);
            if slot.as_ref().is_some_and(|a| a.id == self.id) {
                *slot = None;
            }
        }
        self.token.cancel();
    }

    /// Whether [`abort`](Self::abort) has been called (or a newer dial
    /// superseded this one).
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A connect running in its own task, from [`Dialer::start`].
#[derive(Debug)]
pub struct ConnectTask {
    abort: AbortHandle,
    join: JoinHandle<bool>,
}

impl ConnectTask {
    /// A handle that cancels this connect.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Cancel this connect.
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Wait for the connect to finish. A panicked task counts as failed.
    pub async fn wait(self) -> bool {
        match self.join.await {
            Ok(connected) => connected,
            Err(e) => {
                error!(error = %e, "Connect task failed");
                false
            }
        }
    }
}

/// How one attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Connected,
    Failed,
    Cancelled,
}

/// The connection orchestrator. Build one with
/// [`DialerBuilder`](crate::DialerBuilder).
pub struct Dialer {
    pub(crate) config: Config,
    pub(crate) registry: AsyncMutex<ModemRegistry>,
    pub(crate) rigs: Arc<dyn RigLookup>,
    pub(crate) status: Arc<dyn StatusSink>,
    pub(crate) events: Arc<dyn EventLog>,
    pub(crate) exchange: Arc<dyn Exchange>,
    pub(crate) qsy_timings: QsyTimings,
    pub(crate) busy_poll: Duration,
    pub(crate) active: Arc<ActiveSlot>,
    pub(crate) session: AsyncMutex<()>,
    pub(crate) claim: Mutex<Option<Claim>>,
    pub(crate) next_id: AtomicU64,
}

impl Dialer {
    /// The configuration this dialer was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dial `descriptor` (or the alias it names) and run the exchange.
    ///
    /// Returns `true` only if the dial connected and the exchange
    /// succeeded.
    pub async fn connect(&self, descriptor: &str) -> bool {
        let abort = self.new_abort_handle();
        self.attempt(descriptor, &abort).await == Attempt::Connected
    }

    /// Try each descriptor in order until one connects.
    ///
    /// Stops early if a dial is aborted; an aborted dial means the
    /// operator wants to stop, not to fall through to the next transport.
    pub async fn connect_any<S: AsRef<str>>(&self, descriptors: &[S]) -> bool {
        let abort = self.new_abort_handle();
        self.attempt_any(descriptors, &abort).await
    }

    /// Run [`connect`](Self::connect) in a new task.
    ///
    /// The returned task's abort handle is live immediately, before the
    /// dial is registered, so an abort during QSY or the busy wait stops the
    /// attempt before it dials.
    pub fn start(self: &Arc<Self>, descriptor: impl Into<String>) -> ConnectTask {
        let abort = self.new_abort_handle();
        let descriptor = descriptor.into();
        let dialer = Arc::clone(self);
        let handle = abort.clone();
        let join = tokio::spawn(async move {
            dialer.attempt(&descriptor, &handle).await == Attempt::Connected
        });
        ConnectTask { abort, join }
    }

    /// Run [`connect_any`](Self::connect_any) in a new task. One abort handle
    /// covers every candidate.
    pub fn start_any(self: &Arc<Self>, descriptors: Vec<String>) -> ConnectTask {
        let abort = self.new_abort_handle();
        let dialer = Arc::clone(self);
        let handle = abort.clone();
        let join = tokio::spawn(async move { dialer.attempt_any(&descriptors, &handle).await });
        ConnectTask { abort, join }
    }

    /// Abort the registered dial. Returns `false` if nothing was dialing;
    /// attempts still tuning or waiting are reached through their
    /// [`ConnectTask`]'s handle.
    pub fn abort(&self) -> bool {
        let taken = lock(&self.active).take();
        match taken {
            Some(active) => {
                info!(descriptor = %active.descriptor, "Aborting dial");
                active.token.cancel();
                true
            }
            None => false,
        }
    }

    /// An abort handle for the dial in flight, if any.
    pub fn abort_handle(&self) -> Option<AbortHandle> {
        lock(&self.active).as_ref().map(|active| AbortHandle {
            id: active.id,
            token: active.token.clone(),
            active: Arc::downgrade(&self.active),
        })
    }

    /// The descriptor being dialed right now, defaults applied.
    pub fn dialing(&self) -> Option<ConnectionDescriptor> {
        lock(&self.active).as_ref().map(|a| a.descriptor.clone())
    }

    /// Abort any attempt and close every open modem once it has cleaned up.
    pub async fn shutdown(&self) {
        self.abort();
        if let Some(claim) = lock(&self.claim).take() {
            claim.token.cancel();
        }
        let _session = self.session.lock().await;
        self.registry.lock().await.close_all().await;
        debug!("Dialer shut down");
    }

    fn new_abort_handle(&self) -> AbortHandle {
        AbortHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            token: CancellationToken::new(),
            active: Arc::downgrade(&self.active),
        }
    }

    async fn attempt_any<S: AsRef<str>>(&self, descriptors: &[S], abort: &AbortHandle) -> bool {
        for descriptor in descriptors {
            match self.attempt(descriptor.as_ref(), abort).await {
                Attempt::Connected => return true,
                Attempt::Failed => {}
                Attempt::Cancelled => return false,
            }
        }
        false
    }

    /// Take the radio session for `abort`'s attempt.
    ///
    /// Whoever claimed it before is cancelled first; the returned guard is
    /// only handed out once that attempt has released the session, so its
    /// QSX has already run. `None` means this attempt was itself cancelled
    /// while waiting.
    async fn claim_session(&self, abort: &AbortHandle) -> Option<Session<'_>> {
        let previous = lock(&self.claim).replace(Claim {
            id: abort.id,
            token: abort.token.clone(),
        });
        if let Some(previous) = previous.filter(|p| p.id != abort.id) {
            debug!("Cancelling previous attempt");
            previous.token.cancel();
        }

        let held = tokio::select! {
            biased;
            _ = abort.token.cancelled() => None,
            held = self.session.lock() => Some(held),
        };
        match held {
            Some(held) if !abort.is_aborted() => Some(Session {
                dialer: self,
                id: abort.id,
                _held: held,
            }),
            _ => {
                self.withdraw_claim(abort.id);
                None
            }
        }
    }

    fn withdraw_claim(&self, id: u64) {
        let mut claim = lock(&self.claim);
        if claim.as_ref().is_some_and(|c| c.id == id) {
            *claim = None;
        }
    }

    async fn attempt(&self, requested: &str, abort: &AbortHandle) -> Attempt {
        if requested.is_empty() {
            error!("Empty connection descriptor");
            return Attempt::Failed;
        }
        let resolved = match resolve_alias(&self.config.connect_aliases, requested) {
            Ok(resolved) => resolved,
            Err(e) => {
                error!(descriptor = %requested, error = %e, "Unable to resolve connect alias");
                return Attempt::Failed;
            }
        };
        if resolved != requested {
            debug!(alias = %requested, descriptor = %resolved, "Resolved connect alias");
        }

        let descriptor = match ConnectionDescriptor::parse(resolved) {
            Ok(d) => d,
            Err(e) => {
                error!(descriptor = %resolved, error = %e, "Invalid connection descriptor");
                return Attempt::Failed;
            }
        };
        let scheme = descriptor.scheme();
        let profile = profile(scheme);

        let descriptor = match self.prepare(descriptor, profile) {
            Ok(d) => d,
            Err(e) => {
                error!(%scheme, error = %e, "Unable to connect");
                return Attempt::Failed;
            }
        };

        let Some(_session) = self.claim_session(abort).await else {
            info!(%scheme, "Dial cancelled");
            return Attempt::Cancelled;
        };

        let settings = profile.modem_settings(&self.config, &descriptor);
        let modem = {
            let mut registry = self.registry.lock().await;
            match registry.ensure(scheme, &settings, self.rigs.as_ref()).await {
                Ok(modem) => modem,
                Err(e) => {
                    error!(%scheme, error = %e, "Unable to initialize modem");
                    return Attempt::Failed;
                }
            }
        };

        let qsx = match descriptor.frequency() {
            None => None,
            Some(Err(e)) => {
                error!(%scheme, error = %e, "Unable to QSY");
                return Attempt::Failed;
            }
            Some(Ok(freq)) => match qsy(self.rigs.as_ref(), scheme, freq, self.qsy_timings).await {
                Ok(guard) => Some(guard),
                Err(e) => {
                    error!(%scheme, error = %e, "Unable to QSY");
                    return Attempt::Failed;
                }
            },
        };

        let result = self
            .dial(resolved, &descriptor, profile, modem.as_ref(), abort)
            .await;

        if let Some(qsx) = qsx {
            qsx.finish().await;
        }
        result
    }

    /// Apply defaults and radio-only rules. Pure: touches no transport.
    fn prepare(
        &self,
        descriptor: ConnectionDescriptor,
        profile: &TransportProfile,
    ) -> Result<ConnectionDescriptor> {
        let descriptor = profile.apply_defaults(descriptor, &self.config);

        // An empty value is the same as no value.
        let radio_only = match descriptor
            .param(PARAM_RADIO_ONLY)
            .filter(|v| !v.trim().is_empty())
        {
            Some(value) => parse_bool(value).unwrap_or_else(|| {
                warn!(value = %value, "Invalid radio_only value; dialing without radio-only");
                false
            }),
            None => self.config.radio_only,
        };
        if !radio_only {
            return Ok(descriptor);
        }

        if has_ssid(&self.config.mycall) {
            return Err(Error::Unsupported(
                "radio-only does not support callsigns with an SSID".into(),
            ));
        }
        if !profile.radio_only {
            return Err(Error::Unsupported(format!(
                "radio-only is not available for {}",
                profile.scheme
            )));
        }
        let user = format!(
            "{}{RADIO_ONLY_SUFFIX}",
            descriptor.user().unwrap_or(self.config.mycall.as_str())
        );
        Ok(descriptor.with_user(user))
    }

    async fn dial(
        &self,
        requested: &str,
        descriptor: &ConnectionDescriptor,
        profile: &TransportProfile,
        modem: &dyn Modem,
        abort: &AbortHandle,
    ) -> Attempt {
        let scheme = descriptor.scheme();
        let frequency = self.current_frequency(scheme).await;

        if profile.shared_channel {
            let ignore_busy = descriptor
                .param(PARAM_IGNORE_BUSY)
                .and_then(parse_bool)
                .unwrap_or(self.config.ignore_busy);
            wait_clear(modem, ignore_busy, self.busy_poll, &abort.token).await;
        }

        // Cancelled while settling or waiting for a clear channel.
        if abort.is_aborted() {
            info!(%scheme, "Dial cancelled");
            return Attempt::Cancelled;
        }

        let dialing = self.begin_dialing(abort, descriptor);
        info!(
            %scheme,
            target = %descriptor.target(),
            via = ?descriptor.via(),
            "Connecting..."
        );
        let result = tokio::select! {
            biased;
            _ = abort.token.cancelled() => Err(Error::Cancelled),
            result = modem.dial(descriptor) => result,
        };
        drop(dialing);

        let outcome = match &result {
            Ok(conn) => ConnOutcome::Connected {
                remote: conn.remote.clone(),
            },
            Err(Error::Cancelled) => ConnOutcome::Cancelled,
            Err(e) => ConnOutcome::Failed {
                error: e.to_string(),
            },
        };
        self.events.log_conn(&ConnRecord {
            descriptor: requested.to_string(),
            frequency,
            outcome,
        });

        let conn = match result {
            Ok(conn) => conn,
            Err(Error::Cancelled) => {
                info!(%scheme, "Dial cancelled");
                return Attempt::Cancelled;
            }
            Err(e) => {
                error!(%scheme, error = %e, "Unable to establish connection to remote");
                return Attempt::Failed;
            }
        };

        info!(%scheme, remote = %conn.remote, "Connected");
        match self.exchange.exchange(conn, descriptor.target()).await {
            Ok(()) => {
                info!(%scheme, "Disconnected.");
                Attempt::Connected
            }
            Err(e) => {
                error!(%scheme, error = %e, "Exchange failed");
                Attempt::Failed
            }
        }
    }

    /// Best-effort read of the bound rig's frequency for the event log.
    async fn current_frequency(&self, scheme: Scheme) -> Option<Frequency> {
        let rig = match self.rigs.rig_for(scheme) {
            Ok(RigBinding::Loaded { rig, .. }) => rig,
            Ok(_) => return None,
            Err(e) => {
                debug!(%scheme, error = %e, "Rig lookup failed");
                return None;
            }
        };
        match rig.get_frequency().await {
            Ok(freq) => Some(freq),
            Err(e) => {
                debug!(%scheme, rig = %rig.name(), error = %e, "Unable to read frequency");
                None
            }
        }
    }

    /// Register `abort`'s dial as the active one, cancelling any other.
    fn begin_dialing(&self, abort: &AbortHandle, descriptor: &ConnectionDescriptor) -> Dialing<'_> {
        let previous = lock(&self.active).replace(ActiveDial {
            id: abort.id,
            descriptor: descriptor.clone(),
            token: abort.token.clone(),
        });
        if let Some(previous) = previous.filter(|p| p.id != abort.id) {
            info!(descriptor = %previous.descriptor, "Cancelling previous dial");
            previous.token.cancel();
        }
        self.status.dialing_changed(Some(descriptor));
        Dialing {
            dialer: self,
            id: abort.id,
        }
    }
}

/// Holds the radio session for one attempt and withdraws its claim on
/// release.
struct Session<'a> {
    dialer: &'a Dialer,
    id: u64,
    _held: AsyncMutexGuard<'a, ()>,
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.dialer.withdraw_claim(self.id);
    }
}

/// Clears the active dial and reports "not dialing" when dropped, unless a
/// newer dial has taken the slot.
struct Dialing<'a> {
    dialer: &'a Dialer,
    id: u64,
}

impl Drop for Dialing<'_> {
    fn drop(&mut self) {
        let superseded = {
            let mut slot = lock(&self.dialer.active);
            match slot.as_ref() {
                Some(active) if active.id != self.id => true,
                _ => {
                    *slot = None;
                    false
                }
            }
        };
        if !superseded {
            self.dialer.status.dialing_changed(None);
        }
    }
}
