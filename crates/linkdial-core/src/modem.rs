//! The `Modem` trait -- one live handle per transport scheme.
//!
//! A modem handle owns the connection to a physical or virtual modem (an
//! ARDOP TNC, a VARA instance, a PACTOR controller) or, for schemes with no
//! modem to manage, a stateless dialer. The registry in the `linkdial`
//! crate opens handles through a [`ModemFactory`], probes them with
//! [`Modem::ping`], applies post-open configuration, and closes them.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::descriptor::ConnectionDescriptor;
use crate::error::{Error, Result};
use crate::rig::Rig;
use crate::types::Scheme;

/// A connected byte stream to the remote station.
pub trait LinkStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> LinkStream for T {}

/// An established connection returned by a successful dial.
pub struct Connection {
    /// The byte stream to hand to the exchange.
    pub stream: Box<dyn LinkStream>,
    /// The remote address as reported by the transport, for logging.
    pub remote: String,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}

/// A shared medium that can report whether another station is transmitting.
#[async_trait]
pub trait BusyChannel: Send + Sync {
    /// Whether the channel is currently occupied.
    ///
    /// Backends without a busy detector report `Ok(false)`.
    async fn busy(&self) -> Result<bool> {
        Ok(false)
    }
}

/// A live handle to a transport's modem.
#[async_trait]
pub trait Modem: BusyChannel {
    /// The scheme this handle dials for.
    fn scheme(&self) -> Scheme;

    /// Liveness probe (e.g. a `PING` round trip).
    ///
    /// Backends without a probe are assumed healthy.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Firmware or software version, logged after open.
    async fn version(&self) -> Result<String> {
        Err(Error::Unsupported("version query not supported".into()))
    }

    /// Set the ARQ bandwidth (e.g. `"500MAX"` for ARDOP, `"2300"` for VARA).
    async fn set_arq_bandwidth(&self, _bandwidth: &str) -> Result<()> {
        Err(Error::Unsupported("ARQ bandwidth not supported".into()))
    }

    /// Enable or disable CW identification after each transmission.
    async fn set_cwid(&self, _enabled: bool) -> Result<()> {
        Err(Error::Unsupported("CW ID not supported".into()))
    }

    /// Wire push-to-talk to a rig.
    async fn set_ptt(&self, _rig: Arc<dyn Rig>) -> Result<()> {
        Err(Error::Unsupported("rig PTT control not supported".into()))
    }

    /// Dial the remote station named by `descriptor`.
    ///
    /// The orchestrator races this future against its cancellation token
    /// and drops it on abort, so implementations must leave the handle
    /// reusable when dropped mid-dial.
    async fn dial(&self, descriptor: &ConnectionDescriptor) -> Result<Connection>;

    /// Close the handle. Called exactly once by the registry.
    async fn close(&self) -> Result<()>;
}

/// Settings a modem handle is opened with.
///
/// The registry compares the settings a handle was opened with against the
/// settings of each new request; any difference forces a reopen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModemSettings {
    /// Station callsign the modem identifies as.
    pub mycall: String,
    /// Maidenhead locator.
    pub locator: String,
    /// Command address: `host:port` for network modems, a device path for
    /// serial ones.
    pub address: String,
    /// Data channel address for modems with split command/data ports.
    pub data_address: Option<String>,
    /// Serial baud rate.
    pub baud_rate: Option<u32>,
    /// Path of a modem init script run after open.
    pub init_script: Option<String>,
    /// Per-connect init commands (descriptor `init` parameters, newline-joined).
    pub init_commands: Option<String>,
    /// ARQ bandwidth to apply after open.
    pub arq_bandwidth: Option<String>,
    /// CW ID setting to apply after open.
    pub cwid: Option<bool>,
    /// Name of the rig to wire for PTT.
    pub ptt_rig: Option<String>,
}

/// Opens modem handles for a scheme.
#[async_trait]
pub trait ModemFactory: Send + Sync {
    /// Open a new handle. Post-open configuration is applied by the caller.
    async fn open(&self, scheme: Scheme, settings: &ModemSettings) -> Result<Arc<dyn Modem>>;
}
