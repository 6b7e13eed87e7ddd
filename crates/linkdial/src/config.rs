//! Station and transport configuration.
//!
//! Loaded from TOML. Every field has a default, so a minimal file only
//! needs the station callsign:
//!
//! ```toml
//! mycall = "N0CALL"
//! locator = "JP20qh"
//!
//! [connect_aliases]
//! home = "varahf://LA1B?freq=3585"
//!
//! [ardop]
//! addr = "localhost:8515"
//! arq_bandwidth = "500MAX"
//! ptt_control = true
//! rig = "ic7300"
//!
//! [hamlib_rigs.ic7300]
//! address = "localhost:4532"
//! ```

use std::collections::HashMap;
use std::path::Path;

use linkdial_core::error::{Error, Result};
use linkdial_core::types::Scheme;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Station callsign. Fills in the user of descriptors that name none.
    pub mycall: String,
    /// Maidenhead locator, passed to modems that beacon it.
    pub locator: String,
    /// Dial in radio-only mode unless a descriptor says otherwise.
    pub radio_only: bool,
    /// Dial without waiting for a busy channel to clear.
    pub ignore_busy: bool,
    /// Named shortcuts for descriptor strings. Values may themselves be aliases.
    pub connect_aliases: HashMap<String, String>,
    /// ARDOP TNC settings.
    pub ardop: ArdopConfig,
    /// PACTOR modem settings.
    pub pactor: PactorConfig,
    /// VARA HF modem settings.
    pub varahf: VaraConfig,
    /// VARA FM modem settings.
    pub varafm: VaraConfig,
    /// AX.25 settings.
    pub ax25: Ax25Config,
    /// Serial KISS TNC settings.
    pub serial_tnc: SerialTncConfig,
    /// Telnet settings.
    pub telnet: TelnetConfig,
    /// `rigctld` endpoints, keyed by rig name.
    pub hamlib_rigs: HashMap<String, RigConfig>,
}

/// ARDOP TNC settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArdopConfig {
    /// TNC command address (`host:port`).
    pub addr: String,
    /// ARQ bandwidth, e.g. `"500MAX"`.
    pub arq_bandwidth: Option<String>,
    /// Send CW identification.
    pub cwid: bool,
    /// Key the rig's PTT from the TNC.
    pub ptt_control: bool,
    /// Rig used for QSY and PTT.
    pub rig: String,
}

impl Default for ArdopConfig {
    fn default() -> Self {
        ArdopConfig {
            addr: "localhost:8515".into(),
            arq_bandwidth: None,
            cwid: true,
            ptt_control: false,
            rig: String::new(),
        }
    }
}

/// PACTOR modem settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PactorConfig {
    /// Serial device.
    pub path: String,
    /// Serial baud rate.
    pub baudrate: u32,
    /// Init script run after open.
    pub init_script: String,
    /// Rig used for QSY.
    pub rig: String,
}

impl Default for PactorConfig {
    fn default() -> Self {
        PactorConfig {
            path: "/dev/ttyUSB0".into(),
            baudrate: 57_600,
            init_script: String::new(),
            rig: String::new(),
        }
    }
}

/// VARA modem settings (HF or FM).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VaraConfig {
    /// Host running VARA.
    pub host: String,
    /// Command port.
    pub cmd_port: u16,
    /// Data port.
    pub data_port: u16,
    /// Bandwidth, e.g. `"2300"`.
    pub bandwidth: Option<String>,
    /// Key the rig's PTT from VARA.
    pub ptt_control: bool,
    /// Rig used for QSY and PTT.
    pub rig: String,
}

impl Default for VaraConfig {
    fn default() -> Self {
        VaraConfig {
            host: "localhost".into(),
            cmd_port: 8300,
            data_port: 8301,
            bandwidth: None,
            ptt_control: false,
            rig: String::new(),
        }
    }
}

/// AX.25 settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Ax25Config {
    /// AX.25 port name used when a descriptor names no host.
    pub port: String,
    /// Rig used for QSY.
    pub rig: String,
}

impl Default for Ax25Config {
    fn default() -> Self {
        Ax25Config {
            port: "wl2k".into(),
            rig: String::new(),
        }
    }
}

/// Serial KISS TNC settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialTncConfig {
    /// Serial device used when a descriptor names no host.
    pub path: String,
    /// Radio-side baud rate; `0` leaves the descriptor untouched.
    pub hbaud: u32,
    /// Serial-port baud rate; `0` leaves the descriptor untouched.
    pub serial_baud: u32,
    /// Rig used for QSY.
    pub rig: String,
}

impl Default for SerialTncConfig {
    fn default() -> Self {
        SerialTncConfig {
            path: "/dev/ttyUSB0".into(),
            hbaud: 1200,
            serial_baud: 9600,
            rig: String::new(),
        }
    }
}

/// Telnet settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelnetConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for TelnetConfig {
    fn default() -> Self {
        TelnetConfig {
            connect_timeout_secs: 30,
        }
    }
}

/// A `rigctld` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// `host:port` of the daemon.
    pub address: String,
    /// Only `"tcp"` is supported.
    pub network: String,
}

impl Default for RigConfig {
    fn default() -> Self {
        RigConfig {
            address: "localhost:4532".into(),
            network: "tcp".into(),
        }
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Self::from_toml_str(&text)
    }

    /// The rig name bound to a transport, if one is configured.
    pub fn rig_name_for(&self, scheme: Scheme) -> Option<&str> {
        let name = match scheme {
            Scheme::Ardop => &self.ardop.rig,
            Scheme::Pactor => &self.pactor.rig,
            Scheme::VaraHf => &self.varahf.rig,
            Scheme::VaraFm => &self.varafm.rig,
            Scheme::Ax25 => &self.ax25.rig,
            Scheme::SerialTnc => &self.serial_tnc.rig,
            Scheme::Telnet => return None,
        };
        Some(name.as_str()).filter(|n| !n.is_empty())
    }
}
