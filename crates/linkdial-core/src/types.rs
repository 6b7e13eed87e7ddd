//! Core types used throughout linkdial.
//!
//! These types name the transports a connection can be dialed over and the
//! frequencies a rig can be tuned to, independent of any particular modem
//! or rig-control backend.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The transport a connection descriptor selects.
///
/// Each scheme corresponds to one link-layer backend. Audio-modem and
/// PACTOR schemes share a half-duplex HF channel; packet and network schemes
/// do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scheme {
    /// ARDOP soundcard modem (TNC reached over TCP).
    Ardop,
    /// PACTOR hardware modem on a serial port.
    Pactor,
    /// VARA HF soundcard modem.
    VaraHf,
    /// VARA FM soundcard modem.
    VaraFm,
    /// AX.25 packet radio via the host's AX.25 stack.
    Ax25,
    /// AX.25 packet radio via a KISS TNC on a serial port.
    SerialTnc,
    /// Plain TCP (CMS over the internet).
    Telnet,
}

impl Scheme {
    /// All schemes, in declaration order.
    pub const ALL: [Scheme; 7] = [
        Scheme::Ardop,
        Scheme::Pactor,
        Scheme::VaraHf,
        Scheme::VaraFm,
        Scheme::Ax25,
        Scheme::SerialTnc,
        Scheme::Telnet,
    ];

    /// The URL scheme string, e.g. `"varahf"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Ardop => "ardop",
            Scheme::Pactor => "pactor",
            Scheme::VaraHf => "varahf",
            Scheme::VaraFm => "varafm",
            Scheme::Ax25 => "ax25",
            Scheme::SerialTnc => "serial-tnc",
            Scheme::Telnet => "telnet",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ardop" => Ok(Scheme::Ardop),
            "pactor" => Ok(Scheme::Pactor),
            "varahf" => Ok(Scheme::VaraHf),
            "varafm" => Ok(Scheme::VaraFm),
            "ax25" => Ok(Scheme::Ax25),
            "serial-tnc" => Ok(Scheme::SerialTnc),
            "telnet" => Ok(Scheme::Telnet),
            _ => Err(Error::Parse(format!("unsupported scheme: {s}"))),
        }
    }
}

/// A radio frequency, stored in hertz.
///
/// Connection descriptors express frequencies in kilohertz (`freq=3585.5`),
/// which is also how they are displayed in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Frequency(u64);

impl Frequency {
    /// Create a frequency from a value in hertz.
    pub const fn from_hz(hz: u64) -> Self {
        Frequency(hz)
    }

    /// The frequency in hertz.
    pub const fn hz(&self) -> u64 {
        self.0
    }

    /// The frequency in kilohertz.
    pub fn khz(&self) -> f64 {
        self.0 as f64 / 1_000.0
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} kHz", self.khz())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    /// Parse a kilohertz value such as `"3585"` or `"7101.5"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let khz: f64 = trimmed
            .parse()
            .map_err(|_| Error::Parse(format!("invalid frequency: {s}")))?;
        if !khz.is_finite() || khz <= 0.0 {
            return Err(Error::Parse(format!("invalid frequency: {s}")));
        }
        Ok(Frequency((khz * 1_000.0).round() as u64))
    }
}
