//! Per-transport capabilities.
//!
//! Every scheme has one static [`TransportProfile`]. The dialer consults
//! it instead of branching on the scheme: whether radio-only mode is
//! available, whether the medium is shared (and so gated on a clear
//! channel), how a missing host interface is filled in, and which settings
//! the scheme's modem is opened and configured with.

use linkdial_core::descriptor::{
    ConnectionDescriptor, PARAM_HBAUD, PARAM_INIT, PARAM_SERIAL_BAUD,
};
use linkdial_core::modem::ModemSettings;
use linkdial_core::types::Scheme;

use crate::config::Config;

/// Where a descriptor's empty host interface is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultInterface {
    /// Left empty.
    None,
    /// The configured AX.25 port.
    Ax25Port,
    /// The configured serial TNC device, plus its baud parameters.
    SerialTnc,
}

/// Static capabilities of one transport scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportProfile {
    /// The scheme described.
    pub scheme: Scheme,
    /// Whether radio-only (`-T`) dialing is supported.
    pub radio_only: bool,
    /// Whether the medium is shared and has a busy detector worth waiting on.
    pub shared_channel: bool,
    /// How an empty host interface is filled in.
    pub default_interface: DefaultInterface,
}

static PROFILES: [TransportProfile; 7] = [
    TransportProfile {
        scheme: Scheme::Ardop,
        radio_only: true,
        shared_channel: true,
        default_interface: DefaultInterface::None,
    },
    TransportProfile {
        scheme: Scheme::Pactor,
        radio_only: true,
        shared_channel: true,
        default_interface: DefaultInterface::None,
    },
    TransportProfile {
        scheme: Scheme::VaraHf,
        radio_only: true,
        shared_channel: true,
        default_interface: DefaultInterface::None,
    },
    TransportProfile {
        scheme: Scheme::VaraFm,
        radio_only: true,
        shared_channel: true,
        default_interface: DefaultInterface::None,
    },
    TransportProfile {
        scheme: Scheme::Ax25,
        radio_only: false,
        shared_channel: false,
        default_interface: DefaultInterface::Ax25Port,
    },
    TransportProfile {
        scheme: Scheme::SerialTnc,
        radio_only: false,
        shared_channel: false,
        default_interface: DefaultInterface::SerialTnc,
    },
    TransportProfile {
        scheme: Scheme::Telnet,
        radio_only: true,
        shared_channel: false,
        default_interface: DefaultInterface::None,
    },
];

/// Look up the profile for a scheme.
pub fn profile(scheme: Scheme) -> &'static TransportProfile {
    match scheme {
        Scheme::Ardop => &PROFILES[0],
        Scheme::Pactor => &PROFILES[1],
        Scheme::VaraHf => &PROFILES[2],
        Scheme::VaraFm => &PROFILES[3],
        Scheme::Ax25 => &PROFILES[4],
        Scheme::SerialTnc => &PROFILES[5],
        Scheme::Telnet => &PROFILES[6],
    }
}

impl TransportProfile {
    /// Fill in what the descriptor leaves unspecified: the user (the
    /// station callsign) and, for schemes that name a local interface, the
    /// host.
    pub fn apply_defaults(
        &self,
        mut descriptor: ConnectionDescriptor,
        config: &Config,
    ) -> ConnectionDescriptor {
        if descriptor.user().is_none() && !config.mycall.is_empty() {
            descriptor = descriptor.with_user(config.mycall.clone());
        }
        if !descriptor.host().is_empty() {
            return descriptor;
        }
        match self.default_interface {
            DefaultInterface::None => descriptor,
            DefaultInterface::Ax25Port => descriptor.with_host(config.ax25.port.clone()),
            DefaultInterface::SerialTnc => {
                let tnc = &config.serial_tnc;
                let mut descriptor = descriptor.with_host(tnc.path.clone());
                if tnc.hbaud > 0 {
                    descriptor.set_param(PARAM_HBAUD, tnc.hbaud.to_string());
                }
                if tnc.serial_baud > 0 {
                    descriptor.set_param(PARAM_SERIAL_BAUD, tnc.serial_baud.to_string());
                }
                descriptor
            }
        }
    }

    /// Settings the scheme's modem must be opened with to serve `descriptor`.
    pub fn modem_settings(&self, config: &Config, descriptor: &ConnectionDescriptor) -> ModemSettings {
        let mut settings = ModemSettings {
            mycall: config.mycall.clone(),
            locator: config.locator.clone(),
            ..ModemSettings::default()
        };
        match self.scheme {
            Scheme::Ardop => {
                let ardop = &config.ardop;
                settings.address = ardop.addr.clone();
                settings.arq_bandwidth = ardop.arq_bandwidth.clone();
                settings.cwid = Some(ardop.cwid);
                settings.ptt_rig = ptt_rig(ardop.ptt_control, &ardop.rig);
            }
            Scheme::Pactor => {
                let pactor = &config.pactor;
                settings.address = pactor.path.clone();
                settings.baud_rate = Some(pactor.baudrate);
                settings.init_script =
                    Some(pactor.init_script.clone()).filter(|s| !s.is_empty());
                let init = descriptor.params().get_all(PARAM_INIT);
                if !init.is_empty() {
                    settings.init_commands = Some(init.join("\n"));
                }
            }
            Scheme::VaraHf | Scheme::VaraFm => {
                let vara = if self.scheme == Scheme::VaraHf {
                    &config.varahf
                } else {
                    &config.varafm
                };
                settings.address = format!("{}:{}", vara.host, vara.cmd_port);
                settings.data_address = Some(format!("{}:{}", vara.host, vara.data_port));
                settings.arq_bandwidth = vara.bandwidth.clone();
                settings.ptt_rig = ptt_rig(vara.ptt_control, &vara.rig);
            }
            Scheme::Ax25 => {
                settings.address = descriptor.host().to_string();
            }
            Scheme::SerialTnc => {
                settings.address = descriptor.host().to_string();
                settings.baud_rate = descriptor
                    .param(PARAM_SERIAL_BAUD)
                    .and_then(|v| v.parse().ok());
            }
            Scheme::Telnet => {}
        }
        settings
    }
}

/// With PTT control on, the rig name is passed through even when empty so
/// that an unset rig fails modem init instead of silently keying nothing.
fn ptt_rig(enabled: bool, rig: &str) -> Option<String> {
    enabled.then(|| rig.to_string())
}
