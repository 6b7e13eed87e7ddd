//! The `Rig` trait and rig lookup -- the radio-control boundary.
//!
//! linkdial does not own radios. It only needs to read and set the
//! frequency of the rig bound to a transport (for QSY/QSX) and to hand a
//! rig to a modem for push-to-talk keying. Concrete rigs live in
//! `linkdial-transport` (hamlib `rigctld`) or in the application.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::{Frequency, Scheme};

/// Asynchronous frequency and PTT control for a transceiver.
#[async_trait]
pub trait Rig: Send + Sync {
    /// Return a human-readable name for logging (e.g. the configured rig name).
    fn name(&self) -> &str;

    /// Get the current VFO frequency.
    async fn get_frequency(&self) -> Result<Frequency>;

    /// Set the current VFO frequency.
    async fn set_frequency(&self, freq: Frequency) -> Result<()>;

    /// Get the current PTT state.
    async fn get_ptt(&self) -> Result<bool> {
        Err(Error::Unsupported("PTT readback not supported".into()))
    }

    /// Key (`true`) or unkey (`false`) the transmitter.
    async fn set_ptt(&self, on: bool) -> Result<()>;
}

/// The outcome of resolving the rig bound to a transport.
#[derive(Clone)]
pub enum RigBinding {
    /// No rig is configured for the transport.
    Unbound,
    /// A rig name is configured but no handle with that name is loaded.
    NotLoaded {
        /// The configured rig name.
        name: String,
    },
    /// The rig is configured and loaded.
    Loaded {
        /// The configured rig name.
        name: String,
        /// The loaded rig handle.
        rig: Arc<dyn Rig>,
    },
}

impl RigBinding {
    /// The loaded rig, or [`Error::RigNotLoaded`] naming what was missing.
    pub fn into_rig(self) -> Result<(String, Arc<dyn Rig>)> {
        match self {
            RigBinding::Loaded { name, rig } => Ok((name, rig)),
            RigBinding::NotLoaded { name } => Err(Error::RigNotLoaded(name)),
            RigBinding::Unbound => Err(Error::RigNotLoaded(String::new())),
        }
    }
}

impl fmt::Debug for RigBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RigBinding::Unbound => f.write_str("Unbound"),
            RigBinding::NotLoaded { name } => {
                f.debug_struct("NotLoaded").field("name", name).finish()
            }
            RigBinding::Loaded { name, .. } => {
                f.debug_struct("Loaded").field("name", name).finish_non_exhaustive()
            }
        }
    }
}

/// Resolves rig bindings. Implemented by the application's rig table.
pub trait RigLookup: Send + Sync {
    /// Resolve the rig bound to a transport scheme.
    ///
    /// Returns `Err` only when the lookup itself fails (e.g. the binding
    /// table could not be read); a missing rig is reported through
    /// [`RigBinding`].
    fn rig_for(&self, scheme: Scheme) -> Result<RigBinding>;

    /// Look up a loaded rig by its configured name (used for PTT wiring).
    fn rig_named(&self, name: &str) -> Option<Arc<dyn Rig>>;
}
