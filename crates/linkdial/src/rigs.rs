//! The rig table: loaded rig handles and the transport bindings to them.

use std::collections::HashMap;
use std::sync::Arc;

use linkdial_core::error::Result;
use linkdial_core::rig::{Rig, RigBinding, RigLookup};
use linkdial_core::types::Scheme;
use linkdial_transport::RigctldRig;
use tracing::{info, warn};

use crate::config::Config;

/// Named rig handles plus the scheme-to-rig-name bindings.
///
/// A scheme may be bound to a rig name whose handle never loaded (the
/// daemon was down at startup); lookups then report
/// [`RigBinding::NotLoaded`] so QSY fails with the rig's name.
#[derive(Default)]
pub struct RigTable {
    rigs: HashMap<String, Arc<dyn Rig>>,
    bindings: HashMap<Scheme, String>,
}

impl RigTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with the configured bindings and no rigs loaded.
    pub fn from_config(config: &Config) -> Self {
        let mut table = Self::new();
        for scheme in Scheme::ALL {
            if let Some(name) = config.rig_name_for(scheme) {
                table.bind(scheme, name);
            }
        }
        table
    }

    /// Build the table from config and connect every `[hamlib_rigs]` entry.
    ///
    /// Rigs that cannot be reached are logged and left unloaded.
    pub async fn connect_rigctld(config: &Config) -> Self {
        let mut table = Self::from_config(config);
        for (name, rig) in &config.hamlib_rigs {
            if !rig.network.eq_ignore_ascii_case("tcp") {
                warn!(rig = %name, network = %rig.network, "Unsupported rig network; rig not loaded");
                continue;
            }
            match RigctldRig::connect(name, &rig.address).await {
                Ok(handle) => {
                    info!(rig = %name, address = %rig.address, "Rig loaded");
                    table.insert(name, Arc::new(handle));
                }
                Err(e) => {
                    warn!(rig = %name, address = %rig.address, error = %e, "Unable to load rig");
                }
            }
        }
        table
    }

    /// Bind a scheme to a rig name.
    pub fn bind(&mut self, scheme: Scheme, name: &str) {
        self.bindings.insert(scheme, name.to_string());
    }

    /// Add (or replace) a loaded rig.
    pub fn insert(&mut self, name: &str, rig: Arc<dyn Rig>) {
        self.rigs.insert(name.to_string(), rig);
    }

    /// Names of the loaded rigs, sorted.
    pub fn loaded(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rigs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl RigLookup for RigTable {
    fn rig_for(&self, scheme: Scheme) -> Result<RigBinding> {
        let Some(name) = self.bindings.get(&scheme) else {
            return Ok(RigBinding::Unbound);
        };
        Ok(match self.rigs.get(name) {
            Some(rig) => RigBinding::Loaded {
                name: name.clone(),
                rig: Arc::clone(rig),
            },
            None => RigBinding::NotLoaded { name: name.clone() },
        })
    }

    fn rig_named(&self, name: &str) -> Option<Arc<dyn Rig>> {
        self.rigs.get(name).cloned()
    }
}
