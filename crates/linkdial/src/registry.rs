//! The modem registry: at most one live handle per transport scheme.
//!
//! A handle is reused while it answers its liveness probe and was opened
//! with the settings the current request needs. Otherwise it is closed and
//! replaced. The registry lives behind the dialer's async mutex, so opens
//! and closes for one scheme never interleave.

use std::collections::HashMap;
use std::sync::Arc;

use linkdial_core::error::{Error, Result};
use linkdial_core::modem::{Modem, ModemFactory, ModemSettings};
use linkdial_core::rig::{Rig, RigLookup};
use linkdial_core::types::Scheme;
use tracing::{debug, info, warn};

struct Entry {
    modem: Arc<dyn Modem>,
    settings: ModemSettings,
}

/// Live modem handles, keyed by scheme.
pub struct ModemRegistry {
    factory: Arc<dyn ModemFactory>,
    entries: HashMap<Scheme, Entry>,
}

impl ModemRegistry {
    /// Create an empty registry that opens handles through `factory`.
    pub fn new(factory: Arc<dyn ModemFactory>) -> Self {
        ModemRegistry {
            factory,
            entries: HashMap::new(),
        }
    }

    /// Return a healthy handle for `scheme` opened with `settings`,
    /// opening or reopening one as needed.
    ///
    /// On failure nothing new is registered: a freshly opened handle that
    /// fails configuration is closed before the error is returned.
    pub async fn ensure(
        &mut self,
        scheme: Scheme,
        settings: &ModemSettings,
        rigs: &dyn RigLookup,
    ) -> Result<Arc<dyn Modem>> {
        if let Some(entry) = self.entries.get(&scheme) {
            if entry.settings == *settings {
                match entry.modem.ping().await {
                    Ok(()) => return Ok(Arc::clone(&entry.modem)),
                    Err(e) => {
                        warn!(%scheme, error = %e, "Modem not responding; reopening");
                    }
                }
            } else {
                debug!(%scheme, "Modem settings changed; reopening");
            }
        }

        let ptt_rig = match &settings.ptt_rig {
            Some(name) => Some(rigs.rig_named(name).ok_or_else(|| {
                Error::Init(format!(
                    "unable to set PTT rig '{name}': not defined or not loaded"
                ))
            })?),
            None => None,
        };

        if let Some(old) = self.entries.remove(&scheme) {
            close_handle(scheme, &old.modem).await;
        }

        let modem = self
            .factory
            .open(scheme, settings)
            .await
            .map_err(|e| Error::Init(format!("{scheme} modem: {e}")))?;

        if let Err(e) = configure(&modem, settings, ptt_rig).await {
            close_handle(scheme, &modem).await;
            return Err(e);
        }

        match modem.version().await {
            Ok(version) => info!(%scheme, %version, "Modem ready"),
            Err(_) => info!(%scheme, "Modem ready"),
        }

        self.entries.insert(
            scheme,
            Entry {
                modem: Arc::clone(&modem),
                settings: settings.clone(),
            },
        );
        Ok(modem)
    }

    /// The registered handle for `scheme`, if any.
    pub fn get(&self, scheme: Scheme) -> Option<Arc<dyn Modem>> {
        self.entries.get(&scheme).map(|e| Arc::clone(&e.modem))
    }

    /// Whether a handle is registered for `scheme`.
    pub fn is_registered(&self, scheme: Scheme) -> bool {
        self.entries.contains_key(&scheme)
    }

    /// Close and forget every handle.
    pub async fn close_all(&mut self) {
        for (scheme, entry) in self.entries.drain() {
            close_handle(scheme, &entry.modem).await;
        }
    }
}

async fn configure(
    modem: &Arc<dyn Modem>,
    settings: &ModemSettings,
    ptt_rig: Option<Arc<dyn Rig>>,
) -> Result<()> {
    let scheme = modem.scheme();
    if let Some(bandwidth) = &settings.arq_bandwidth {
        modem
            .set_arq_bandwidth(bandwidth)
            .await
            .map_err(|e| Error::Init(format!("unable to set {scheme} ARQ bandwidth: {e}")))?;
    }
    if let Some(cwid) = settings.cwid {
        modem
            .set_cwid(cwid)
            .await
            .map_err(|e| Error::Init(format!("unable to set {scheme} CW ID: {e}")))?;
    }
    if let Some(rig) = ptt_rig {
        let name = rig.name().to_string();
        modem
            .set_ptt(rig)
            .await
            .map_err(|e| Error::Init(format!("unable to set {scheme} PTT rig '{name}': {e}")))?;
        info!(%scheme, rig = %name, "PTT control enabled");
    }
    Ok(())
}

async fn close_handle(scheme: Scheme, modem: &Arc<dyn Modem>) {
    match modem.close().await {
        Ok(()) => debug!(%scheme, "Modem closed"),
        Err(e) => warn!(%scheme, error = %e, "Error closing modem"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rigs::RigTable;
    use linkdial_core::types::Frequency;
    use linkdial_test_harness::{MockModemFactory, MockRig};

    fn setup() -> (Arc<MockModemFactory>, ModemRegistry) {
        let factory = Arc::new(MockModemFactory::new());
        let registry = ModemRegistry::new(factory.clone());
        (factory, registry)
    }

    fn settings(address: &str) -> ModemSettings {
        ModemSettings {
            mycall: "LA5NTA".into(),
            address: address.into(),
            ..ModemSettings::default()
        }
    }

    #[tokio::test]
    async fn healthy_handle_is_reused() {
        let (factory, mut registry) = setup();
        let rigs = RigTable::new();

        let a = registry.ensure(Scheme::Ardop, &settings("a"), &rigs).await.unwrap();
        let b = registry.ensure(Scheme::Ardop, &settings("a"), &rigs).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.open_count(), 1);
        assert!(registry.is_registered(Scheme::Ardop));
        assert!(!registry.is_registered(Scheme::VaraHf));
    }

    #[tokio::test]
    async fn unhealthy_handle_is_closed_once_and_replaced() {
        let (factory, mut registry) = setup();
        let rigs = RigTable::new();

        registry.ensure(Scheme::Ardop, &settings("a"), &rigs).await.unwrap();
        let first = factory.last().unwrap();
        first.set_healthy(false);

        registry.ensure(Scheme::Ardop, &settings("a"), &rigs).await.unwrap();
        assert_eq!(factory.open_count(), 2);
        assert_eq!(first.close_count(), 1);

        registry.ensure(Scheme::Ardop, &settings("a"), &rigs).await.unwrap();
        assert_eq!(factory.open_count(), 2);
        assert_eq!(first.close_count(), 1);
    }

    #[tokio::test]
    async fn changed_settings_force_reopen() {
        let (factory, mut registry) = setup();
        let rigs = RigTable::new();

        registry.ensure(Scheme::Pactor, &settings("a"), &rigs).await.unwrap();
        registry.ensure(Scheme::Pactor, &settings("b"), &rigs).await.unwrap();

        let opened = factory.opened_for(Scheme::Pactor);
        assert_eq!(opened.len(), 2);
        assert_eq!(opened[0].close_count(), 1);
        assert_eq!(opened[1].settings().address, "b");
    }

    #[tokio::test]
    async fn open_failure_registers_nothing() {
        let (factory, mut registry) = setup();
        factory.fail_open(Scheme::VaraHf);

        let err = registry
            .ensure(Scheme::VaraHf, &settings("a"), &RigTable::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Init(_)));
        assert!(registry.get(Scheme::VaraHf).is_none());
    }

    #[tokio::test]
    async fn post_open_configuration_is_applied() {
        let (factory, mut registry) = setup();
        let mut rigs = RigTable::new();
        rigs.insert("ic7300", Arc::new(MockRig::new("ic7300", Frequency::from_hz(3_585_000))));

        let s = ModemSettings {
            arq_bandwidth: Some("500MAX".into()),
            cwid: Some(false),
            ptt_rig: Some("ic7300".into()),
            ..settings("a")
        };
        registry.ensure(Scheme::Ardop, &s, &rigs).await.unwrap();

        let modem = factory.last().unwrap();
        assert_eq!(modem.arq_bandwidth().as_deref(), Some("500MAX"));
        assert_eq!(modem.cwid(), Some(false));
        assert_eq!(modem.ptt_rig().as_deref(), Some("ic7300"));
    }

    #[tokio::test]
    async fn missing_ptt_rig_fails_before_open() {
        let (factory, mut registry) = setup();
        let s = ModemSettings {
            ptt_rig: Some("ic7300".into()),
            ..settings("a")
        };

        let err = registry
            .ensure(Scheme::Ardop, &s, &RigTable::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Init(ref m) if m.contains("ic7300")));
        assert_eq!(factory.open_count(), 0);
        assert!(!registry.is_registered(Scheme::Ardop));
    }

    #[tokio::test]
    async fn rejected_configuration_closes_new_handle() {
        let factory = Arc::new(RejectingFactory(MockModemFactory::new()));
        let mut registry = ModemRegistry::new(factory.clone());
        let s = ModemSettings {
            arq_bandwidth: Some("2300".into()),
            ..settings("a")
        };

        let err = registry
            .ensure(Scheme::VaraHf, &s, &RigTable::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Init(_)));
        assert!(!registry.is_registered(Scheme::VaraHf));
        assert_eq!(factory.0.last().unwrap().close_count(), 1);
    }

    #[tokio::test]
    async fn close_all_closes_each_handle_once() {
        let (factory, mut registry) = setup();
        let rigs = RigTable::new();
        registry.ensure(Scheme::Ardop, &settings("a"), &rigs).await.unwrap();
        registry.ensure(Scheme::Telnet, &settings(""), &rigs).await.unwrap();

        registry.close_all().await;
        registry.close_all().await;

        assert!(factory.opened().iter().all(|m| m.close_count() == 1));
        assert!(!registry.is_registered(Scheme::Ardop));
    }

    /// Opens mock modems that reject every configuration command.
    struct RejectingFactory(MockModemFactory);

    #[async_trait::async_trait]
    impl ModemFactory for RejectingFactory {
        async fn open(&self, scheme: Scheme, settings: &ModemSettings) -> Result<Arc<dyn Modem>> {
            let modem = self.0.open(scheme, settings).await?;
            if let Some(mock) = self.0.last() {
                mock.set_reject_config(true);
            }
            Ok(modem)
        }
    }
}
