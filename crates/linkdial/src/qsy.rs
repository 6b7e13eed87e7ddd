//! QSY (tune the rig for a dial) and QSX (tune it back afterwards).
//!
//! [`qsy`] hands back a [`QsxGuard`] owning the [`QsxRevert`] that restores
//! the previous frequency. The guard exists from the moment the rig accepts
//! the new frequency, settle delay included, so a dial task that is dropped
//! or panics at any later point still gets its rig put back: an unconsumed
//! revert is spawned onto the runtime from `Drop`.

use std::sync::Arc;
use std::time::Duration;

use linkdial_core::error::{Error, Result};
use linkdial_core::rig::{Rig, RigLookup};
use linkdial_core::types::{Frequency, Scheme};
use tracing::{info, warn};

/// QSY and QSX delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QsyTimings {
    /// Wait after tuning before dialing, for the rig and modem to settle.
    pub settle: Duration,
    /// Wait before restoring the previous frequency.
    pub revert_delay: Duration,
}

impl Default for QsyTimings {
    fn default() -> Self {
        QsyTimings {
            settle: Duration::from_secs(3),
            revert_delay: Duration::from_secs(1),
        }
    }
}

/// A pending frequency restore. Consuming it with [`revert`](Self::revert)
/// is the only way to run it, so it runs at most once.
#[must_use = "the rig stays on the QSY frequency unless the revert is run"]
pub struct QsxRevert {
    scheme: Scheme,
    rig: Arc<dyn Rig>,
    previous: Frequency,
    delay: Duration,
}

impl QsxRevert {
    /// The frequency that will be restored.
    pub fn previous(&self) -> Frequency {
        self.previous
    }

    /// Wait the revert delay, then put the rig back. Failures are logged.
    pub async fn revert(self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        info!(scheme = %self.scheme, rig = %self.rig.name(), freq = %self.previous, "QSX");
        if let Err(e) = self.rig.set_frequency(self.previous).await {
            warn!(
                scheme = %self.scheme,
                rig = %self.rig.name(),
                error = %e,
                "Unable to restore previous frequency"
            );
        }
    }
}

impl std::fmt::Debug for QsxRevert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QsxRevert")
            .field("scheme", &self.scheme)
            .field("rig", &self.rig.name())
            .field("previous", &self.previous)
            .finish()
    }
}

/// Tune the rig bound to `scheme` to `target`.
///
/// On success the rig is on `target`, the settle delay has elapsed, and the
/// returned guard holds the frequency it was on before. On failure the rig
/// is left where it was (a failed set is followed by a best-effort restore).
pub async fn qsy(
    rigs: &dyn RigLookup,
    scheme: Scheme,
    target: Frequency,
    timings: QsyTimings,
) -> Result<QsxGuard> {
    let (name, rig) = rigs.rig_for(scheme)?.into_rig()?;

    let previous = rig
        .get_frequency()
        .await
        .map_err(|e| Error::Qsy(format!("unable to read frequency from '{name}': {e}")))?;

    info!(%scheme, rig = %name, freq = %target, "QSY");
    if let Err(e) = rig.set_frequency(target).await {
        if let Err(restore) = rig.set_frequency(previous).await {
            warn!(%scheme, rig = %name, error = %restore, "Unable to restore frequency after failed QSY");
        }
        return Err(Error::Qsy(format!("unable to set '{name}' to {target}: {e}")));
    }

    // Armed before settling: dropping this future mid-sleep must still QSX.
    let guard = QsxGuard::new(QsxRevert {
        scheme,
        rig,
        previous,
        delay: timings.revert_delay,
    });
    if !timings.settle.is_zero() {
        tokio::time::sleep(timings.settle).await;
    }
    Ok(guard)
}

/// Owns a [`QsxRevert`] until it is run.
#[derive(Debug)]
pub struct QsxGuard(Option<QsxRevert>);

impl QsxGuard {
    /// Guard a pending revert.
    pub fn new(revert: QsxRevert) -> Self {
        QsxGuard(Some(revert))
    }

    /// The frequency the rig goes back to.
    pub fn previous(&self) -> Option<Frequency> {
        self.0.as_ref().map(QsxRevert::previous)
    }

    /// Run the revert now and wait for it.
    pub async fn finish(mut self) {
        if let Some(revert) = self.0.take() {
            revert.revert().await;
        }
    }
}

impl Drop for QsxGuard {
    fn drop(&mut self) {
        let Some(revert) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(revert.revert());
            }
            Err(_) => warn!(
                scheme = %revert.scheme,
                freq = %revert.previous,
                "No runtime to restore frequency on"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rigs::RigTable;
    use linkdial_test_harness::MockRig;

    const NO_DELAY: QsyTimings = QsyTimings {
        settle: Duration::ZERO,
        revert_delay: Duration::ZERO,
    };

    fn khz(k: u64) -> Frequency {
        Frequency::from_hz(k * 1000)
    }

    fn table(rig: &Arc<MockRig>) -> RigTable {
        let mut table = RigTable::new();
        table.bind(Scheme::Ardop, "ic7300");
        table.insert("ic7300", rig.clone());
        table
    }

    #[tokio::test]
    async fn qsy_then_revert_restores_previous() {
        let rig = Arc::new(MockRig::new("ic7300", khz(7101)));
        let rigs = table(&rig);

        let guard = qsy(&rigs, Scheme::Ardop, khz(3585), NO_DELAY).await.unwrap();
        assert_eq!(rig.frequency(), khz(3585));
        assert_eq!(guard.previous(), Some(khz(7101)));

        guard.finish().await;
        assert_eq!(rig.frequency(), khz(7101));
        assert_eq!(rig.set_log(), vec![khz(3585), khz(7101)]);
    }

    #[tokio::test]
    async fn unbound_scheme_is_rig_not_loaded() {
        let rig = Arc::new(MockRig::new("ic7300", khz(7101)));
        let err = qsy(&table(&rig), Scheme::VaraHf, khz(3585), NO_DELAY)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::RigNotLoaded(_)));
        assert!(rig.set_log().is_empty());
    }

    #[tokio::test]
    async fn bound_but_unloaded_rig_is_named() {
        let mut rigs = RigTable::new();
        rigs.bind(Scheme::Ardop, "ft991");
        let err = qsy(&rigs, Scheme::Ardop, khz(3585), NO_DELAY)
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "rig 'ft991' not loaded");
    }

    #[tokio::test]
    async fn read_failure_leaves_rig_alone() {
        let rig = Arc::new(MockRig::new("ic7300", khz(7101)));
        rig.fail_get(true);
        let err = qsy(&table(&rig), Scheme::Ardop, khz(3585), NO_DELAY)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Qsy(_)));
        assert!(rig.set_log().is_empty());
    }

    #[tokio::test]
    async fn set_failure_attempts_restore() {
        let rig = Arc::new(MockRig::new("ic7300", khz(7101)));
        rig.fail_set(true);
        let err = qsy(&table(&rig), Scheme::Ardop, khz(3585), NO_DELAY)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Qsy(_)));
        assert_eq!(rig.set_log(), vec![khz(3585), khz(7101)]);
        assert_eq!(rig.frequency(), khz(7101));
    }

    async fn wait_for(rig: &MockRig, freq: Frequency) {
        for _ in 0..100 {
            if rig.frequency() == freq {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn guard_finish_reverts_once() {
        let rig = Arc::new(MockRig::new("ic7300", khz(7101)));
        let guard = qsy(&table(&rig), Scheme::Ardop, khz(3585), NO_DELAY).await.unwrap();

        guard.finish().await;
        tokio::task::yield_now().await;

        assert_eq!(rig.set_log(), vec![khz(3585), khz(7101)]);
    }

    #[tokio::test]
    async fn dropped_guard_reverts_in_background() {
        let rig = Arc::new(MockRig::new("ic7300", khz(7101)));
        let guard = qsy(&table(&rig), Scheme::Ardop, khz(3585), NO_DELAY).await.unwrap();

        drop(guard);
        wait_for(&rig, khz(7101)).await;

        assert_eq!(rig.frequency(), khz(7101));
        assert_eq!(rig.set_log(), vec![khz(3585), khz(7101)]);
    }

    #[tokio::test]
    async fn dropped_during_settle_still_reverts() {
        let rig = Arc::new(MockRig::new("ic7300", khz(7101)));
        let rigs = table(&rig);
        let timings = QsyTimings {
            settle: Duration::from_millis(300),
            revert_delay: Duration::ZERO,
        };

        let settling = tokio::time::timeout(
            Duration::from_millis(30),
            qsy(&rigs, Scheme::Ardop, khz(3585), timings),
        )
        .await;
        assert!(settling.is_err());

        wait_for(&rig, khz(7101)).await;
        assert_eq!(rig.frequency(), khz(7101));
        assert_eq!(rig.set_log(), vec![khz(3585), khz(7101)]);
    }
}
