//! In-memory [`Rig`] that records every frequency it is told to set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use linkdial_core::error::{Error, Result};
use linkdial_core::rig::Rig;
use linkdial_core::types::Frequency;

/// A rig whose VFO is a variable.
///
/// Failures can be injected per operation to exercise QSY error paths.
#[derive(Debug)]
pub struct MockRig {
    name: String,
    freq: Mutex<Frequency>,
    set_log: Mutex<Vec<Frequency>>,
    ptt: AtomicBool,
    fail_get: AtomicBool,
    fail_set: AtomicBool,
}

impl MockRig {
    /// Create a rig tuned to `initial`.
    pub fn new(name: &str, initial: Frequency) -> Self {
        MockRig {
            name: name.to_string(),
            freq: Mutex::new(initial),
            set_log: Mutex::new(Vec::new()),
            ptt: AtomicBool::new(false),
            fail_get: AtomicBool::new(false),
            fail_set: AtomicBool::new(false),
        }
    }

    /// The frequency the VFO is currently on.
    pub fn frequency(&self) -> Frequency {
        *self.freq.lock().unwrap()
    }

    /// Every frequency passed to `set_frequency`, in order (including failed ones).
    pub fn set_log(&self) -> Vec<Frequency> {
        self.set_log.lock().unwrap().clone()
    }

    /// Make `get_frequency` fail.
    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    /// Make `set_frequency` fail.
    pub fn fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    /// Current PTT state.
    pub fn ptt(&self) -> bool {
        self.ptt.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Rig for MockRig {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_frequency(&self) -> Result<Frequency> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Error::Timeout);
        }
        Ok(self.frequency())
    }

    async fn set_frequency(&self, freq: Frequency) -> Result<()> {
        self.set_log.lock().unwrap().push(freq);
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(Error::Protocol("RPRT -1".into()));
        }
        *self.freq.lock().unwrap() = freq;
        Ok(())
    }

    async fn get_ptt(&self) -> Result<bool> {
        Ok(self.ptt())
    }

    async fn set_ptt(&self, on: bool) -> Result<()> {
        self.ptt.store(on, Ordering::SeqCst);
        Ok(())
    }
}
