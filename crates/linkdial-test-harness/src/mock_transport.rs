//! Scripted line-protocol peer for testing `rigctld`-style clients.
//!
//! Each [`on`](MockTransport::on) entry pairs one command line the client
//! must send with the reply the peer answers. Commands must arrive in
//! script order; replies are served to `receive` in as many chunks as the
//! caller's buffer requires.
//!
//! ```
//! use linkdial_test_harness::MockTransport;
//!
//! let mut peer = MockTransport::new();
//! peer.on("f\n", "3585000\n");
//! peer.on("F 7101000\n", "RPRT 0\n");
//! assert_eq!(peer.unplayed(), 2);
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use linkdial_core::error::{Error, Result};
use linkdial_core::transport::Transport;

/// A [`Transport`] that plays back a command/reply script.
#[derive(Debug)]
pub struct MockTransport {
    script: VecDeque<(Vec<u8>, Vec<u8>)>,
    inbox: VecDeque<u8>,
    commands: Vec<String>,
    open: bool,
}

impl MockTransport {
    /// An open peer with an empty script.
    pub fn new() -> Self {
        MockTransport {
            script: VecDeque::new(),
            inbox: VecDeque::new(),
            commands: Vec::new(),
            open: true,
        }
    }

    /// Answer `command` with `reply`.
    pub fn on(&mut self, command: &str, reply: &str) {
        self.script
            .push_back((command.as_bytes().to_vec(), reply.as_bytes().to_vec()));
    }

    /// Every command the client sent, lossily decoded.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Script entries not yet played.
    pub fn unplayed(&self) -> usize {
        self.script.len()
    }

    /// Simulate the peer hanging up (or coming back).
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(Error::NotConnected);
        }
        self.commands.push(String::from_utf8_lossy(data).into_owned());

        let Some((command, reply)) = self.script.pop_front() else {
            return Err(Error::Protocol(format!(
                "unscripted command {:?}",
                String::from_utf8_lossy(data)
            )));
        };
        if command != data {
            return Err(Error::Protocol(format!(
                "expected command {:?}, got {:?}",
                String::from_utf8_lossy(&command),
                String::from_utf8_lossy(data)
            )));
        }
        self.inbox.extend(reply);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.open {
            return Err(Error::NotConnected);
        }
        if self.inbox.is_empty() {
            return Err(Error::Timeout);
        }
        let n = buf.len().min(self.inbox.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbox.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        self.inbox.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.open
    }
}
