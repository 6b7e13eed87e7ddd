//! Rig control through a hamlib `rigctld` daemon.
//!
//! `rigctld` speaks a newline-terminated text protocol on TCP port 4532.
//! Only the four commands linkdial needs are implemented:
//!
//! | Command    | Reply            | Purpose              |
//! |------------|------------------|----------------------|
//! | `f`        | `14074000`       | read VFO frequency   |
//! | `F <hz>`   | `RPRT 0`         | set VFO frequency    |
//! | `t`        | `0` / `1`        | read PTT             |
//! | `T <0/1>`  | `RPRT 0`         | set PTT              |
//!
//! A negative `RPRT` code is a hamlib error.

use std::time::Duration;

use async_trait::async_trait;
use linkdial_core::error::{Error, Result};
use linkdial_core::rig::Rig;
use linkdial_core::transport::Transport;
use linkdial_core::types::Frequency;
use tokio::sync::Mutex;

use crate::tcp::TcpTransport;

/// Default `rigctld` TCP port.
pub const DEFAULT_RIGCTLD_PORT: u16 = 4532;

const MAX_REPLY_LEN: usize = 1024;

/// A [`Rig`] backed by a `rigctld` connection.
///
/// Commands are serialized over one transport; each command waits for its
/// one-line reply before the next is sent.
pub struct RigctldRig {
    name: String,
    io: Mutex<Box<dyn Transport>>,
    command_timeout: Duration,
}

impl RigctldRig {
    /// Connect to `rigctld` at `addr` (`host:port`).
    pub async fn connect(name: &str, addr: &str) -> Result<Self> {
        let transport = TcpTransport::connect(addr).await?;
        tracing::info!(rig = %name, addr = %addr, "Connected to rigctld");
        Ok(Self::with_transport(name, Box::new(transport)))
    }

    /// Wrap an existing transport (used with `MockTransport` in tests).
    pub fn with_transport(name: &str, transport: Box<dyn Transport>) -> Self {
        RigctldRig {
            name: name.to_string(),
            io: Mutex::new(transport),
            command_timeout: Duration::from_secs(2),
        }
    }

    /// Set how long to wait for each reply (default: 2s).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Send one command and return its reply line without the terminator.
    async fn command(&self, cmd: &str) -> Result<String> {
        let mut io = self.io.lock().await;
        io.send(format!("{cmd}\n").as_bytes()).await?;

        let mut line = Vec::new();
        let mut buf = [0u8; 128];
        loop {
            let n = io.receive(&mut buf, self.command_timeout).await?;
            line.extend_from_slice(&buf[..n]);
            if let Some(pos) = line.iter().position(|&b| b == b'\n') {
                line.truncate(pos);
                break;
            }
            if line.len() > MAX_REPLY_LEN {
                return Err(Error::Protocol("rigctld reply too long".into()));
            }
        }

        let reply = String::from_utf8(line)
            .map_err(|_| Error::Protocol("rigctld reply is not UTF-8".into()))?;
        let reply = reply.trim_end_matches('\r').to_string();
        tracing::trace!(rig = %self.name, cmd = %cmd, reply = %reply, "rigctld exchange");
        Ok(reply)
    }

    /// Send a set command and check its `RPRT` status.
    async fn set_command(&self, cmd: &str) -> Result<()> {
        let reply = self.command(cmd).await?;
        check_report(&reply)
    }
}

fn check_report(reply: &str) -> Result<()> {
    match reply.strip_prefix("RPRT ").map(str::trim) {
        Some("0") => Ok(()),
        Some(code) => Err(Error::Protocol(format!("rigctld error RPRT {code}"))),
        None => Err(Error::Protocol(format!("unexpected rigctld reply: {reply}"))),
    }
}

fn reject_report(reply: &str) -> Result<()> {
    if reply.starts_with("RPRT ") {
        check_report(reply)?;
        return Err(Error::Protocol(format!("unexpected rigctld reply: {reply}")));
    }
    Ok(())
}

#[async_trait]
impl Rig for RigctldRig {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_frequency(&self) -> Result<Frequency> {
        let reply = self.command("f").await?;
        reject_report(&reply)?;
        let hz: f64 = reply
            .trim()
            .parse()
            .map_err(|_| Error::Protocol(format!("invalid frequency reply: {reply}")))?;
        Ok(Frequency::from_hz(hz.round() as u64))
    }

    async fn set_frequency(&self, freq: Frequency) -> Result<()> {
        self.set_command(&format!("F {}", freq.hz())).await
    }

    async fn get_ptt(&self) -> Result<bool> {
        let reply = self.command("t").await?;
        reject_report(&reply)?;
        match reply.trim() {
            "0" => Ok(false),
            "1" | "2" | "3" => Ok(true),
            other => Err(Error::Protocol(format!("invalid PTT reply: {other}"))),
        }
    }

    async fn set_ptt(&self, on: bool) -> Result<()> {
        self.set_command(if on { "T 1" } else { "T 0" }).await
    }
}
