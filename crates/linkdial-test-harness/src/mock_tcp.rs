//! A scripted `rigctld` (or telnet gateway) on a random localhost port.
//!
//! The script is loaded with [`on`](MockTcpServer::on) before
//! [`start`](MockTcpServer::start); the server then accepts exactly one
//! client and answers each command line in order.
//!
//! ```
//! use linkdial_test_harness::MockTcpServer;
//!
//! # async fn example() -> linkdial_core::Result<()> {
//! let mut rigctld = MockTcpServer::bind().await?;
//! rigctld.on("f\n", "3585000\n");
//! rigctld.start();
//! // point a RigctldRig at rigctld.addr() ...
//! rigctld.wait().await.map_err(linkdial_core::Error::Protocol)?;
//! # Ok(())
//! # }
//! ```

use linkdial_core::error::{Error, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

type Script = Vec<(Vec<u8>, Vec<u8>)>;

/// A single-client scripted TCP peer.
pub struct MockTcpServer {
    addr: String,
    listener: Option<TcpListener>,
    script: Script,
    task: Option<JoinHandle<std::result::Result<(), String>>>,
}

impl MockTcpServer {
    /// Listen on `127.0.0.1:0`. Clients that connect before `start` wait in
    /// the accept backlog.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::Transport(format!("mock server bind: {e}")))?;
        let addr = listener.local_addr()?.to_string();
        Ok(MockTcpServer {
            addr,
            listener: Some(listener),
            script: Vec::new(),
            task: None,
        })
    }

    /// Answer `command` with `reply`.
    pub fn on(&mut self, command: &str, reply: &str) {
        self.script
            .push((command.as_bytes().to_vec(), reply.as_bytes().to_vec()));
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Serve the script in the background. Calling it twice does nothing.
    pub fn start(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let script = std::mem::take(&mut self.script);
        self.task = Some(tokio::spawn(async move {
            let (stream, _) = listener.accept().await.map_err(|e| format!("accept: {e}"))?;
            serve(stream, script).await
        }));
    }

    /// Wait for the client to hang up; `Err` describes the first script
    /// mismatch.
    pub async fn wait(self) -> std::result::Result<(), String> {
        let Some(task) = self.task else {
            return Ok(());
        };
        task.await.map_err(|e| format!("mock server task: {e}"))?
    }
}

async fn serve(mut stream: TcpStream, script: Script) -> std::result::Result<(), String> {
    for (step, (command, reply)) in script.into_iter().enumerate() {
        let mut got = vec![0u8; command.len()];
        stream
            .read_exact(&mut got)
            .await
            .map_err(|e| format!("step {step}: {e}"))?;
        if got != command {
            return Err(format!(
                "step {step}: wanted {:?}, client sent {:?}",
                String::from_utf8_lossy(&command),
                String::from_utf8_lossy(&got)
            ));
        }
        stream
            .write_all(&reply)
            .await
            .map_err(|e| format!("step {step}: {e}"))?;
    }

    // Script done: hold the line until the client leaves.
    let mut scratch = [0u8; 128];
    loop {
        match stream.read(&mut scratch).await {
            Ok(0) | Err(_) => return Ok(()),
            Ok(_) => {}
        }
    }
}
