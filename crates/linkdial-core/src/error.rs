//! Error types for linkdial.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. The first six variants form the dial
//! taxonomy the orchestrator reasons about; the remainder are plumbing
//! errors raised by transports and rig clients.

/// The error type for all linkdial operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection descriptor (or an alias it resolves through) is malformed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A modem could not be opened, configured, or wired to its PTT rig.
    #[error("modem initialization failed: {0}")]
    Init(String),

    /// A rig is configured for a transport but no handle is loaded for it.
    ///
    /// An empty name means no rig is bound to the transport at all.
    #[error("rig '{0}' not loaded")]
    RigNotLoaded(String),

    /// Commanding the rig to the target frequency failed.
    #[error("QSY failed: {0}")]
    Qsy(String),

    /// The transport-level dial failed.
    #[error("dial failed: {0}")]
    Dial(String),

    /// The dial was aborted by the operator.
    #[error("cancelled")]
    Cancelled,

    /// The configuration file is malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A transport-level error (TCP socket, serial port).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (unexpected rigctld reply, bad modem response).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a response.
    #[error("timeout waiting for response")]
    Timeout,

    /// The requested operation is not supported by this backend.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// No connection has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error represents an operator-initiated abort rather
    /// than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
