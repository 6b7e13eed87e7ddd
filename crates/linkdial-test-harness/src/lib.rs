//! linkdial-test-harness: Mocks and recorders for testing linkdial.
//!
//! - [`MockTransport`] and [`MockTcpServer`] script line-protocol peers such
//!   as `rigctld`.
//! - [`MockRig`] is an in-memory VFO with failure injection.
//! - [`MockModem`] / [`MockModemFactory`] count open, close, and dial calls
//!   and can hang a dial until it is cancelled.
//! - [`RecordingStatus`], [`RecordingEventLog`], and [`RecordingExchange`]
//!   capture what the orchestrator reports.

pub mod mock_modem;
pub mod mock_rig;
pub mod mock_tcp;
pub mod mock_transport;
pub mod recorders;

pub use mock_modem::{DialBehavior, MockModem, MockModemFactory};
pub use mock_rig::MockRig;
pub use mock_tcp::MockTcpServer;
pub use mock_transport::MockTransport;
pub use recorders::{RecordingEventLog, RecordingExchange, RecordingStatus};
