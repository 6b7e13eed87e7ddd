//! Transport implementations for linkdial.
//!
//! This crate provides the collaborators that need no modem firmware:
//!
//! - [`TcpTransport`]: byte transport over TCP for control channels
//! - [`TelnetDialer`]: the dialer behind the `telnet` scheme
//! - [`RigctldRig`]: a [`Rig`](linkdial_core::Rig) driven through hamlib `rigctld`
//! - [`NetworkModems`]: a [`ModemFactory`](linkdial_core::ModemFactory) for
//!   the network-only schemes
//!
//! # Example
//!
//! ```no_run
//! use linkdial_transport::RigctldRig;
//! use linkdial_core::{Frequency, Rig};
//!
//! # async fn example() -> linkdial_core::Result<()> {
//! let rig = RigctldRig::connect("ic7300", "localhost:4532").await?;
//! rig.set_frequency(Frequency::from_hz(3_585_000)).await?;
//! # Ok(())
//! # }
//! ```

pub mod network;
pub mod rigctld;
pub mod tcp;
pub mod telnet;

pub use network::NetworkModems;
pub use rigctld::RigctldRig;
pub use tcp::TcpTransport;
pub use telnet::TelnetDialer;
