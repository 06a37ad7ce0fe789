//! Actuator layer
//!
//! Trait-based abstraction over the remote management controller, with a
//! resilient client on top. The transport executes single text commands;
//! the dialect renders and classifies them; the client owns retry,
//! session recovery, and serialization.

pub mod client;
pub mod command;
pub mod dialect;
pub mod retry;
pub mod transport;

pub use client::ActuatorClient;
pub use command::ActuatorCommand;
pub use dialect::{Dialect, OutputClass};
pub use retry::RetryPolicy;
pub use transport::{Endpoint, IpmiTransport, SshTransport, Transport};
