//! Relayer client.
//!
//! Wires the REST client, order workflow and stream transport together from a
//! single TOML configuration.

pub mod client;
pub mod config;
pub mod error;
pub mod watch;

pub use client::{OceanClient, Workflow};
pub use config::{AuthConfig, ClientConfig, SignerConfig};
pub use error::{ClientError, ClientResult};
pub use watch::WatchTarget;
