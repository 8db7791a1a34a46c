mod client;

pub use client::{ClientConfig, DaemonClient, DaemonClientInfo};
