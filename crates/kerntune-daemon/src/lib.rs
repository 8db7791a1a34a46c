pub mod appmgr;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod framing;
pub mod server;
pub mod state;
pub mod telemetry;
pub mod validation;
