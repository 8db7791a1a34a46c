use std::time::Instant;

use kerntune_core::paths::ServicePaths;

use crate::config::DaemonConfig;

pub struct DaemonState {
    pub config: DaemonConfig,
    pub paths: ServicePaths,
    pub version: String,
    started: Instant,
}

impl DaemonState {
    pub fn new(config: DaemonConfig) -> Self {
        let paths = config.service_paths();
        Self {
            config,
            paths,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started: Instant::now(),
        }
    }

    pub fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
