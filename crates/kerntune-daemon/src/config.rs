use std::env;
use std::path::PathBuf;

use kerntune_core::paths::ServicePaths;

const DEFAULT_SOCKET: &str = "/run/kerntune/kerntuned.sock";
const DEFAULT_APPMGR_SOCKET: &str = "/run/kerntune/appmgr.sock";

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub socket_path: PathBuf,
    pub fs_root: PathBuf,
    pub sticky_dir: Option<PathBuf>,
    pub appmgr_socket: PathBuf,
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self {
            socket_path: env_path("KERNTUNE_SOCKET", DEFAULT_SOCKET),
            fs_root: env_path("KERNTUNE_FS_ROOT", "/"),
            sticky_dir: env::var_os("KERNTUNE_STICKY_DIR").map(PathBuf::from),
            appmgr_socket: env_path("KERNTUNE_APPMGR_SOCKET", DEFAULT_APPMGR_SOCKET),
        }
    }

    pub fn service_paths(&self) -> ServicePaths {
        let paths = ServicePaths::new(&self.fs_root);
        match &self.sticky_dir {
            Some(dir) => paths.with_sticky_dir(dir),
            None => paths,
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var_os(key)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
