//! TCP congestion-control tunables.

use crate::paths::ServicePaths;
use crate::services::error::ServiceError;
use crate::sysfs;

pub fn congestion_control(paths: &ServicePaths) -> Result<Vec<String>, ServiceError> {
    sysfs::read_lines(&paths.tcp_congestion_control())
}

pub fn allowed_congestion_control(paths: &ServicePaths) -> Result<Vec<String>, ServiceError> {
    sysfs::read_lines(&paths.tcp_allowed_congestion_control())
}

pub fn available_congestion_control(paths: &ServicePaths) -> Result<Vec<String>, ServiceError> {
    sysfs::read_lines(&paths.tcp_available_congestion_control())
}

/// Select a congestion-control algorithm. The value is token-validated
/// before the write.
pub fn set_congestion_control(paths: &ServicePaths, value: &str) -> Result<(), ServiceError> {
    sysfs::write_value(&paths.tcp_dir(), "tcp_congestion_control", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tcp_root() -> (tempfile::TempDir, ServicePaths) {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("proc/sys/net/ipv4")).unwrap();
        let paths = ServicePaths::new(root.path());
        (root, paths)
    }

    #[test]
    fn set_then_get_round_trips() {
        let (_root, paths) = tcp_root();
        set_congestion_control(&paths, "westwood").unwrap();
        assert_eq!(
            congestion_control(&paths).unwrap(),
            vec!["westwood".to_string()]
        );
    }

    #[test]
    fn rejects_non_token_values() {
        let (root, paths) = tcp_root();
        let err = set_congestion_control(&paths, "cubic\nmalicious").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(!root
            .path()
            .join("proc/sys/net/ipv4/tcp_congestion_control")
            .exists());
    }
}
