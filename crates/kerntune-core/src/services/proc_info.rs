//! Read-only `/proc` and thermal-zone views.

use crate::paths::ServicePaths;
use crate::services::error::ServiceError;
use crate::sysfs;

pub fn cpuinfo(paths: &ServicePaths) -> Result<Vec<String>, ServiceError> {
    sysfs::read_lines(&paths.proc_cpuinfo())
}

pub fn meminfo(paths: &ServicePaths) -> Result<Vec<String>, ServiceError> {
    sysfs::read_lines(&paths.proc_meminfo())
}

pub fn loadavg(paths: &ServicePaths) -> Result<Vec<String>, ServiceError> {
    sysfs::read_lines(&paths.proc_loadavg())
}

/// Current temperature of the first thermal zone, in the kernel's native
/// unit (millidegrees on modern kernels).
pub fn cpu_temp(paths: &ServicePaths) -> Result<i64, ServiceError> {
    sysfs::read_integer(&paths.cpu_temp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_proc_files_under_root() {
        let root = tempfile::tempdir().unwrap();
        let proc_dir = root.path().join("proc");
        fs::create_dir_all(&proc_dir).unwrap();
        fs::write(proc_dir.join("loadavg"), "0.18 0.12 0.09 1/123 456\n").unwrap();

        let paths = ServicePaths::new(root.path());
        assert_eq!(
            loadavg(&paths).unwrap(),
            vec!["0.18 0.12 0.09 1/123 456".to_string()]
        );
    }

    #[test]
    fn cpu_temp_is_an_integer() {
        let root = tempfile::tempdir().unwrap();
        let zone = root.path().join("sys/class/thermal/thermal_zone0");
        fs::create_dir_all(&zone).unwrap();
        fs::write(zone.join("temp"), "41000\n").unwrap();

        let paths = ServicePaths::new(root.path());
        assert_eq!(cpu_temp(&paths).unwrap(), 41000);
    }
}
