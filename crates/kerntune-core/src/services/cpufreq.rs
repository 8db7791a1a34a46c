//! CPU frequency scaling parameters.
//!
//! Generic parameters live directly in the cpufreq directory; each governor
//! keeps its own parameters in a subdirectory named after it. Writing
//! `scaling_governor` selects which subdirectory the governor-specific
//! writes go to.

use kerntune_ipc::{ParamInfo, ParamWrite};

use crate::paths::ServicePaths;
use crate::services::error::ServiceError;
use crate::sysfs;
use crate::validate::validate_token;

pub fn scaling_cur_freq(paths: &ServicePaths) -> Result<i64, ServiceError> {
    sysfs::read_integer(&paths.scaling_cur_freq())
}

pub fn scaling_governor(paths: &ServicePaths) -> Result<String, ServiceError> {
    sysfs::read_line(&paths.scaling_governor())
}

pub fn time_in_state(paths: &ServicePaths) -> Result<Vec<String>, ServiceError> {
    sysfs::read_lines(&paths.cpufreq_stats("time_in_state"))
}

pub fn total_trans(paths: &ServicePaths) -> Result<Vec<String>, ServiceError> {
    sysfs::read_lines(&paths.cpufreq_stats("total_trans"))
}

pub fn trans_table(paths: &ServicePaths) -> Result<Vec<String>, ServiceError> {
    sysfs::read_lines(&paths.cpufreq_stats("trans_table"))
}

/// Enumerate generic parameters, or a governor's parameters when one is
/// named. A governor without a parameter directory reports an expected
/// failure (no error code) rather than a fault.
pub fn get_params(
    paths: &ServicePaths,
    governor: Option<&str>,
) -> Result<Vec<ParamInfo>, ServiceError> {
    let dir = match governor {
        Some(governor) => {
            validate_token("governor", governor)?;
            paths.governor_dir(governor)
        }
        None => paths.cpufreq_dir(),
    };
    sysfs::list_params(&dir)
}

/// Apply generic then governor-specific parameter writes, in order.
///
/// Entries must be pre-validated by the caller; `write_value` revalidates
/// each token anyway before touching the filesystem. Governor parameters
/// are only written when the generic set selected a governor, matching the
/// behavior callers have always relied on. The first failing write aborts
/// the sequence.
pub fn set_params(
    paths: &ServicePaths,
    generic: &[ParamWrite],
    governor_params: &[ParamWrite],
) -> Result<(), ServiceError> {
    let generic_dir = paths.cpufreq_dir();
    let mut governor: Option<&str> = None;

    for entry in generic {
        sysfs::write_value(&generic_dir, &entry.name, &entry.value)?;
        if entry.name == "scaling_governor" {
            governor = Some(&entry.value);
        }
    }

    if let Some(governor) = governor {
        let governor_dir = paths.governor_dir(governor);
        for entry in governor_params {
            sysfs::write_value(&governor_dir, &entry.name, &entry.value)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn cpufreq_root() -> (tempfile::TempDir, ServicePaths) {
        let root = tempfile::tempdir().unwrap();
        let paths = ServicePaths::new(root.path());
        let dir = paths.cpufreq_dir();
        fs::create_dir_all(dir.join("ondemand")).unwrap();
        fs::create_dir_all(dir.join("stats")).unwrap();
        fs::write(dir.join("scaling_governor"), "performance\n").unwrap();
        fs::write(dir.join("scaling_max_freq"), "600000\n").unwrap();
        fs::write(dir.join("scaling_driver"), "omap\n").unwrap();
        fs::write(dir.join("ondemand/sampling_rate"), "150000\n").unwrap();
        fs::write(dir.join("stats/time_in_state"), "600000 100\n500000 20\n").unwrap();
        (root, paths)
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn generic_params_exclude_blacklisted_names() {
        let (_root, paths) = cpufreq_root();
        let params = get_params(&paths, None).unwrap();
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["scaling_governor", "scaling_max_freq"]);
    }

    #[test]
    fn governor_params_come_from_the_subdirectory() {
        let (_root, paths) = cpufreq_root();
        let params = get_params(&paths, Some("ondemand")).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "sampling_rate");
        assert_eq!(params[0].value, "150000");
    }

    #[test]
    fn unknown_governor_is_expected_failure() {
        let (_root, paths) = cpufreq_root();
        assert!(matches!(
            get_params(&paths, Some("powersave")),
            Err(ServiceError::Expected(_))
        ));
    }

    #[test]
    fn governor_name_is_validated_before_lookup() {
        let (_root, paths) = cpufreq_root();
        assert!(matches!(
            get_params(&paths, Some("../..")),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn set_params_writes_generic_then_governor() {
        let (_root, paths) = cpufreq_root();
        let generic = vec![
            ParamWrite {
                name: "scaling_max_freq".to_string(),
                value: "550000".to_string(),
            },
            ParamWrite {
                name: "scaling_governor".to_string(),
                value: "ondemand".to_string(),
            },
        ];
        let governor = vec![ParamWrite {
            name: "sampling_rate".to_string(),
            value: "200000".to_string(),
        }];
        set_params(&paths, &generic, &governor).unwrap();

        let dir = paths.cpufreq_dir();
        assert_eq!(read(&dir.join("scaling_max_freq")), "550000");
        assert_eq!(read(&dir.join("scaling_governor")), "ondemand");
        assert_eq!(read(&dir.join("ondemand/sampling_rate")), "200000");
    }

    #[test]
    fn governor_params_ignored_without_governor_selection() {
        let (_root, paths) = cpufreq_root();
        let governor = vec![ParamWrite {
            name: "sampling_rate".to_string(),
            value: "200000".to_string(),
        }];
        set_params(&paths, &[], &governor).unwrap();
        assert_eq!(
            read(&paths.cpufreq_dir().join("ondemand/sampling_rate")),
            "150000\n"
        );
    }

    #[test]
    fn set_params_stops_on_first_failure() {
        let (_root, paths) = cpufreq_root();
        let generic = vec![
            ParamWrite {
                name: "bad name".to_string(),
                value: "1".to_string(),
            },
            ParamWrite {
                name: "scaling_max_freq".to_string(),
                value: "550000".to_string(),
            },
        ];
        assert!(set_params(&paths, &generic, &[]).is_err());
        // The later, valid entry was never reached.
        assert_eq!(
            read(&paths.cpufreq_dir().join("scaling_max_freq")),
            "600000\n"
        );
    }
}
