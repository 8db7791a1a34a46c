//! Single-attribute reads and writes against sysfs/procfs files, plus
//! parameter-directory enumeration.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use kerntune_ipc::{escape_text, ParamInfo};
use tracing::debug;

use crate::services::error::ServiceError;
use crate::validate::validate_token;

/// Attribute names never reported by parameter enumeration.
pub const PARAM_BLACKLIST: &[&str] = &["stats", "affected_cpus", "scaling_driver"];

const S_IWUSR: u32 = 0o200;

/// Read the first line of a file, newline stripped, escaped.
pub fn read_line(path: &Path) -> Result<String, ServiceError> {
    let bytes = fs::read(path)
        .map_err(|err| ServiceError::io(format!("Unable to open {}", path.display()), err))?;
    let line = bytes.split(|&b| b == b'\n').next().unwrap_or(&[]);
    if line.is_empty() {
        return Err(ServiceError::Internal(format!(
            "Unable to parse {}",
            path.display()
        )));
    }
    Ok(escape_text(line))
}

/// Read a single leading integer from a file.
pub fn read_integer(path: &Path) -> Result<i64, ServiceError> {
    let text = fs::read_to_string(path)
        .map_err(|err| ServiceError::io(format!("Unable to open {}", path.display()), err))?;
    text.split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| ServiceError::Internal(format!("Unable to parse {}", path.display())))
}

/// Read every line of a file, newlines stripped, escaped.
pub fn read_lines(path: &Path) -> Result<Vec<String>, ServiceError> {
    let bytes = fs::read(path)
        .map_err(|err| ServiceError::io(format!("Unable to open {}", path.display()), err))?;
    let mut lines: Vec<String> = bytes.split(|&b| b == b'\n').map(escape_text).collect();
    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    Ok(lines)
}

/// Write a validated value into `dir/name`.
///
/// Both tokens are checked before the path is even built; a rejected token
/// never reaches the filesystem.
pub fn write_value(dir: &Path, name: &str, value: &str) -> Result<(), ServiceError> {
    validate_token("name", name)?;
    validate_token("value", value)?;
    let path = dir.join(name);
    debug!(path = %path.display(), value, "writing attribute");
    fs::write(&path, value)
        .map_err(|err| ServiceError::io(format!("Unable to write to {}", path.display()), err))
}

/// Enumerate the regular files of a parameter directory: name, owner-write
/// bit, current value. Blacklisted names and subdirectories are skipped.
///
/// A missing directory is an expected condition (some governors have no
/// parameters) and is reported without an error code.
pub fn list_params(dir: &Path) -> Result<Vec<ParamInfo>, ServiceError> {
    let entries = fs::read_dir(dir)
        .map_err(|_| ServiceError::Expected(format!("Unable to open {}", dir.display())))?;

    let mut params = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|err| ServiceError::io(format!("Unable to open {}", dir.display()), err))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if PARAM_BLACKLIST.contains(&name) {
            continue;
        }

        let path = entry.path();
        let meta = path
            .metadata()
            .map_err(|err| ServiceError::io(format!("Unable to open {}", path.display()), err))?;
        if meta.is_dir() {
            continue;
        }

        let value = read_line(&path)?;
        params.push(ParamInfo {
            name: name.to_string(),
            writeable: meta.mode() & S_IWUSR != 0,
            value,
        });
    }

    // readdir order is filesystem-dependent; keep replies stable.
    params.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn read_line_strips_newline() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scaling_governor", "ondemand\n");
        assert_eq!(
            read_line(&dir.path().join("scaling_governor")).unwrap(),
            "ondemand"
        );
    }

    #[test]
    fn read_integer_parses_leading_number() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scaling_cur_freq", "500000\n");
        assert_eq!(
            read_integer(&dir.path().join("scaling_cur_freq")).unwrap(),
            500000
        );
    }

    #[test]
    fn read_integer_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "temp", "not-a-number\n");
        assert!(matches!(
            read_integer(&dir.path().join("temp")),
            Err(ServiceError::Internal(_))
        ));
    }

    #[test]
    fn read_lines_drops_trailing_newline_entry() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "cpuinfo", "processor : 0\nmodel : test\n");
        let lines = read_lines(&dir.path().join("cpuinfo")).unwrap();
        assert_eq!(lines, vec!["processor : 0", "model : test"]);
    }

    #[test]
    fn list_params_skips_blacklist_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scaling_governor", "ondemand\n");
        write(dir.path(), "scaling_max_freq", "600000\n");
        write(dir.path(), "scaling_driver", "omap\n");
        write(dir.path(), "affected_cpus", "0\n");
        fs::create_dir(dir.path().join("stats")).unwrap();
        fs::create_dir(dir.path().join("ondemand")).unwrap();
        write(&dir.path().join("ondemand"), "sampling_rate", "150000\n");

        let params = list_params(dir.path()).unwrap();
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["scaling_governor", "scaling_max_freq"]);
    }

    #[test]
    fn list_params_reports_writability() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scaling_max_freq", "600000\n");
        write(dir.path(), "cpuinfo_max_freq", "600000\n");
        fs::set_permissions(
            dir.path().join("cpuinfo_max_freq"),
            fs::Permissions::from_mode(0o444),
        )
        .unwrap();

        let params = list_params(dir.path()).unwrap();
        let by_name = |name: &str| params.iter().find(|p| p.name == name).unwrap();
        assert!(!by_name("cpuinfo_max_freq").writeable);
        assert!(by_name("scaling_max_freq").writeable);
    }

    #[test]
    fn missing_directory_is_expected_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_params(&dir.path().join("powersave")).unwrap_err();
        assert!(matches!(err, ServiceError::Expected(_)));
    }

    #[test]
    fn write_value_rejects_traversal_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_value(dir.path(), "../escape", "1").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(!dir.path().parent().unwrap().join("escape").exists());

        let err = write_value(dir.path(), "ok_name", "bad value").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(!dir.path().join("ok_name").exists());
    }

    #[test]
    fn write_value_writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        write_value(dir.path(), "scaling_max_freq", "550000").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("scaling_max_freq")).unwrap(),
            "550000"
        );
    }
}
