//! Boot-time "sticky" scripts.
//!
//! A sticky script replays the current tunable writes on the next boot,
//! gated by boot-health checks so a panicked or unclean previous boot never
//! reapplies an experimental configuration. Scripts are replaced atomically:
//! content is written to a temp file, fsynced, then renamed over the target.
//! Any failure mid-write removes the temp file and leaves the previous
//! script untouched.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use kerntune_ipc::ParamWrite;
use tracing::debug;

use crate::paths::ServicePaths;
use crate::services::compcache::BACKING_SWAP;
use crate::services::error::ServiceError;
use crate::validate::validate_token;

const BOOT_HEALTH_GUARDS: &str = "\
[ \"`/usr/bin/lunaprop -m com.palm.properties.prevBootPanicked`\" = \"false\" ] || exit 0\n\
[ \"`/usr/bin/lunaprop -m com.palm.properties.prevShutdownClean`\" = \"true\" ] || exit 0\n\
[ \"`/usr/bin/lunaprop -m -n com.palm.system last_umount_clean`\"  = \"true\" ] || exit 0\n";

/// Render the cpufreq sticky script. Every entry is validated up front; an
/// invalid name or value rejects the whole request before anything is
/// written.
pub fn render_cpufreq_script(
    paths: &ServicePaths,
    generic: &[ParamWrite],
    governor_params: &[ParamWrite],
) -> Result<String, ServiceError> {
    for entry in generic.iter().chain(governor_params) {
        validate_token("name", &entry.name)?;
        validate_token("value", &entry.value)?;
    }

    let mut script = String::new();
    script.push_str("description \"Kerntune CPU frequency settings\"\n\n");
    script.push_str("start on stopped finish\n\n");
    script.push_str("script\n\n");
    script.push_str(BOOT_HEALTH_GUARDS);
    script.push('\n');

    let generic_dir = paths.cpufreq_dir();
    let mut governor: Option<&str> = None;
    for entry in generic {
        script.push_str(&format!(
            "echo -n '{}' > {}\n",
            entry.value,
            generic_dir.join(&entry.name).display()
        ));
        if entry.name == "scaling_governor" {
            governor = Some(&entry.value);
        }
    }

    if let Some(governor) = governor {
        let governor_dir = paths.governor_dir(governor);
        for entry in governor_params {
            script.push_str(&format!(
                "echo -n '{}' > {}\n",
                entry.value,
                governor_dir.join(&entry.name).display()
            ));
        }
    }

    script.push_str("\nend script\n");
    Ok(script)
}

/// Render the compcache sticky script for an enabled configuration.
pub fn render_compcache_script(memlimit_kb: &str) -> Result<String, ServiceError> {
    validate_token("memlimit", memlimit_kb)?;

    let mut script = String::new();
    script.push_str("description \"Kerntune CompCache configuration\"\n\n");
    script.push_str("start on stopped finish\n");
    script.push_str("stop on runlevel [!2]\n\n");
    script.push_str("script\n\n");
    script.push_str(BOOT_HEALTH_GUARDS);
    script.push('\n');
    script.push_str("swapoff -a\n");
    script.push_str("insmod /lib/modules/`uname -r`/extra/xvmalloc.ko\n");
    script.push_str(&format!(
        "insmod /lib/modules/`uname -r`/extra/ramzswap.ko memlimit_kb={memlimit_kb} backing_swap={BACKING_SWAP}\n"
    ));
    script.push_str("sleep 3\n");
    script.push_str("swapon /dev/ramzswap0 -p 1\n");
    script.push_str("\nend script\n");
    Ok(script)
}

pub fn write_cpufreq_script(
    paths: &ServicePaths,
    generic: &[ParamWrite],
    governor_params: &[ParamWrite],
) -> Result<(), ServiceError> {
    let script = render_cpufreq_script(paths, generic, governor_params)?;
    write_atomic(paths.sticky_dir(), &paths.cpufreq_sticky_script(), &script)
}

pub fn remove_cpufreq_script(paths: &ServicePaths) -> Result<(), ServiceError> {
    remove_script(&paths.cpufreq_sticky_script())
}

pub fn write_compcache_script(paths: &ServicePaths, memlimit_kb: &str) -> Result<(), ServiceError> {
    let script = render_compcache_script(memlimit_kb)?;
    write_atomic(
        paths.sticky_dir(),
        &paths.compcache_sticky_script(),
        &script,
    )
}

pub fn remove_compcache_script(paths: &ServicePaths) -> Result<(), ServiceError> {
    remove_script(&paths.compcache_sticky_script())
}

fn write_atomic(dir: &Path, path: &Path, content: &str) -> Result<(), ServiceError> {
    fs::create_dir_all(dir)
        .map_err(|err| ServiceError::io(format!("Unable to open {}", dir.display()), err))?;

    let tmp = path.with_extension("tmp");
    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(err) = result {
        let _ = fs::remove_file(&tmp);
        return Err(ServiceError::io(
            format!("Unable to write to {}", path.display()),
            err,
        ));
    }

    debug!(path = %path.display(), "sticky script written");
    Ok(())
}

fn remove_script(path: &Path) -> Result<(), ServiceError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ServiceError::io(
            format!("Unable to write to {}", path.display()),
            err,
        )),
    }
}
