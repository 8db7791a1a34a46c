//! Compressed-swap (compcache) configuration.
//!
//! State is probed from the filesystem: the `ramzswap` module must exist for
//! the running kernel, and `/proc/ramzswap` reports a `MemLimit` line while
//! the device is active. Transitions are expressed as a plan of fixed tool
//! invocations so the ordering is testable without root, then executed
//! through the command runner.

use std::thread;
use std::time::Duration;

use kerntune_ipc::ParamInfo;
use tracing::info;

use crate::command;
use crate::paths::ServicePaths;
use crate::services::error::ServiceError;
use crate::sysfs;

/// Default memory limit reported while compcache is disabled, in KiB.
pub const DEFAULT_MEMLIMIT_KB: &str = "16384";

/// Swap device handed back to the kernel when compcache is disabled.
pub const BACKING_SWAP: &str = "/dev/mapper/store-swap";

/// Delay between inserting the ramzswap module and swapping onto it; the
/// device needs a moment to come up.
const SETTLE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompcacheState {
    /// The ramzswap module exists for the running kernel.
    pub available: bool,
    /// The device is active (a MemLimit is being reported).
    pub enabled: bool,
    pub memlimit_kb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Run { program: String, args: Vec<String> },
    Settle(Duration),
}

impl Step {
    fn run(program: &str, args: &[&str]) -> Self {
        Self::Run {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub fn kernel_release(paths: &ServicePaths) -> Result<String, ServiceError> {
    sysfs::read_line(&paths.kernel_release_file())
        .map_err(|_| ServiceError::Internal("Unable to determine kernel version".to_string()))
}

/// Probe availability and current state without side effects.
pub fn probe(paths: &ServicePaths) -> Result<CompcacheState, ServiceError> {
    let release = kernel_release(paths)?;
    let module = paths.module_dir(&release).join("ramzswap.ko");
    if !module.exists() {
        return Ok(CompcacheState {
            available: false,
            enabled: false,
            memlimit_kb: None,
        });
    }

    let memlimit_kb = sysfs::read_lines(&paths.ramzswap_status())
        .ok()
        .and_then(|lines| {
            lines.iter().find_map(|line| {
                let mut tokens = line.split_whitespace();
                match tokens.next() {
                    Some(first) if first.starts_with("MemLimit") => {
                        tokens.next().map(str::to_string)
                    }
                    _ => None,
                }
            })
        });

    Ok(CompcacheState {
        available: true,
        enabled: memlimit_kb.is_some(),
        memlimit_kb,
    })
}

/// Reply parameters for the current state.
pub fn config_params(state: &CompcacheState) -> Vec<ParamInfo> {
    if !state.available {
        return Vec::new();
    }
    let (enabled, memlimit) = match &state.memlimit_kb {
        Some(limit) => ("1", limit.as_str()),
        None => ("0", DEFAULT_MEMLIMIT_KB),
    };
    vec![
        ParamInfo {
            name: "compcache_enabled".to_string(),
            writeable: true,
            value: enabled.to_string(),
        },
        ParamInfo {
            name: "compcache_memlimit".to_string(),
            writeable: true,
            value: memlimit.to_string(),
        },
    ]
}

/// The fixed enable sequence: all swap off, allocator and device modules in,
/// settle, swap onto the compressed device.
pub fn enable_plan(paths: &ServicePaths, release: &str, memlimit_kb: &str) -> Vec<Step> {
    let module_dir = paths.module_dir(release);
    let xvmalloc = module_dir.join("xvmalloc.ko").display().to_string();
    let ramzswap = module_dir.join("ramzswap.ko").display().to_string();
    vec![
        Step::run("/sbin/swapoff", &["-a"]),
        Step::run("/sbin/insmod", &[&xvmalloc]),
        Step::run(
            "/sbin/insmod",
            &[
                &ramzswap,
                &format!("backing_swap={BACKING_SWAP}"),
                &format!("memlimit_kb={memlimit_kb}"),
            ],
        ),
        Step::Settle(SETTLE),
        Step::run("/sbin/swapon", &["/dev/ramzswap0", "-p", "0"]),
    ]
}

/// The fixed disable sequence: all swap off, modules out in reverse order,
/// swap back onto the original backing device.
pub fn disable_plan() -> Vec<Step> {
    vec![
        Step::run("/sbin/swapoff", &["-a"]),
        Step::run("/sbin/rmmod", &["ramzswap"]),
        Step::run("/sbin/rmmod", &["xvmalloc"]),
        Step::run("/sbin/swapon", &[BACKING_SWAP, "-p", "0"]),
    ]
}

/// Execute a plan, stopping at the first failing step.
pub fn apply(plan: &[Step]) -> Result<(), ServiceError> {
    for step in plan {
        match step {
            Step::Run { program, args } => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                command::run(program, &args)?;
            }
            Step::Settle(delay) => thread::sleep(*delay),
        }
    }
    Ok(())
}

/// Bring compcache to the requested state. Already-satisfied requests are
/// no-ops.
pub fn set_config(paths: &ServicePaths, enable: bool, memlimit_kb: &str) -> Result<(), ServiceError> {
    let release = kernel_release(paths)?;
    let state = probe(paths)?;

    if enable && !state.enabled {
        info!(memlimit_kb, "enabling compcache");
        apply(&enable_plan(paths, &release, memlimit_kb))
    } else if !enable && state.enabled {
        info!("disabling compcache");
        apply(&disable_plan())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn root_with_release(release: &str) -> (tempfile::TempDir, ServicePaths) {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("proc/sys/kernel")).unwrap();
        fs::write(
            root.path().join("proc/sys/kernel/osrelease"),
            format!("{release}\n"),
        )
        .unwrap();
        let paths = ServicePaths::new(root.path());
        (root, paths)
    }

    fn install_module(paths: &ServicePaths, release: &str) {
        let dir = paths.module_dir(release);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("ramzswap.ko"), "").unwrap();
    }

    #[test]
    fn probe_without_module_is_unavailable() {
        let (_root, paths) = root_with_release("2.6.24-test");
        let state = probe(&paths).unwrap();
        assert_eq!(
            state,
            CompcacheState {
                available: false,
                enabled: false,
                memlimit_kb: None,
            }
        );
        assert!(config_params(&state).is_empty());
    }

    #[test]
    fn probe_reads_memlimit_when_active() {
        let (root, paths) = root_with_release("2.6.24-test");
        install_module(&paths, "2.6.24-test");
        fs::write(
            root.path().join("proc/ramzswap"),
            "DiskSize:       32768 kB\nMemLimit:       20480 kB\n",
        )
        .unwrap();

        let state = probe(&paths).unwrap();
        assert!(state.enabled);
        assert_eq!(state.memlimit_kb.as_deref(), Some("20480"));

        let params = config_params(&state);
        assert_eq!(params[0].name, "compcache_enabled");
        assert_eq!(params[0].value, "1");
        assert_eq!(params[1].value, "20480");
    }

    #[test]
    fn probe_with_module_but_no_device_reports_disabled_defaults() {
        let (_root, paths) = root_with_release("2.6.24-test");
        install_module(&paths, "2.6.24-test");

        let state = probe(&paths).unwrap();
        assert!(state.available);
        assert!(!state.enabled);

        let params = config_params(&state);
        assert_eq!(params[0].value, "0");
        assert_eq!(params[1].value, DEFAULT_MEMLIMIT_KB);
    }

    #[test]
    fn enable_plan_order_is_fixed() {
        let (_root, paths) = root_with_release("2.6.24-test");
        let plan = enable_plan(&paths, "2.6.24-test", "16384");

        let programs: Vec<&str> = plan
            .iter()
            .map(|step| match step {
                Step::Run { program, .. } => program.as_str(),
                Step::Settle(_) => "(settle)",
            })
            .collect();
        assert_eq!(
            programs,
            vec![
                "/sbin/swapoff",
                "/sbin/insmod",
                "/sbin/insmod",
                "(settle)",
                "/sbin/swapon"
            ]
        );

        match &plan[2] {
            Step::Run { args, .. } => {
                assert!(args[0].ends_with("ramzswap.ko"));
                assert!(args.contains(&format!("backing_swap={BACKING_SWAP}")));
                assert!(args.contains(&"memlimit_kb=16384".to_string()));
            }
            other => panic!("expected ramzswap insmod, got {other:?}"),
        }
        match &plan[4] {
            Step::Run { args, .. } => assert_eq!(args[0], "/dev/ramzswap0"),
            other => panic!("expected swapon, got {other:?}"),
        }
    }

    #[test]
    fn disable_plan_removes_modules_then_restores_swap() {
        let plan = disable_plan();
        let rendered: Vec<String> = plan
            .iter()
            .map(|step| match step {
                Step::Run { program, args } => format!("{program} {}", args.join(" ")),
                Step::Settle(_) => "(settle)".to_string(),
            })
            .collect();
        let expected = vec![
            "/sbin/swapoff -a".to_string(),
            "/sbin/rmmod ramzswap".to_string(),
            "/sbin/rmmod xvmalloc".to_string(),
            format!("/sbin/swapon {BACKING_SWAP} -p 0"),
        ];
        assert_eq!(rendered, expected);
    }

    #[test]
    fn missing_release_file_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let paths = ServicePaths::new(root.path());
        let err = kernel_release(&paths).unwrap_err();
        assert!(err.to_string().contains("kernel version"));
    }
}
