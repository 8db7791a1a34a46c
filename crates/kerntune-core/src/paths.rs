//! Every kernel path the service touches, resolved beneath one root.
//!
//! Production runs with the root at `/`; tests point the whole service at a
//! temp directory and get the same code paths end to end.

use std::path::{Path, PathBuf};

const CPUFREQ_DIR: &str = "sys/devices/system/cpu/cpu0/cpufreq";
const THERMAL_TEMP: &str = "sys/class/thermal/thermal_zone0/temp";
const STICKY_DIR: &str = "var/lib/kerntune";

#[derive(Debug, Clone)]
pub struct ServicePaths {
    root: PathBuf,
    sticky_dir: PathBuf,
}

impl ServicePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let sticky_dir = root.join(STICKY_DIR);
        Self { root, sticky_dir }
    }

    pub fn with_sticky_dir(mut self, sticky_dir: impl Into<PathBuf>) -> Self {
        self.sticky_dir = sticky_dir.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn under(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn cpufreq_dir(&self) -> PathBuf {
        self.under(CPUFREQ_DIR)
    }

    /// Parameter directory of a governor. The name must already be
    /// validated; this only joins paths.
    pub fn governor_dir(&self, governor: &str) -> PathBuf {
        self.cpufreq_dir().join(governor)
    }

    pub fn scaling_cur_freq(&self) -> PathBuf {
        self.cpufreq_dir().join("scaling_cur_freq")
    }

    pub fn scaling_governor(&self) -> PathBuf {
        self.cpufreq_dir().join("scaling_governor")
    }

    pub fn cpufreq_stats(&self, attribute: &str) -> PathBuf {
        self.cpufreq_dir().join("stats").join(attribute)
    }

    pub fn proc_cpuinfo(&self) -> PathBuf {
        self.under("proc/cpuinfo")
    }

    pub fn proc_meminfo(&self) -> PathBuf {
        self.under("proc/meminfo")
    }

    pub fn proc_loadavg(&self) -> PathBuf {
        self.under("proc/loadavg")
    }

    pub fn cpu_temp(&self) -> PathBuf {
        self.under(THERMAL_TEMP)
    }

    pub fn tcp_dir(&self) -> PathBuf {
        self.under("proc/sys/net/ipv4")
    }

    pub fn tcp_congestion_control(&self) -> PathBuf {
        self.tcp_dir().join("tcp_congestion_control")
    }

    pub fn tcp_allowed_congestion_control(&self) -> PathBuf {
        self.tcp_dir().join("tcp_allowed_congestion_control")
    }

    pub fn tcp_available_congestion_control(&self) -> PathBuf {
        self.tcp_dir().join("tcp_available_congestion_control")
    }

    pub fn kernel_release_file(&self) -> PathBuf {
        self.under("proc/sys/kernel/osrelease")
    }

    pub fn ramzswap_status(&self) -> PathBuf {
        self.under("proc/ramzswap")
    }

    /// Out-of-tree module directory for a kernel release.
    pub fn module_dir(&self, release: &str) -> PathBuf {
        self.under("lib/modules").join(release).join("extra")
    }

    pub fn sticky_dir(&self) -> &Path {
        &self.sticky_dir
    }

    pub fn cpufreq_sticky_script(&self) -> PathBuf {
        self.sticky_dir.join("kerntune-cpufreq")
    }

    pub fn compcache_sticky_script(&self) -> PathBuf {
        self.sticky_dir.join("kerntune-compcache")
    }
}
