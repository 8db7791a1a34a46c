//! Synchronous services behind the kerntune daemon: sysfs/procfs attribute
//! access, parameterized subprocess execution, and the cpufreq / tcp /
//! compcache / sticky-script services built on top of them.

pub mod command;
pub mod paths;
pub mod services;
pub mod sysfs;
pub mod validate;
