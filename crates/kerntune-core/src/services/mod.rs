pub mod compcache;
pub mod cpufreq;
pub mod error;
pub mod proc_info;
pub mod sticky;
pub mod tcp;
