//! Process Runtime Probe
//!
//! Reads memory and thread counters from `/proc` on Linux. Other platforms
//! report zero for the `/proc`-backed counters.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use devtools_types::{RuntimeCounters, RuntimeProbe};

const PROC_STATUS: &str = "/proc/self/status";
const PROC_MEMINFO: &str = "/proc/meminfo";
const PROC_TASKS: &str = "/proc/self/task";
const PROC_OSRELEASE: &str = "/proc/sys/kernel/osrelease";

/// Runtime probe backed by procfs
///
/// Peak and total-started thread counts are tracked by the probe itself, so
/// they cover the period since the probe was created and only what was seen
/// at sampling time.
pub struct ProcRuntimeProbe {
    started_at: DateTime<Utc>,
    runtime_vendor: String,
    runtime_version: String,
    peak_threads: AtomicU64,
    seen_threads: Mutex<HashSet<u64>>,
}

impl Default for ProcRuntimeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcRuntimeProbe {
    /// Create a probe; the process start time is taken as "now"
    ///
    /// Create it early during host startup.
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    /// Create a probe with an explicit process start time
    pub fn started_at(started_at: DateTime<Utc>) -> Self {
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        Self {
            started_at,
            runtime_vendor: "rust-lang".to_string(),
            runtime_version: if rust_version.is_empty() {
                "unknown".to_string()
            } else {
                rust_version.to_string()
            },
            peak_threads: AtomicU64::new(0),
            seen_threads: Mutex::new(HashSet::new()),
        }
    }

    /// Override the reported runtime vendor and version
    pub fn with_runtime(mut self, vendor: impl Into<String>, version: impl Into<String>) -> Self {
        self.runtime_vendor = vendor.into();
        self.runtime_version = version.into();
        self
    }

    /// Record currently live thread ids, returning how many distinct ids were ever seen
    fn observe_threads(&self) -> u64 {
        let mut seen = self.seen_threads.lock();
        if let Ok(entries) = std::fs::read_dir(PROC_TASKS) {
            for entry in entries.flatten() {
                if let Some(tid) = entry.file_name().to_str().and_then(|s| s.parse().ok()) {
                    seen.insert(tid);
                }
            }
        }
        seen.len() as u64
    }
}

impl RuntimeProbe for ProcRuntimeProbe {
    fn counters(&self) -> RuntimeCounters {
        let status = std::fs::read_to_string(PROC_STATUS).unwrap_or_default();
        let meminfo = std::fs::read_to_string(PROC_MEMINFO).unwrap_or_default();

        let resident = numeric_field(&status, "VmRSS:").unwrap_or(0) * 1024;
        let peak_resident = numeric_field(&status, "VmHWM:").unwrap_or(0) * 1024;
        let limit = numeric_field(&meminfo, "MemTotal:").map(|kib| kib * 1024);

        let thread_count = numeric_field(&status, "Threads:").unwrap_or(0);
        let peak = self
            .peak_threads
            .fetch_max(thread_count, Ordering::Relaxed)
            .max(thread_count);
        let total_started = self.observe_threads().max(thread_count);

        // Tokio workers are background threads: they never keep the process alive
        let daemon = tokio::runtime::Handle::try_current()
            .map(|handle| handle.metrics().num_workers() as u64)
            .unwrap_or(0);

        RuntimeCounters {
            memory_limit_bytes: limit,
            memory_reserved_bytes: peak_resident.max(resident),
            memory_used_bytes: resident,
            processors: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            runtime_version: self.runtime_version.clone(),
            runtime_vendor: self.runtime_vendor.clone(),
            os_name: std::env::consts::OS.to_string(),
            os_version: std::fs::read_to_string(PROC_OSRELEASE)
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            started_at: self.started_at,
            thread_count,
            peak_thread_count: peak,
            daemon_thread_count: daemon,
            total_started_thread_count: total_started,
        }
    }
}

/// Parse the number following `key` in `Key:   1234 kB` style procfs text
fn numeric_field(text: &str, key: &str) -> Option<u64> {
    text.lines()
        .find(|line| line.starts_with(key))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|value| value.parse().ok())
}
