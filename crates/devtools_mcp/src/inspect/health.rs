//! Health Sampler

use std::sync::Arc;

use chrono::{DateTime, Utc};

use devtools_types::{HealthSnapshot, MemoryInfo, RuntimeCounters, RuntimeProbe, ThreadInfo};

const MIB: u64 = 1024 * 1024;

/// Samples host runtime counters into a [`HealthSnapshot`]
#[derive(Clone)]
pub struct HealthSampler {
    probe: Arc<dyn RuntimeProbe>,
}

impl HealthSampler {
    pub fn new(probe: Arc<dyn RuntimeProbe>) -> Self {
        Self { probe }
    }

    /// Read counters now. Never fails.
    pub fn sample(&self) -> HealthSnapshot {
        snapshot_from(self.probe.counters(), Utc::now())
    }
}

/// Derive a snapshot from raw counters
///
/// Megabytes are floored before `used` is computed so that
/// `used == total - free` holds on the reported values. Counters that arrive
/// out of order are clamped to keep `free <= total <= max`.
pub fn snapshot_from(counters: RuntimeCounters, now: DateTime<Utc>) -> HealthSnapshot {
    let reserved = match counters.memory_limit_bytes {
        Some(limit) => counters.memory_reserved_bytes.min(limit),
        None => counters.memory_reserved_bytes,
    };
    let free = reserved.saturating_sub(counters.memory_used_bytes);

    let total_memory = reserved / MIB;
    let free_memory = (free / MIB).min(total_memory);

    let memory = MemoryInfo {
        max_memory: counters.memory_limit_bytes.map(|limit| limit / MIB),
        total_memory,
        free_memory,
        used_memory: total_memory - free_memory,
    };

    let uptime = (now - counters.started_at).num_seconds().max(0) as u64;

    HealthSnapshot {
        memory,
        processors: counters.processors,
        runtime_version: counters.runtime_version,
        runtime_vendor: counters.runtime_vendor,
        os_name: counters.os_name,
        os_version: counters.os_version,
        start_time: counters.started_at,
        uptime,
        threads: ThreadInfo {
            thread_count: counters.thread_count,
            peak_thread_count: counters.peak_thread_count,
            daemon_thread_count: counters.daemon_thread_count,
            total_started_thread_count: counters.total_started_thread_count,
        },
    }
}
