//! Runtime counters and health snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw counters read from the host runtime at one instant
///
/// Memory values are bytes. `memory_limit_bytes` is `None` when the host has
/// no finite ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCounters {
    pub memory_limit_bytes: Option<u64>,
    /// Memory the process currently holds from the OS
    pub memory_reserved_bytes: u64,
    /// Portion of the reserved memory actually in use
    pub memory_used_bytes: u64,
    pub processors: usize,
    pub runtime_version: String,
    pub runtime_vendor: String,
    pub os_name: String,
    pub os_version: String,
    pub started_at: DateTime<Utc>,
    pub thread_count: u64,
    pub peak_thread_count: u64,
    pub daemon_thread_count: u64,
    pub total_started_thread_count: u64,
}

/// Memory figures in whole megabytes (MiB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryInfo {
    pub max_memory: Option<u64>,
    pub total_memory: u64,
    pub free_memory: u64,
    pub used_memory: u64,
}

/// Thread figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadInfo {
    pub thread_count: u64,
    pub peak_thread_count: u64,
    pub daemon_thread_count: u64,
    pub total_started_thread_count: u64,
}

/// Point-in-time health report for the host process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub memory: MemoryInfo,
    pub processors: usize,
    pub runtime_version: String,
    pub runtime_vendor: String,
    pub os_name: String,
    pub os_version: String,
    pub start_time: DateTime<Utc>,
    /// Whole seconds since `start_time`
    pub uptime: u64,
    pub threads: ThreadInfo,
}
