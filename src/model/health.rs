use serde::{Deserialize, Serialize};

/// Staleness classification for one Bus topic (spec.md §4.6): `age_ms` past
/// `staleness_red_ms` is `Red`, past `staleness_yellow_ms` is `Yellow`,
/// otherwise `Green`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Staleness {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicHealth {
    pub topic: String,
    pub age_ms: u64,
    pub staleness: Staleness,
    pub drop_count: u64,
}

/// Published on `runtime.health` at a slow cadence (spec.md §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub t_ns: u64,
    pub seq: u64,
    pub topics: Vec<TopicHealth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageLatency {
    pub stage: String,
    pub p50_ms: f32,
    pub p95_ms: f32,
    pub samples: usize,
}

/// Published on `runtime.perf` at a slow cadence (spec.md §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfSnapshot {
    pub t_ns: u64,
    pub seq: u64,
    pub stages: Vec<StageLatency>,
}
