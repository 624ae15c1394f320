//! Health/Perf aggregator (spec.md §4.6): per-topic staleness, rolling Bus
//! drop counts, and per-stage processing latency, folded into two
//! slow-cadence snapshots. The core itself only reads these to decide lock
//! degradation; the rest is for the external UI.


use crate::bus::Bus;
use crate::clock::Clock;
use crate::config::HealthConfig;
use crate::model::{HealthSnapshot, LogEvent, PerfSnapshot, Staleness, StageLatency, TopicHealth};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Bounded per-stage latency ring, matching the teacher's bounded-`VecDeque`
/// accumulator style (`FrameAccumulator` in `audio/dispatch.rs`).
const LATENCY_RING_CAPACITY: usize = 512;

struct LatencyRing {
    samples: VecDeque<Duration>,
}

impl LatencyRing {
    fn new() -> Self {
        Self { samples: VecDeque::with_capacity(LATENCY_RING_CAPACITY) }
    }

    fn push(&mut self, d: Duration) {
        if self.samples.len() == LATENCY_RING_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(d);
    }

    fn percentile_ms(&self, p: f32) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut ms: Vec<f32> = self.samples.iter().map(|d| d.as_secs_f32() * 1000.0).collect();
        ms.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let idx = (((ms.len() - 1) as f32) * p).round() as usize;
        ms[idx.min(ms.len() - 1)]
    }
}

pub struct Health {
    config: HealthConfig,
    last_seen_t_ns: HashMap<&'static str, u64>,
    latencies: HashMap<&'static str, LatencyRing>,
    drop_totals: HashMap<(&'static str, u64), u64>,
    seq: u64,
}

impl Health {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            last_seen_t_ns: HashMap::new(),
            latencies: HashMap::new(),
            drop_totals: HashMap::new(),
            seq: 0,
        }
    }

    /// Record that a message was observed on `topic` at `t_ns`. Out-of-order
    /// arrivals (a late heartbeat replaying an older `t_ns`) never move
    /// staleness backwards.
    pub fn record_seen(&mut self, topic: &'static str, t_ns: u64) {
        self.last_seen_t_ns
            .entry(topic)
            .and_modify(|seen| {
                if t_ns > *seen {
                    *seen = t_ns;
                }
            })
            .or_insert(t_ns);
    }

    /// Record one stage's processing duration, folded into that stage's
    /// p50/p95 on the next [`Health::snapshot`].
    pub fn record_latency(&mut self, stage: &'static str, duration: Duration) {
        self.latencies.entry(stage).or_insert_with(LatencyRing::new).push(duration);
    }

    fn classify(&self, age_ms: u64) -> Staleness {
        if age_ms > self.config.staleness_red_ms {
            Staleness::Red
        } else if age_ms > self.config.staleness_yellow_ms {
            Staleness::Yellow
        } else {
            Staleness::Green
        }
    }

    /// Build the `runtime.health` / `runtime.perf` snapshots (spec.md §4.6),
    /// draining the Bus's per-subscriber drop counters into running per-topic
    /// totals and surfacing any non-zero drops as `log.events` entries —
    /// the Bus itself never publishes to `log.events` directly, to avoid a
    /// self-referential publish path.
    pub fn snapshot(&mut self, bus: &Bus, clock: &Clock) -> (HealthSnapshot, PerfSnapshot, Vec<LogEvent>) {
        let now_ns = clock.now_ns();
        let mut logs = Vec::new();

        for record in bus.drain_drop_events() {
            *self.drop_totals.entry((record.topic, record.subscriber_id)).or_insert(0) += record.count;
            logs.push(LogEvent::warn(
                now_ns,
                "health",
                "bus.messages_dropped",
                format!(
                    "topic={} subscriber={} count={} policy={:?}",
                    record.topic, record.subscriber_id, record.count, record.policy
                ),
            ));
        }

        let mut topics: Vec<TopicHealth> = self
            .last_seen_t_ns
            .iter()
            .map(|(&topic, &t_ns)| {
                let age_ms = clock.age_ms(t_ns);
                let drop_count = self.drop_totals.iter().filter(|((t, _), _)| *t == topic).map(|(_, &c)| c).sum();
                TopicHealth { topic: topic.to_string(), age_ms, staleness: self.classify(age_ms), drop_count }
            })
            .collect();
        topics.sort_by(|a, b| a.topic.cmp(&b.topic));

        let mut stages: Vec<StageLatency> = self
            .latencies
            .iter()
            .map(|(&stage, ring)| StageLatency {
                stage: stage.to_string(),
                p50_ms: ring.percentile_ms(0.50),
                p95_ms: ring.percentile_ms(0.95),
                samples: ring.samples.len(),
            })
            .collect();
        stages.sort_by(|a, b| a.stage.cmp(&b.stage));

        self.seq += 1;
        let health = HealthSnapshot { t_ns: now_ns, seq: self.seq, topics };
        let perf = PerfSnapshot { t_ns: now_ns, seq: self.seq, stages };
        (health, perf, logs)
    }
}
