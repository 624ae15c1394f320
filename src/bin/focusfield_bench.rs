//! Deterministic replay bench: drives the core over an NDJSON trace file
//! (spec.md §6 wire format, SPEC_FULL.md §2 "Replay mode") and prints
//! latency/drop/lock-stability stats, the minimal standalone harness needed
//! to exercise the determinism property (spec.md §8) without the external
//! bench recorder/player. Grounded on the teacher's standalone timing
//! harnesses (`bin/voice_benchmark.rs`, `bin/latency_measurement.rs`): a
//! `clap::Parser` args struct, a run phase, then a printed summary.

use anyhow::{Context, Result};
use clap::Parser;
use focusfield::bus::OverflowPolicy;
use focusfield::config::{Cli as CoreCli, FocusFieldConfig};
use focusfield::model::{HealthSnapshot, LogEvent, PerfSnapshot, TargetLock};
use focusfield::runtime::ReplaySource;
use focusfield::Runtime;
use std::path::PathBuf;

/// Replay a trace file through the sensor-fusion core and summarize it.
#[derive(Debug, Parser)]
#[command(about = "FocusField deterministic replay bench")]
struct Args {
    /// NDJSON trace file (spec.md §6 wire format)
    trace: PathBuf,

    /// Optional config file overlaying the defaults the trace is replayed with
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay speed multiplier; 0 replays as fast as possible
    #[arg(long, default_value_t = 0)]
    replay_speed: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let argv = vec!["focusfield-bench".to_string(), "--config".to_string(), path.to_string_lossy().into_owned()];
            let cli = CoreCli::try_parse_from(argv).context("building config CLI overlay")?;
            FocusFieldConfig::load(&cli).context("loading config file")?
        }
        None => FocusFieldConfig::default(),
    };

    let runtime = Runtime::new(
        config,
        Some(ReplaySource { path: args.trace.clone(), speed: args.replay_speed as f32 }),
    );
    let bus = runtime.bus();

    let locks = bus.subscribe::<TargetLock>(256, OverflowPolicy::DropOldest);
    let health = bus.subscribe::<HealthSnapshot>(32, OverflowPolicy::DropOldest);
    let perf = bus.subscribe::<PerfSnapshot>(32, OverflowPolicy::DropOldest);
    let events = bus.subscribe::<LogEvent>(256, OverflowPolicy::DropOldest);

    runtime.run().context("running replay")?;

    print_summary(&args, &locks, &health, &perf, &events);
    Ok(())
}

fn print_summary(
    args: &Args,
    locks: &focusfield::bus::Subscription<TargetLock>,
    health: &focusfield::bus::Subscription<HealthSnapshot>,
    perf: &focusfield::bus::Subscription<PerfSnapshot>,
    events: &focusfield::bus::Subscription<LogEvent>,
) {
    let mut lock_ticks = 0u64;
    let mut target_changes = 0u64;
    let mut last_target: Option<u64> = None;
    while let Some(lock) = locks.try_recv() {
        lock_ticks += 1;
        if lock.target_id != last_target && lock.target_id.is_some() {
            target_changes += 1;
        }
        last_target = lock.target_id;
    }

    let mut drop_total = 0u64;
    let mut last_health: Option<std::sync::Arc<HealthSnapshot>> = None;
    while let Some(snapshot) = health.try_recv() {
        drop_total += snapshot.topics.iter().map(|t| t.drop_count).sum::<u64>();
        last_health = Some(snapshot);
    }

    let mut last_perf: Option<std::sync::Arc<PerfSnapshot>> = None;
    while let Some(snapshot) = perf.try_recv() {
        last_perf = Some(snapshot);
    }

    let mut stopped_modules = Vec::new();
    while let Some(event) = events.try_recv() {
        if event.event == "stopped" {
            stopped_modules.push(event.module.clone());
        }
    }

    println!("trace: {}", args.trace.display());
    println!("lock ticks observed: {lock_ticks}");
    println!("target changes: {target_changes}");
    println!("cumulative topic drops: {drop_total}");
    if let Some(snapshot) = last_health {
        for topic in &snapshot.topics {
            println!(
                "  topic {:<28} age_ms={:<6} staleness={:?} drops={}",
                topic.topic, topic.age_ms, topic.staleness, topic.drop_count
            );
        }
    }
    if let Some(snapshot) = last_perf {
        for stage in &snapshot.stages {
            println!(
                "  stage {:<16} p50={:.2}ms p95={:.2}ms n={}",
                stage.stage, stage.p50_ms, stage.p95_ms, stage.samples
            );
        }
    }
    println!("modules stopped cleanly: {}", stopped_modules.join(", "));
}
