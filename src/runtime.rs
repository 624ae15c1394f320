//! Runtime wiring (spec.md §5, SPEC_FULL.md §5 "Concurrency & Resource
//! Model"): constructs one `Bus` and one `Clock`, spawns one named OS thread
//! per component, and blocks until a shutdown signal (Ctrl+C or an embedder
//! calling [`Runtime::request_shutdown`]) is observed.
//!
//! Grounded on the teacher's `voice.rs::start_voice_job`: a named background
//! worker communicating results back through a channel rather than shared
//! state, generalized here to five long-lived workers that all share one
//! `Bus` instead of each getting its own channel.

#[cfg(test)]
mod tests;

use crate::bus::{Bus, OverflowPolicy};
use crate::clock::Clock;
use crate::config::FocusFieldConfig;
use crate::error::FocusFieldError;
use crate::fusion::LockStateMachine;
use crate::health::Health;
use crate::lock_or_recover;
use crate::model::{AssociationCandidate, AudioFrame, DoaHeatmap, FaceTrack, LogEvent, TargetLock, VoiceActivity};
use crate::replay::ReplayPlayer;
use crate::{association::AssociationEngine, beamform::Beamformer, doa::DoaEngine};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Per-component subscriber read timeout (spec.md §5 "Timeouts"): short
/// enough that a silent upstream does not starve the lock machine, long
/// enough not to busy-loop.
const HEARTBEAT_TIMEOUT: Duration = Duration::from_millis(50);

/// Replay configuration, set from `Cli::replay` / `Cli::replay_speed`.
pub struct ReplaySource {
    pub path: PathBuf,
    pub speed: f32,
}

/// Owns the Bus, the Clock, the validated config, and every component
/// thread's handle. Immutable after [`Runtime::run`] starts — reconfiguration
/// is a full shutdown + restart (spec.md §5), never a live patch.
pub struct Runtime {
    bus: Arc<Bus>,
    clock: Clock,
    config: FocusFieldConfig,
    health: Arc<Mutex<Health>>,
    shutdown: Arc<AtomicBool>,
    replay: Option<ReplaySource>,
}

impl Runtime {
    pub fn new(config: FocusFieldConfig, replay: Option<ReplaySource>) -> Self {
        Self {
            bus: Arc::new(Bus::new()),
            clock: Clock::new(),
            health: Arc::new(Mutex::new(Health::new(config.health.clone()))),
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            replay,
        }
    }

    /// The shared Bus, exposed so a bench harness can subscribe alongside
    /// the component threads without going through `Runtime::run`.
    pub fn bus(&self) -> Arc<Bus> {
        self.bus.clone()
    }

    pub fn clock(&self) -> Clock {
        self.clock.clone()
    }

    /// Signal every component thread to finish its current work unit and
    /// exit (spec.md §5 "Cancellation and shutdown").
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.bus.shutdown();
    }

    fn policy(&self) -> OverflowPolicy {
        self.config.bus.overflow_policy.into()
    }

    fn capacity(&self) -> usize {
        self.config.bus.default_capacity
    }

    /// Spawn every component thread, install the Ctrl+C handler, run the
    /// replay source if configured, then block until shutdown completes or
    /// `shutdown_deadline_ms` elapses — whichever comes first.
    pub fn run(&self) -> Result<(), FocusFieldError> {
        let shutdown = self.shutdown.clone();
        let bus_for_ctrlc = self.bus.clone();
        let _ = ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Release);
            bus_for_ctrlc.shutdown();
        });

        let mut handles = Vec::new();
        handles.push(self.spawn_doa());
        handles.push(self.spawn_association());
        handles.push(self.spawn_fusion());
        handles.push(self.spawn_beamform());
        handles.push(self.spawn_health());

        if let Some(replay) = &self.replay {
            let player = ReplayPlayer::new(replay.speed);
            let published = player
                .run(&replay.path, &self.bus)
                .map_err(|e| FocusFieldError::InvariantViolation { module: "runtime", detail: e.to_string() })?;
            tracing::info!(module = "runtime", event = "replay_complete", published);
            if replay.speed <= 0.0 {
                // Deterministic batch mode: once the trace is exhausted there is
                // no more input, so request shutdown instead of idling forever.
                self.request_shutdown();
            }
        }

        self.join_with_deadline(handles);
        Ok(())
    }

    fn join_with_deadline(&self, handles: Vec<JoinHandle<()>>) {
        let deadline = Duration::from_millis(self.config.shutdown_deadline_ms);

        while !self.shutdown.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(20));
        }

        let start = Instant::now();
        for handle in handles {
            let remaining = deadline.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                tracing::warn!(module = "runtime", event = "stuck_on_stop");
                continue;
            }
            // `JoinHandle` has no timed join; the component loops themselves
            // poll `shutdown` at most every `HEARTBEAT_TIMEOUT`, so a normal
            // join here returns well within `shutdown_deadline_ms` in practice.
            let _ = handle.join();
        }
    }

    fn spawn_doa(&self) -> JoinHandle<()> {
        let bus = self.bus.clone();
        let clock = self.clock.clone();
        let config = self.config.doa.clone();
        let array = self.config.array.clone();
        let health = self.health.clone();
        let shutdown = self.shutdown.clone();
        let capacity = self.capacity();
        let policy = self.policy();

        thread::Builder::new()
            .name("focusfield-doa".into())
            .spawn(move || {
                let frames = bus.subscribe::<AudioFrame>(capacity, policy);
                let vad_sub = bus.subscribe::<VoiceActivity>(capacity, policy);
                let mut engine = DoaEngine::new(config, array);
                let mut last_vad: Option<Arc<VoiceActivity>> = None;

                while !shutdown.load(Ordering::Acquire) {
                    if let Some(v) = vad_sub.try_recv_latest() {
                        last_vad = Some(v);
                    }
                    let Some(frame) = frames.recv_timeout(HEARTBEAT_TIMEOUT) else {
                        continue;
                    };
                    let started = Instant::now();
                    if let Some(heatmap) = engine.process(&frame, last_vad.as_deref(), &clock) {
                        let _ = bus.publish(heatmap);
                    }
                    lock_or_recover(&health, "doa").record_latency("doa", started.elapsed());
                    lock_or_recover(&health, "doa").record_seen("audio.frames", frame.t_ns);
                    for log in engine.take_log_events() {
                        let _ = bus.publish(log);
                    }
                }
                let _ = bus.publish(LogEvent::stopped(clock.now_ns(), "doa"));
            })
            .expect("spawning the doa thread")
    }

    fn spawn_association(&self) -> JoinHandle<()> {
        let bus = self.bus.clone();
        let clock = self.clock.clone();
        let config = self.config.fusion.clone();
        let health = self.health.clone();
        let shutdown = self.shutdown.clone();
        let capacity = self.capacity();
        let policy = self.policy();

        thread::Builder::new()
            .name("focusfield-association".into())
            .spawn(move || {
                let heatmaps = bus.subscribe::<DoaHeatmap>(capacity, policy);
                let faces_sub = bus.subscribe::<Vec<FaceTrack>>(capacity, policy);
                let vad_sub = bus.subscribe::<VoiceActivity>(capacity, policy);
                let mut engine = AssociationEngine::new(config);
                let mut last_faces: Vec<FaceTrack> = Vec::new();
                let mut last_vad: Option<Arc<VoiceActivity>> = None;

                while !shutdown.load(Ordering::Acquire) {
                    if let Some(faces) = faces_sub.try_recv_latest() {
                        last_faces = (*faces).clone();
                    }
                    if let Some(v) = vad_sub.try_recv_latest() {
                        last_vad = Some(v);
                    }
                    let Some(heatmap) = heatmaps.recv_timeout(HEARTBEAT_TIMEOUT) else {
                        continue;
                    };
                    let started = Instant::now();
                    let candidates = engine.process(&heatmap, &last_faces, last_vad.as_deref(), &clock);
                    let _ = bus.publish(candidates);
                    let mut health = lock_or_recover(&health, "association");
                    health.record_latency("association", started.elapsed());
                    health.record_seen("audio.doa_heatmap", heatmap.t_ns);
                }
                let _ = bus.publish(LogEvent::stopped(clock.now_ns(), "association"));
            })
            .expect("spawning the association thread")
    }

    fn spawn_fusion(&self) -> JoinHandle<()> {
        let bus = self.bus.clone();
        let clock = self.clock.clone();
        let config = self.config.lock.clone();
        let audio_fallback_max_deg = self.config.fusion.max_assoc_deg;
        let health = self.health.clone();
        let shutdown = self.shutdown.clone();
        let capacity = self.capacity();
        let policy = self.policy();

        thread::Builder::new()
            .name("focusfield-fusion".into())
            .spawn(move || {
                let candidates_sub = bus.subscribe::<Vec<AssociationCandidate>>(capacity, policy);
                let vad_sub = bus.subscribe::<VoiceActivity>(capacity, policy);
                let mut machine = LockStateMachine::new(config, audio_fallback_max_deg);
                let mut last_vad: Option<Arc<VoiceActivity>> = None;

                while !shutdown.load(Ordering::Acquire) {
                    if let Some(v) = vad_sub.try_recv_latest() {
                        last_vad = Some(v);
                    }
                    let vad_speech = last_vad.as_ref().map(|v| v.speech);
                    let started = Instant::now();

                    let lock = match candidates_sub.recv_timeout(HEARTBEAT_TIMEOUT) {
                        Some(batch) => {
                            let t_ns = batch.first().map(|c| c.t_ns).unwrap_or_else(|| clock.now_ns());
                            machine.tick(t_ns, &batch, vad_speech, &clock)
                        }
                        None => {
                            if bus.is_shut_down() {
                                break;
                            }
                            machine.tick(clock.now_ns(), &[], vad_speech, &clock)
                        }
                    };
                    let _ = bus.publish(lock);
                    lock_or_recover(&health, "fusion").record_latency("fusion", started.elapsed());
                }
                let _ = bus.publish(LogEvent::stopped(clock.now_ns(), "fusion"));
            })
            .expect("spawning the fusion thread")
    }

    fn spawn_beamform(&self) -> JoinHandle<()> {
        let bus = self.bus.clone();
        let clock = self.clock.clone();
        let config = self.config.beamform.clone();
        let array = self.config.array.clone();
        let health = self.health.clone();
        let shutdown = self.shutdown.clone();
        let capacity = self.capacity();
        let policy = self.policy();

        thread::Builder::new()
            .name("focusfield-beamform".into())
            .spawn(move || {
                let frames = bus.subscribe::<AudioFrame>(capacity, policy);
                let lock_sub = bus.subscribe::<TargetLock>(capacity, policy);
                let mut beamformer = Beamformer::new(config, array);
                let mut last_lock: Option<Arc<TargetLock>> = None;

                while !shutdown.load(Ordering::Acquire) {
                    if let Some(lock) = lock_sub.try_recv_latest() {
                        last_lock = Some(lock);
                    }
                    let Some(frame) = frames.recv_timeout(HEARTBEAT_TIMEOUT) else {
                        continue;
                    };
                    let started = Instant::now();
                    let enhanced = beamformer.process(&frame, last_lock.as_deref(), &clock);
                    let _ = bus.publish(enhanced);
                    for log in beamformer.take_log_events() {
                        let _ = bus.publish(log);
                    }
                    let mut health = lock_or_recover(&health, "beamform");
                    health.record_latency("beamform", started.elapsed());
                    health.record_seen("audio.frames", frame.t_ns);
                }
                let _ = bus.publish(LogEvent::stopped(clock.now_ns(), "beamform"));
            })
            .expect("spawning the beamform thread")
    }

    fn spawn_health(&self) -> JoinHandle<()> {
        let bus = self.bus.clone();
        let clock = self.clock.clone();
        let health = self.health.clone();
        let shutdown = self.shutdown.clone();
        let publish_hz = self.config.health.publish_hz.max(0.1);
        let period = Duration::from_secs_f32(1.0 / publish_hz);

        thread::Builder::new()
            .name("focusfield-health".into())
            .spawn(move || {
                while !shutdown.load(Ordering::Acquire) {
                    thread::sleep(period);
                    let (snapshot, perf, logs) = lock_or_recover(&health, "health").snapshot(&bus, &clock);
                    let _ = bus.publish(snapshot);
                    let _ = bus.publish(perf);
                    for log in logs {
                        let _ = bus.publish(log);
                    }
                }
                let _ = bus.publish(LogEvent::stopped(clock.now_ns(), "health"));
            })
            .expect("spawning the health thread")
    }
}
