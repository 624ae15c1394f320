//! The five-state hysteretic lock state machine (spec.md §4.4).
//!
//! Grounded on `audio/capture.rs::CaptureState` in the teacher codebase: a
//! hysteresis state machine with the same shape (streak/dwell counters,
//! multiple named transition reasons as short string literals). Transitions
//! are evaluated in the order spec.md's table lists them; the first match
//! fires.

use crate::association::angular_distance;
use crate::clock::Clock;
use crate::config::LockConfig;
use crate::model::{AssociationCandidate, LockMode, LockState, StabilityStats, TargetLock};

pub struct LockStateMachine {
    config: LockConfig,
    /// Same tolerance `fusion.max_assoc_deg` uses to decide whether a DOA
    /// peak and a face track describe the same talker, reused here to gate
    /// the vision-loss audio-only takeover in [`Self::tick_locked`] to a
    /// fallback candidate near the lost target's last known bearing.
    audio_fallback_max_deg: f32,
    state: LockState,
    target_id: Option<u64>,
    target_bearing_deg: Option<f32>,
    confidence: f32,

    acquire_candidate_id: Option<u64>,
    acquire_dwell_start_t_ns: Option<u64>,

    hold_start_t_ns: Option<u64>,

    handoff_challenger_id: Option<u64>,
    handoff_start_t_ns: Option<u64>,

    last_commit_t_ns: Option<u64>,
    target_changes: u64,
    ticks_in_state: u64,
    seq: u64,
}

impl LockStateMachine {
    pub fn new(config: LockConfig, audio_fallback_max_deg: f32) -> Self {
        Self {
            config,
            audio_fallback_max_deg,
            state: LockState::NoLock,
            target_id: None,
            target_bearing_deg: None,
            confidence: 0.0,
            acquire_candidate_id: None,
            acquire_dwell_start_t_ns: None,
            hold_start_t_ns: None,
            handoff_challenger_id: None,
            handoff_start_t_ns: None,
            last_commit_t_ns: None,
            target_changes: 0,
            ticks_in_state: 0,
            seq: 0,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    /// One tick of the lock machine. `t_ns` is the candidate batch's own
    /// timestamp, or `clock.now_ns()` for a heartbeat tick with an empty
    /// candidate batch (spec.md §5, "a component emits a heartbeat tick
    /// with the last known input").
    pub fn tick(&mut self, t_ns: u64, candidates: &[AssociationCandidate], vad_speech: Option<bool>, clock: &Clock) -> TargetLock {
        let _ = clock;
        let best = best_candidate(candidates);
        let target_candidate = candidates.iter().find(|c| c.track_id == self.target_id);

        let entry_state = self.state;
        let reason = match entry_state {
            LockState::NoLock => self.tick_no_lock(t_ns, best, vad_speech),
            LockState::Acquire => self.tick_acquire(t_ns, best),
            LockState::Locked => self.tick_locked(t_ns, candidates, best, target_candidate),
            LockState::Hold => self.tick_hold(t_ns, target_candidate),
            LockState::Handoff => self.tick_handoff(t_ns, candidates, best),
        };

        self.ticks_in_state += 1;
        let mode = self.derive_mode(best, target_candidate);

        TargetLock {
            t_ns,
            seq: self.bump_seq(),
            state: self.state,
            mode,
            target_id: self.target_id,
            target_bearing_deg: self.target_bearing_deg,
            confidence: self.confidence,
            reason: reason.to_string(),
            stability: StabilityStats {
                ticks_in_state: self.ticks_in_state,
                target_changes: self.target_changes,
                last_commit_t_ns: self.last_commit_t_ns,
            },
        }
    }

    fn bump_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn enter(&mut self, state: LockState) {
        if state != self.state {
            self.state = state;
            self.ticks_in_state = 0;
        }
    }

    fn speaking(&self, c: &AssociationCandidate, vad_speech: Option<bool>) -> bool {
        let mouth_ok = c.scores.mouth >= self.config.speaking_on_mouth_activity;
        if self.config.require_vad {
            mouth_ok || vad_speech.unwrap_or(false)
        } else {
            mouth_ok
        }
    }

    fn tick_no_lock(&mut self, t_ns: u64, best: Option<&AssociationCandidate>, vad_speech: Option<bool>) -> &'static str {
        if let Some(c) = best {
            if self.speaking(c, vad_speech) {
                self.acquire_candidate_id = c.track_id;
                self.acquire_dwell_start_t_ns = Some(t_ns);
                self.target_bearing_deg = Some(c.doa_peak_deg);
                self.confidence = c.combined_score;
                self.enter(LockState::Acquire);
                return "acquiring: candidate above speaking gate";
            }
        }
        self.target_bearing_deg = None;
        self.confidence = 0.0;
        "no candidate above the speaking gate"
    }

    fn tick_acquire(&mut self, t_ns: u64, best: Option<&AssociationCandidate>) -> &'static str {
        match best {
            Some(c) if c.track_id == self.acquire_candidate_id => {
                self.target_bearing_deg = Some(c.doa_peak_deg);
                self.confidence = c.combined_score;
                let dwell_start = self.acquire_dwell_start_t_ns.unwrap_or(t_ns);
                let dwell_ms = t_ns.saturating_sub(dwell_start) / 1_000_000;
                if c.combined_score >= self.config.acquire_threshold && dwell_ms >= self.config.acquire_dwell_ms {
                    self.commit_target(t_ns, c.track_id, c.doa_peak_deg, c.combined_score);
                    self.enter(LockState::Locked);
                    "acquired: high AV agreement"
                } else {
                    "acquiring: dwell in progress"
                }
            }
            _ => {
                self.acquire_candidate_id = None;
                self.acquire_dwell_start_t_ns = None;
                self.target_bearing_deg = None;
                self.confidence = 0.0;
                self.enter(LockState::NoLock);
                "acquire_lost: candidate absent or track churn"
            }
        }
    }

    fn tick_locked(
        &mut self,
        t_ns: u64,
        candidates: &[AssociationCandidate],
        best: Option<&AssociationCandidate>,
        target_candidate: Option<&AssociationCandidate>,
    ) -> &'static str {
        let Some(target_candidate) = target_candidate else {
            // The target's own track vanished. If an audio-only fallback at
            // roughly the same bearing (within `audio_fallback_max_deg` of
            // the last known target bearing) is still speaking, degrade to
            // AUDIO_ONLY in place rather than dropping the lock outright
            // (spec.md §4.4: "target track lost AND no audio-only fallback
            // -> NO_LOCK" implies the converse keeps the lock).
            let near_last_bearing = |c: &&AssociationCandidate| {
                self.target_bearing_deg
                    .map(|last| angular_distance(c.doa_peak_deg, last) <= self.audio_fallback_max_deg)
                    .unwrap_or(false)
            };
            if let Some(audio_fallback) = candidates
                .iter()
                .filter(|c| c.track_id.is_none())
                .filter(near_last_bearing)
                .max_by(score_order)
            {
                self.target_id = None;
                self.target_bearing_deg = Some(audio_fallback.doa_peak_deg);
                self.confidence = audio_fallback.combined_score;
                return "vision lost: falling back to audio-only tracking";
            }
            self.hold_start_t_ns = Some(t_ns);
            self.enter(LockState::Hold);
            return "dropped: target candidate absent, treating as brief silence";
        };

        self.target_bearing_deg = Some(target_candidate.doa_peak_deg);
        self.confidence = target_candidate.combined_score;

        // Handoff challenge: a different candidate beating the current
        // target by `handoff_margin` (spec.md §4.4).
        if let Some(challenger) = best {
            if challenger.track_id != self.target_id && challenger.combined_score - target_candidate.combined_score >= self.config.handoff_margin {
                self.handoff_challenger_id = challenger.track_id;
                self.handoff_start_t_ns = Some(t_ns);
                self.enter(LockState::Handoff);
                return "handoff challenge: stronger candidate detected";
            }
        }

        if target_candidate.combined_score >= self.config.drop_threshold {
            "locked: stable"
        } else {
            self.hold_start_t_ns = Some(t_ns);
            self.enter(LockState::Hold);
            "dropped: score below drop_threshold"
        }
    }

    fn tick_hold(&mut self, t_ns: u64, target_candidate: Option<&AssociationCandidate>) -> &'static str {
        if let Some(c) = target_candidate {
            if c.combined_score >= self.config.drop_threshold {
                self.target_bearing_deg = Some(c.doa_peak_deg);
                self.confidence = c.combined_score;
                self.hold_start_t_ns = None;
                self.enter(LockState::Locked);
                return "locked: target recovered";
            }
        }

        let start = self.hold_start_t_ns.unwrap_or(t_ns);
        let held_ms = t_ns.saturating_sub(start) / 1_000_000;
        if held_ms > self.config.hold_ms {
            self.target_id = None;
            self.target_bearing_deg = None;
            self.confidence = 0.0;
            self.enter(LockState::NoLock);
            "dropped: silence timeout"
        } else {
            "held: awaiting target recovery"
        }
    }

    fn tick_handoff(&mut self, t_ns: u64, candidates: &[AssociationCandidate], best: Option<&AssociationCandidate>) -> &'static str {
        let challenger_still_dominant = best.map(|c| c.track_id == self.handoff_challenger_id).unwrap_or(false);
        let start = self.handoff_start_t_ns.unwrap_or(t_ns);
        let elapsed_ms = t_ns.saturating_sub(start) / 1_000_000;

        if !challenger_still_dominant {
            self.handoff_challenger_id = None;
            self.handoff_start_t_ns = None;
            self.enter(LockState::Locked);
            return "handoff reverted: challenger lost dominance";
        }

        if elapsed_ms >= self.config.handoff_min_ms {
            if let Some(c) = best {
                self.commit_target(t_ns, c.track_id, c.doa_peak_deg, c.combined_score);
            }
            self.handoff_challenger_id = None;
            self.handoff_start_t_ns = None;
            self.enter(LockState::Locked);
            return "handoff committed";
        }

        if let Some(c) = candidates.iter().find(|c| c.track_id == self.target_id) {
            self.target_bearing_deg = Some(c.doa_peak_deg);
        }
        "handoff in progress: challenger dominating"
    }

    fn commit_target(&mut self, t_ns: u64, track_id: Option<u64>, bearing_deg: f32, confidence: f32) {
        if track_id != self.target_id {
            self.target_changes += 1;
        }
        self.target_id = track_id;
        self.target_bearing_deg = Some(bearing_deg);
        self.confidence = confidence;
        self.last_commit_t_ns = Some(t_ns);
    }

    fn derive_mode(&self, best: Option<&AssociationCandidate>, target_candidate: Option<&AssociationCandidate>) -> LockMode {
        if self.state == LockState::NoLock {
            return LockMode::NoLock;
        }
        let active = target_candidate.or(best);
        match active {
            Some(c) if c.track_id.is_some() && c.scores.doa_peak > 0.0 => LockMode::AvLock,
            Some(c) if c.track_id.is_some() => LockMode::VisionOnly,
            Some(c) if c.track_id.is_none() => LockMode::AudioOnly,
            _ if self.target_bearing_deg.is_some() => LockMode::AudioOnly,
            _ => LockMode::NoLock,
        }
    }
}

fn best_candidate(candidates: &[AssociationCandidate]) -> Option<&AssociationCandidate> {
    candidates.iter().max_by(score_order)
}

fn score_order(a: &&AssociationCandidate, b: &&AssociationCandidate) -> std::cmp::Ordering {
    a.combined_score.partial_cmp(&b.combined_score).unwrap_or(std::cmp::Ordering::Equal)
}
