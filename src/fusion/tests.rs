use super::*;
use crate::clock::Clock;
use crate::config::LockConfig;
use crate::model::{AssociationCandidate, CandidateScores, LockMode, LockState};

fn config() -> LockConfig {
    LockConfig {
        acquire_threshold: 0.6,
        drop_threshold: 0.3,
        acquire_dwell_ms: 50,
        hold_ms: 300,
        handoff_min_ms: 700,
        handoff_margin: 0.15,
        require_vad: false,
        speaking_on_mouth_activity: 0.3,
    }
}

fn candidate(track_id: Option<u64>, bearing_deg: f32, mouth: f32, combined_score: f32) -> AssociationCandidate {
    AssociationCandidate {
        t_ns: 0,
        seq: 0,
        track_id,
        doa_peak_deg: bearing_deg,
        angular_distance_deg: 0.0,
        scores: CandidateScores { mouth, face_conf: 0.8, doa_peak: 0.8 },
        combined_score,
    }
}

/// spec.md §8 scenario 2: a single steady talker crosses the acquire
/// threshold and, after dwelling `acquire_dwell_ms`, locks with AV_LOCK.
#[test]
fn single_talker_acquires_and_locks_av() {
    let mut machine = LockStateMachine::new(config(), 20.0);
    let clock = Clock::new();
    let c = candidate(Some(1), 90.0, 0.9, 0.8);

    let lock = machine.tick(0, &[c], Some(true), &clock);
    assert_eq!(lock.state, LockState::Acquire);

    let lock = machine.tick(100_000_000, &[c], Some(true), &clock);
    assert_eq!(lock.state, LockState::Locked);
    assert_eq!(lock.mode, LockMode::AvLock);
    assert_eq!(lock.target_id, Some(1));
}

/// spec.md §8 scenario 3: a stronger second candidate dominates for at
/// least `handoff_min_ms` before the target actually changes.
#[test]
fn handoff_commits_only_after_min_dwell() {
    let mut machine = LockStateMachine::new(config(), 20.0);
    let clock = Clock::new();
    let a = candidate(Some(1), 90.0, 0.9, 0.8);

    machine.tick(0, &[a], Some(true), &clock);
    let locked = machine.tick(100_000_000, &[a], Some(true), &clock);
    assert_eq!(locked.state, LockState::Locked);
    assert_eq!(locked.target_id, Some(1));

    let b = candidate(Some(2), 200.0, 0.9, 0.97);
    let challenged = machine.tick(200_000_000, &[a, b], Some(true), &clock);
    assert_eq!(challenged.state, LockState::Handoff);
    assert_eq!(challenged.target_id, Some(1), "target identity must not change the instant a challenger appears");

    let still_pending = machine.tick(500_000_000, &[a, b], Some(true), &clock);
    assert_eq!(still_pending.state, LockState::Handoff);
    assert_eq!(still_pending.target_id, Some(1));

    let committed = machine.tick(950_000_000, &[a, b], Some(true), &clock);
    assert_eq!(committed.state, LockState::Locked);
    assert_eq!(committed.target_id, Some(2));
    assert_eq!(committed.stability.target_changes, 1);
    assert_eq!(committed.stability.last_commit_t_ns, Some(950_000_000));
}

/// spec.md §8 scenario 4: a brief silence drops into HOLD and recovers back
/// to LOCKED on the same target, without ever dropping target identity.
#[test]
fn brief_pause_holds_then_recovers_same_target() {
    let mut machine = LockStateMachine::new(config(), 20.0);
    let clock = Clock::new();
    let a = candidate(Some(1), 90.0, 0.9, 0.8);

    machine.tick(0, &[a], Some(true), &clock);
    let locked = machine.tick(100_000_000, &[a], Some(true), &clock);
    assert_eq!(locked.state, LockState::Locked);

    // Target's own track momentarily drops out of the candidate batch, and
    // no audio-only fallback exists: treated as brief silence, not a
    // vision-loss fallback.
    let held = machine.tick(150_000_000, &[], Some(true), &clock);
    assert_eq!(held.state, LockState::Hold);
    assert_eq!(held.target_id, Some(1), "identity must be preserved across a hold");

    let recovered = machine.tick(250_000_000, &[a], Some(true), &clock);
    assert_eq!(recovered.state, LockState::Locked);
    assert_eq!(recovered.target_id, Some(1));
    assert_eq!(recovered.stability.target_changes, 0);
}

/// spec.md §8 scenario 5: the target's face track vanishes but an
/// audio-only candidate at roughly the same bearing keeps speaking; the
/// lock degrades to AUDIO_ONLY in place instead of dropping.
#[test]
fn vision_loss_falls_back_to_audio_only_mode() {
    let mut machine = LockStateMachine::new(config(), 20.0);
    let clock = Clock::new();
    let a = candidate(Some(1), 90.0, 0.9, 0.8);

    machine.tick(0, &[a], Some(true), &clock);
    let locked = machine.tick(100_000_000, &[a], Some(true), &clock);
    assert_eq!(locked.state, LockState::Locked);

    let audio_only = candidate(None, 91.0, 0.0, 0.5);
    let fallback = machine.tick(150_000_000, &[audio_only], Some(true), &clock);
    assert_eq!(fallback.mode, LockMode::AudioOnly);
    assert_eq!(fallback.target_id, None);
    assert!(fallback.target_bearing_deg.is_some(), "bearing must be retained for the beamformer");
}

/// spec.md §3 invariant, checked directly against the machine rather than
/// just the constructor: a fresh machine that never saw a qualifying
/// candidate stays in NO_LOCK with no target identity.
#[test]
fn idle_machine_never_claims_a_target() {
    let mut machine = LockStateMachine::new(config(), 20.0);
    let clock = Clock::new();
    let quiet = candidate(Some(1), 90.0, 0.0, 0.1);
    let lock = machine.tick(0, &[quiet], Some(false), &clock);
    assert!(lock.respects_no_lock_invariant());
    assert_eq!(lock.state, LockState::NoLock);
}
