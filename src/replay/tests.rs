use super::*;
use crate::bus::OverflowPolicy;
use crate::model::{BoundingBox, FaceTrack};
use tempfile::NamedTempFile;

fn audio_frame(t_ns: u64, seq: u64) -> AudioFrame {
    AudioFrame { t_ns, seq, sample_rate_hz: 16_000, block_samples: 4, channels: 1, samples: vec![0.0; 4] }
}

fn vad(t_ns: u64, seq: u64) -> VoiceActivity {
    VoiceActivity { t_ns, seq, speech: true, confidence: 0.9 }
}

fn face_tracks(t_ns: u64, seq: u64) -> Vec<FaceTrack> {
    vec![FaceTrack {
        t_ns,
        seq,
        track_id: 1,
        bbox: BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
        confidence: 0.9,
        bearing_deg: 90.0,
        mouth_activity: 0.5,
    }]
}

fn write_trace(path: &std::path::Path, records: &[TraceRecord]) {
    let mut writer = TraceWriter::create(path).unwrap();
    for record in records {
        writer.write_record(record).unwrap();
    }
    writer.flush().unwrap();
}

#[test]
fn round_trips_a_single_record_through_json() {
    let file = NamedTempFile::new().unwrap();
    let records = vec![TraceRecord::AudioFrame(audio_frame(0, 1))];
    write_trace(file.path(), &records);

    let bus = Bus::new();
    let sub = bus.subscribe::<AudioFrame>(4, OverflowPolicy::DropNewest);
    let player = ReplayPlayer::new(0.0);
    let published = player.run(file.path(), &bus).unwrap();

    assert_eq!(published, 1);
    let received = sub.try_recv().unwrap();
    assert_eq!(received.seq, 1);
}

#[test]
fn publishes_interleaved_topics_in_file_order() {
    let file = NamedTempFile::new().unwrap();
    let records = vec![
        TraceRecord::AudioFrame(audio_frame(0, 1)),
        TraceRecord::Vad(vad(1_000_000, 1)),
        TraceRecord::FaceTracks(face_tracks(2_000_000, 1)),
        TraceRecord::AudioFrame(audio_frame(10_000_000, 2)),
    ];
    write_trace(file.path(), &records);

    let bus = Bus::new();
    let audio_sub = bus.subscribe::<AudioFrame>(8, OverflowPolicy::DropNewest);
    let vad_sub = bus.subscribe::<VoiceActivity>(8, OverflowPolicy::DropNewest);
    let face_sub = bus.subscribe::<Vec<FaceTrack>>(8, OverflowPolicy::DropNewest);

    let player = ReplayPlayer::new(0.0);
    let published = player.run(file.path(), &bus).unwrap();

    assert_eq!(published, 4);
    assert_eq!(audio_sub.try_recv().unwrap().seq, 1);
    assert_eq!(vad_sub.try_recv().unwrap().seq, 1);
    assert_eq!(face_sub.try_recv().unwrap()[0].track_id, 1);
    assert_eq!(audio_sub.try_recv().unwrap().seq, 2);
}

#[test]
fn zero_speed_runs_with_no_sleep_delay() {
    let file = NamedTempFile::new().unwrap();
    let records = vec![
        TraceRecord::AudioFrame(audio_frame(0, 1)),
        TraceRecord::AudioFrame(audio_frame(500_000_000, 2)),
    ];
    write_trace(file.path(), &records);

    let bus = Bus::new();
    let _sub = bus.subscribe::<AudioFrame>(8, OverflowPolicy::DropNewest);
    let player = ReplayPlayer::new(0.0);

    let start = std::time::Instant::now();
    let published = player.run(file.path(), &bus).unwrap();
    assert_eq!(published, 2);
    assert!(start.elapsed() < std::time::Duration::from_millis(200));
}

#[test]
fn blank_lines_are_skipped() {
    let file = NamedTempFile::new().unwrap();
    let json = serde_json::to_string(&TraceRecord::AudioFrame(audio_frame(0, 1))).unwrap();
    std::fs::write(file.path(), format!("\n{json}\n\n")).unwrap();

    let bus = Bus::new();
    let sub = bus.subscribe::<AudioFrame>(4, OverflowPolicy::DropNewest);
    let player = ReplayPlayer::new(0.0);
    let published = player.run(file.path(), &bus).unwrap();

    assert_eq!(published, 1);
    assert!(sub.try_recv().is_some());
}

#[test]
fn malformed_line_is_reported_as_an_error() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "{not valid json}\n").unwrap();

    let bus = Bus::new();
    let player = ReplayPlayer::new(0.0);
    assert!(player.run(file.path(), &bus).is_err());
}
