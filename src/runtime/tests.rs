use super::*;
use crate::config::FocusFieldConfig;
use crate::model::{AudioFrame, BoundingBox, FaceTrack};
use crate::replay::{TraceRecord, TraceWriter};
use std::thread;
use std::time::Duration;

fn trace_file(records: &[TraceRecord]) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut writer = TraceWriter::create(file.path()).unwrap();
    for record in records {
        writer.write_record(record).unwrap();
    }
    writer.flush().unwrap();
    file
}

fn frame(t_ns: u64, seq: u64) -> AudioFrame {
    AudioFrame { t_ns, seq, sample_rate_hz: 16_000, block_samples: 4, channels: 1, samples: vec![0.0; 4] }
}

fn face(t_ns: u64, seq: u64) -> Vec<FaceTrack> {
    vec![FaceTrack {
        t_ns,
        seq,
        track_id: 1,
        bbox: BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
        confidence: 0.9,
        bearing_deg: 90.0,
        mouth_activity: 0.9,
    }]
}

#[test]
fn request_shutdown_stops_the_bus() {
    let runtime = Runtime::new(FocusFieldConfig::default(), None);
    assert!(!runtime.bus().is_shut_down());
    runtime.request_shutdown();
    assert!(runtime.bus().is_shut_down());
}

#[test]
fn replay_in_batch_mode_shuts_the_runtime_down_once_exhausted() {
    let records = vec![TraceRecord::AudioFrame(frame(0, 1)), TraceRecord::FaceTracks(face(0, 1))];
    let file = trace_file(&records);

    let mut config = FocusFieldConfig::default();
    config.health.publish_hz = 20.0;
    let runtime = Runtime::new(config, Some(ReplaySource { path: file.path().to_path_buf(), speed: 0.0 }));

    let handle = thread::spawn(move || runtime.run());
    handle.join().unwrap().unwrap();
}

#[test]
fn shutdown_deadline_does_not_hang_the_caller() {
    let mut config = FocusFieldConfig::default();
    config.shutdown_deadline_ms = 100;
    let runtime = Arc::new(Runtime::new(config, None));
    let runner = runtime.clone();
    let handle = thread::spawn(move || runner.run());

    thread::sleep(Duration::from_millis(50));
    runtime.request_shutdown();
    handle.join().unwrap().unwrap();
}
