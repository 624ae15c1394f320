//! NDJSON trace reader/writer (spec.md §6 "Wire format", SPEC_FULL.md §2
//! "Replay mode"): publishes recorded `AudioFrame` / `VoiceActivity` /
//! `FaceTrack` records onto the Bus in file order, at their recorded
//! cadence or as fast as possible. This is the harness the determinism
//! property tests in spec.md §8 drive the core through.
//!
//! One line, one tagged record, mirroring `ipc/protocol.rs`'s
//! `#[serde(tag = "...")]` wire-message style and `ipc/session.rs`'s
//! `BufRead::lines()` + `serde_json::from_str` reading idiom, redirected
//! from stdin/stdout to a file.

#[cfg(test)]
mod tests;

use crate::bus::Bus;
use crate::model::{AudioFrame, FaceTrack, VoiceActivity};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

/// One line of a trace file. Tagged by topic name so a single file can
/// interleave all three input topics in recorded order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum TraceRecord {
    #[serde(rename = "audio.frames")]
    AudioFrame(AudioFrame),
    #[serde(rename = "audio.vad")]
    Vad(VoiceActivity),
    #[serde(rename = "vision.face_tracks")]
    FaceTracks(Vec<FaceTrack>),
}

impl TraceRecord {
    fn t_ns(&self) -> u64 {
        match self {
            TraceRecord::AudioFrame(f) => f.t_ns,
            TraceRecord::Vad(v) => v.t_ns,
            TraceRecord::FaceTracks(tracks) => tracks.first().map(|t| t.t_ns).unwrap_or(0),
        }
    }
}

/// Reads a trace file and publishes each record onto the Bus in file order.
/// `speed` scales the recorded inter-message gap: `1.0` plays back at the
/// original cadence, `0.0` runs with no delay at all ("as fast as possible",
/// spec.md §2 replay mode).
pub struct ReplayPlayer {
    speed: f32,
}

impl ReplayPlayer {
    pub fn new(speed: f32) -> Self {
        Self { speed: speed.max(0.0) }
    }

    /// Returns the number of records published.
    pub fn run(&self, path: &Path, bus: &Bus) -> io::Result<usize> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut published = 0usize;
        let mut prev_t_ns: Option<u64> = None;

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: TraceRecord =
                serde_json::from_str(trimmed).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

            if self.speed > 0.0 {
                if let Some(prev) = prev_t_ns {
                    let gap_ns = record.t_ns().saturating_sub(prev);
                    let scaled_ns = (gap_ns as f32 / self.speed) as u64;
                    if scaled_ns > 0 {
                        sleep(Duration::from_nanos(scaled_ns));
                    }
                }
            }
            prev_t_ns = Some(record.t_ns());

            match record {
                TraceRecord::AudioFrame(frame) => {
                    let _ = bus.publish(frame);
                }
                TraceRecord::Vad(vad) => {
                    let _ = bus.publish(vad);
                }
                TraceRecord::FaceTracks(tracks) => {
                    let _ = bus.publish(tracks);
                }
            }
            published += 1;
        }
        Ok(published)
    }
}

/// Appends records as NDJSON, one per line — the write side of the same
/// format, for recording a trace from live input.
pub struct TraceWriter {
    out: BufWriter<File>,
}

impl TraceWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self { out: BufWriter::new(File::create(path)?) })
    }

    pub fn write_record(&mut self, record: &TraceRecord) -> io::Result<()> {
        let json = serde_json::to_string(record).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(self.out, "{json}")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
