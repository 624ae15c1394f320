use serde::{Deserialize, Serialize};

/// A single tracked face, produced externally by the (out-of-scope) face
/// detector/landmarker and consumed by the Association stage. `track_id` is
/// an opaque stable key owned by the face tracker; the core never mints or
/// mutates it (spec.md §3, "Ownership").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceTrack {
    pub t_ns: u64,
    pub seq: u64,
    pub track_id: u64,
    pub bbox: BoundingBox,
    pub confidence: f32,
    /// Azimuth after camera-yaw compensation, wrapped into `[0, 360)`.
    pub bearing_deg: f32,
    pub mouth_activity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceTrack {
    /// Whether this track is still usable given `faces_max_age_ms` (spec.md
    /// §4.3). `age_ms` is the caller-computed `clock.age_ms(self.t_ns)`.
    pub fn is_fresh(&self, age_ms: u64, max_age_ms: u64) -> bool {
        age_ms <= max_age_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> FaceTrack {
        FaceTrack {
            t_ns: 0,
            seq: 0,
            track_id: 1,
            bbox: BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
            confidence: 0.9,
            bearing_deg: 90.0,
            mouth_activity: 0.8,
        }
    }

    #[test]
    fn is_fresh_respects_max_age() {
        let t = track();
        assert!(t.is_fresh(100, 300));
        assert!(t.is_fresh(300, 300));
        assert!(!t.is_fresh(301, 300));
    }
}
