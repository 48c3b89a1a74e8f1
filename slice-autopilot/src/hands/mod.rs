//! Synthetic hands: scripted stand-ins for a landmark detector.
//!
//! Each hand sees the previous frame's snapshot and produces the samples a
//! detector would have reported for the next frame, including sensor noise
//! and the occasional low-confidence reading.

use glam::Vec2;
use serde::Serialize;
use slice_core::rng::SeededRng;
use slice_core::snapshot::FrameSnapshot;
use slice_core::tracker::HandSample;

mod hunter;
mod roster;
mod sweeper;

pub use roster::{create_hand, describe_hands, hand_fingerprint, hand_ids, hand_manifest_entries};

pub trait SyntheticHand {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn reset(&mut self, seed: u32);
    /// Samples for the frame that ends at `now`, oldest first.
    fn next_samples(&mut self, snapshot: &FrameSnapshot, now: f64) -> Vec<HandSample>;
}

#[derive(Clone, Debug, Serialize)]
pub struct HandManifestEntry {
    pub id: String,
    pub family: String,
    pub description: String,
    pub config_hash: String,
    pub config: serde_json::Value,
}

/// Sensor model shared by every hand.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SensorConfig {
    pub sample_rate_hz: f64,
    /// Half-width of the uniform position noise, in field units.
    pub jitter: f32,
    pub low_confidence_chance: f32,
}

/// Emits detector readings at a fixed rate, decoupled from the frame rate.
#[derive(Clone, Debug)]
pub(crate) struct Sensor {
    config: SensorConfig,
    rng: SeededRng,
    next_sample_at: f64,
}

impl Sensor {
    pub(crate) fn new(config: SensorConfig) -> Self {
        Self {
            config,
            rng: SeededRng::new(1),
            next_sample_at: 0.0,
        }
    }

    pub(crate) fn reset(&mut self, seed: u32) {
        // Decorrelate sensor noise from the session's spawn stream.
        self.rng = SeededRng::new(seed ^ 0x9E37_79B9);
        self.next_sample_at = 0.0;
    }

    pub(crate) fn interval(&self) -> f64 {
        1.0 / self.config.sample_rate_hz
    }

    pub(crate) fn next_sample_at(&self) -> f64 {
        self.next_sample_at
    }

    /// After a long gap, moves the next reading up to the current frame
    /// instead of replaying the gap.
    pub(crate) fn catch_up(&mut self, now: f64) {
        let interval = self.interval();
        if self.next_sample_at + interval < now - interval {
            self.next_sample_at = now;
        }
    }

    /// Timestamps due in the frame ending at `now`.
    pub(crate) fn due(&mut self, now: f64) -> Vec<f64> {
        self.catch_up(now);
        let interval = self.interval();
        let mut due = Vec::new();
        while self.next_sample_at <= now {
            due.push(self.next_sample_at);
            self.next_sample_at += interval;
        }
        due
    }

    /// Skips any due timestamps without reading, as when the hand is out of
    /// the camera's view.
    pub(crate) fn skip_until(&mut self, now: f64) {
        while self.next_sample_at <= now {
            self.next_sample_at += self.interval();
        }
    }

    pub(crate) fn read(&mut self, timestamp: f64, ideal: Vec2) -> HandSample {
        let jitter = self.config.jitter;
        let noise = Vec2::new(
            self.rng.next_range_f32(-jitter, jitter),
            self.rng.next_range_f32(-jitter, jitter),
        );
        let confidence = if self.rng.chance(self.config.low_confidence_chance) {
            self.rng.next_range_f32(0.05, 0.35)
        } else {
            self.rng.next_range_f32(0.85, 1.0)
        };
        let position = ideal + noise;
        HandSample::new(timestamp, position.x, position.y, confidence)
    }
}

/// Never enters the camera's view.
pub(crate) struct IdleHand;

impl SyntheticHand for IdleHand {
    fn id(&self) -> &'static str {
        "idle"
    }

    fn description(&self) -> &'static str {
        "No hand in view. Baseline for how long a round lasts untouched."
    }

    fn reset(&mut self, _seed: u32) {}

    fn next_samples(&mut self, _snapshot: &FrameSnapshot, _now: f64) -> Vec<HandSample> {
        Vec::new()
    }
}
