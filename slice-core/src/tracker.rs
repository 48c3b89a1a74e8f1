//! Trajectory tracking.
//!
//! The tracker is the only place raw hand samples enter the core. Everything
//! downstream sees smoothed, ordered, time-bounded points.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::InputAnomaly;

/// One landmark reading from the external detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandSample {
    pub timestamp: f64,
    pub position: Vec2,
    pub confidence: f32,
}

impl HandSample {
    pub fn new(timestamp: f64, x: f32, y: f32, confidence: f32) -> Self {
        Self {
            timestamp,
            position: Vec2::new(x, y),
            confidence,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub position: Vec2,
    pub timestamp: f64,
    pub velocity: Vec2,
}

#[derive(Clone, Debug)]
pub struct TrajectoryTracker {
    confidence_threshold: f32,
    retention_window: f64,
    smoothing: f32,
    path: Vec<PathPoint>,
    filtered: Option<Vec2>,
    last_accepted_at: Option<f64>,
}

impl TrajectoryTracker {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            retention_window: config.retention_window_seconds,
            smoothing: config.tracker_smoothing,
            path: Vec::new(),
            filtered: None,
            last_accepted_at: None,
        }
    }

    pub fn ingest(&mut self, sample: HandSample) -> Result<(), InputAnomaly> {
        if !sample.timestamp.is_finite() || !sample.position.is_finite() {
            return Err(InputAnomaly::NonFinite);
        }
        if sample.confidence < self.confidence_threshold || sample.confidence.is_nan() {
            return Err(InputAnomaly::LowConfidence);
        }
        if self
            .last_accepted_at
            .is_some_and(|last| sample.timestamp <= last)
        {
            return Err(InputAnomaly::OutOfOrder);
        }
        self.last_accepted_at = Some(sample.timestamp);

        let smoothed = match self.filtered {
            Some(previous) => previous + (sample.position - previous) * self.smoothing,
            None => sample.position,
        };
        self.filtered = Some(smoothed);

        let velocity = match self.path.last() {
            Some(last) => {
                // Divide in f64: timestamps a few ulps apart round to a zero f32 gap.
                let elapsed = sample.timestamp - last.timestamp;
                let delta = (smoothed - last.position).as_dvec2();
                (delta / elapsed).as_vec2()
            }
            None => Vec2::ZERO,
        };

        self.path.push(PathPoint {
            position: smoothed,
            timestamp: sample.timestamp,
            velocity,
        });
        self.prune(sample.timestamp);

        Ok(())
    }

    /// Drops points older than `now - retention_window`. An emptied path also
    /// resets the smoothing filter so the next stroke does not start from a
    /// stale position.
    pub fn prune(&mut self, now: f64) {
        let cutoff = now - self.retention_window;
        let expired = self
            .path
            .iter()
            .take_while(|point| point.timestamp < cutoff)
            .count();
        self.path.drain(..expired);
        if self.path.is_empty() {
            self.filtered = None;
        }
    }

    pub fn current_path(&self) -> &[PathPoint] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn newest(&self) -> Option<&PathPoint> {
        self.path.last()
    }

    /// Velocity at the newest point; zero until two points exist.
    pub fn instant_velocity(&self) -> Vec2 {
        if self.path.len() < 2 {
            return Vec2::ZERO;
        }
        self.path.last().map_or(Vec2::ZERO, |point| point.velocity)
    }

    pub fn last_sample_at(&self) -> Option<f64> {
        self.last_accepted_at
    }

    pub fn retention_window(&self) -> f64 {
        self.retention_window
    }

    pub fn reset(&mut self) {
        self.path.clear();
        self.filtered = None;
        self.last_accepted_at = None;
    }
}
