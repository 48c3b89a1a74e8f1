use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::tracker::TrajectoryTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SwipeDirection {
    /// Classifies a motion vector into 90° sectors centred on the axes.
    /// `y` grows downward, so a negative `y` component reads as `Up`.
    pub fn from_vector(motion: Vec2) -> Self {
        let angle = motion.y.atan2(motion.x).to_degrees();
        if (-45.0..45.0).contains(&angle) {
            Self::Right
        } else if (45.0..135.0).contains(&angle) {
            Self::Down
        } else if (-135.0..-45.0).contains(&angle) {
            Self::Up
        } else {
            Self::Left
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliceSegment {
    pub from: Vec2,
    pub to: Vec2,
    pub from_time: f64,
    pub to_time: f64,
    pub speed: f32,
    pub direction: SwipeDirection,
}

impl SliceSegment {
    pub fn new(from: Vec2, to: Vec2, from_time: f64, to_time: f64, speed: f32) -> Self {
        Self {
            from,
            to,
            from_time,
            to_time,
            speed,
            direction: SwipeDirection::from_vector(to - from),
        }
    }

    pub fn angle(&self) -> f32 {
        let delta = self.to - self.from;
        delta.y.atan2(delta.x)
    }

    /// Average blade velocity across the segment.
    pub fn velocity(&self) -> Vec2 {
        let span = (self.to_time - self.from_time) as f32;
        if span > 0.0 {
            (self.to - self.from) / span
        } else {
            Vec2::ZERO
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    SliceBegin { at: f64, position: Vec2 },
    SliceSegment(SliceSegment),
    SliceEnd { at: f64 },
}

/// Turns tracker output into begin/segment/end events with hysteresis
/// between the activation and deactivation speeds.
#[derive(Clone, Debug)]
pub struct GestureMapper {
    activation: f32,
    deactivation: f32,
    timeout: f64,
    slicing: bool,
    consumed_until: Option<f64>,
}

impl GestureMapper {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            activation: config.slice_activation_threshold,
            deactivation: config.slice_deactivation_threshold,
            timeout: config.gesture_timeout_seconds,
            slicing: false,
            consumed_until: None,
        }
    }

    pub fn is_slicing(&self) -> bool {
        self.slicing
    }

    pub fn reset(&mut self) {
        self.slicing = false;
        self.consumed_until = None;
    }

    /// Walks every path point that arrived since the last call, applying the
    /// hysteresis per point and emitting one segment per consecutive pair
    /// while slicing.
    pub fn update(&mut self, tracker: &TrajectoryTracker, now: f64) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        let path = tracker.current_path();
        let fresh_start = match self.consumed_until {
            Some(consumed) => path.partition_point(|point| point.timestamp <= consumed),
            None => 0,
        };

        for pair in path[fresh_start.saturating_sub(1)..].windows(2) {
            let (previous, point) = (&pair[0], &pair[1]);
            let speed = point.velocity.length();
            if self.slicing {
                if speed < self.deactivation {
                    self.slicing = false;
                    events.push(GestureEvent::SliceEnd {
                        at: point.timestamp,
                    });
                    continue;
                }
            } else if speed >= self.activation {
                self.slicing = true;
                events.push(GestureEvent::SliceBegin {
                    at: previous.timestamp,
                    position: previous.position,
                });
            } else {
                continue;
            }
            events.push(GestureEvent::SliceSegment(SliceSegment::new(
                previous.position,
                point.position,
                previous.timestamp,
                point.timestamp,
                speed,
            )));
        }

        let timed_out = tracker
            .last_sample_at()
            .map_or(true, |last| now - last > self.timeout);
        if self.slicing && timed_out {
            self.slicing = false;
            events.push(GestureEvent::SliceEnd { at: now });
        }

        if let Some(newest) = path.last() {
            self.consumed_until = Some(newest.timestamp);
        }

        events
    }
}
