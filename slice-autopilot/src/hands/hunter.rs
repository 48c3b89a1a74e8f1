use std::collections::BTreeMap;

use glam::Vec2;
use serde::Serialize;
use slice_core::collision::point_segment_distance_sq;
use slice_core::fruit::FruitId;
use slice_core::snapshot::{FrameSnapshot, GamePhase};
use slice_core::tracker::HandSample;

use super::{Sensor, SensorConfig, SyntheticHand};

#[derive(Clone, Copy, Debug, Serialize)]
pub struct HunterConfig {
    pub sensor: SensorConfig,
    pub stroke_length: f32,
    pub stroke_seconds: f64,
    /// Time out of view between strokes. Longer than the tracker's retention
    /// window so each stroke starts from a fresh path.
    pub rest_seconds: f64,
    /// Strokes passing closer than this to a bomb are not taken.
    pub bomb_clearance: f32,
    /// Targets are ignored outside this vertical band.
    pub min_target_y: f32,
    pub max_target_y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Stroke {
    from: Vec2,
    to: Vec2,
    start: f64,
    duration: f64,
}

impl Stroke {
    fn end(&self) -> f64 {
        self.start + self.duration
    }

    fn position_at(&self, t: f64) -> Vec2 {
        let progress = ((t - self.start) / self.duration).clamp(0.0, 1.0) as f32;
        self.from.lerp(self.to, progress)
    }
}

/// Watches the field and swipes through the lowest fruit, leading it by its
/// observed velocity. Stays out of view between strokes.
pub(crate) struct HunterHand {
    id: &'static str,
    description: &'static str,
    cfg: HunterConfig,
    sensor: Sensor,
    stroke: Option<Stroke>,
    ready_at: f64,
    rightward: bool,
    last_seen: BTreeMap<FruitId, (Vec2, f64)>,
}

impl HunterHand {
    pub(crate) fn new(id: &'static str, description: &'static str, cfg: HunterConfig) -> Self {
        Self {
            id,
            description,
            cfg,
            sensor: Sensor::new(cfg.sensor),
            stroke: None,
            ready_at: 0.0,
            rightward: true,
            last_seen: BTreeMap::new(),
        }
    }

    /// Updates position history and returns velocity estimates for fruits
    /// seen in two consecutive snapshots.
    fn observe(&mut self, snapshot: &FrameSnapshot) -> BTreeMap<FruitId, Vec2> {
        let mut velocities = BTreeMap::new();
        let mut seen = BTreeMap::new();
        for fruit in snapshot.falling_fruits() {
            if let Some((previous, at)) = self.last_seen.get(&fruit.id) {
                let elapsed = (snapshot.time - at) as f32;
                if elapsed > 0.0 {
                    velocities.insert(fruit.id, (fruit.position - *previous) / elapsed);
                }
            }
            seen.insert(fruit.id, (fruit.position, snapshot.time));
        }
        self.last_seen = seen;
        velocities
    }

    fn plan(
        &mut self,
        snapshot: &FrameSnapshot,
        velocities: &BTreeMap<FruitId, Vec2>,
        start: f64,
    ) -> Option<Stroke> {
        let target = snapshot
            .falling_fruits()
            .filter(|fruit| !fruit.kind.is_bomb())
            .filter(|fruit| {
                (self.cfg.min_target_y..=self.cfg.max_target_y).contains(&fruit.position.y)
            })
            .max_by(|a, b| a.position.y.total_cmp(&b.position.y))?;

        let velocity = velocities.get(&target.id).copied().unwrap_or(Vec2::ZERO);
        let meet_at = start + self.cfg.stroke_seconds * 0.5;
        let predicted = target.position + velocity * (meet_at - snapshot.time) as f32;

        let half = self.cfg.stroke_length * 0.5;
        let sideways = if self.rightward { Vec2::X } else { Vec2::NEG_X };
        for axis in [sideways, Vec2::Y] {
            let stroke = Stroke {
                from: predicted - axis * half,
                to: predicted + axis * half,
                start,
                duration: self.cfg.stroke_seconds,
            };
            if !self.endangers_bomb(snapshot, &stroke) {
                self.rightward = !self.rightward;
                return Some(stroke);
            }
        }
        None
    }

    fn endangers_bomb(&self, snapshot: &FrameSnapshot, stroke: &Stroke) -> bool {
        snapshot
            .falling_fruits()
            .filter(|fruit| fruit.kind.is_bomb())
            .any(|bomb| {
                let reach = bomb.radius + self.cfg.bomb_clearance;
                point_segment_distance_sq(bomb.position, stroke.from, stroke.to) < reach * reach
            })
    }
}

impl SyntheticHand for HunterHand {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn reset(&mut self, seed: u32) {
        self.sensor.reset(seed);
        self.stroke = None;
        self.ready_at = 0.0;
        self.rightward = seed % 2 == 0;
        self.last_seen.clear();
    }

    fn next_samples(&mut self, snapshot: &FrameSnapshot, now: f64) -> Vec<HandSample> {
        let velocities = self.observe(snapshot);
        if snapshot.phase != GamePhase::Playing {
            self.stroke = None;
            self.sensor.skip_until(now);
            return Vec::new();
        }

        if self.stroke.is_none() && now >= self.ready_at {
            self.sensor.catch_up(now);
            let start = self.sensor.next_sample_at();
            self.stroke = self.plan(snapshot, &velocities, start);
        }

        let Some(stroke) = self.stroke else {
            self.sensor.skip_until(now);
            return Vec::new();
        };

        let samples = self
            .sensor
            .due(now)
            .into_iter()
            .filter(|t| *t >= stroke.start)
            .map(|t| self.sensor.read(t, stroke.position_at(t)))
            .collect();

        if now >= stroke.end() {
            self.stroke = None;
            self.ready_at = now + self.cfg.rest_seconds;
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slice_core::fruit::{FruitKind, FruitState};
    use slice_core::snapshot::FruitView;

    fn cfg() -> HunterConfig {
        HunterConfig {
            sensor: SensorConfig {
                sample_rate_hz: 60.0,
                jitter: 0.0,
                low_confidence_chance: 0.0,
            },
            stroke_length: 0.4,
            stroke_seconds: 0.1,
            rest_seconds: 0.2,
            bomb_clearance: 0.05,
            min_target_y: 0.05,
            max_target_y: 0.95,
        }
    }

    fn view(id: u32, kind: FruitKind, x: f32, y: f32) -> FruitView {
        FruitView {
            id: FruitId(id),
            kind,
            position: Vec2::new(x, y),
            rotation: 0.0,
            radius: 0.05,
            state: FruitState::Falling,
        }
    }

    fn snapshot(time: f64, fruits: Vec<FruitView>) -> FrameSnapshot {
        FrameSnapshot {
            frame: 1,
            time,
            phase: GamePhase::Playing,
            score: 0,
            lives: 3,
            combo: 0,
            max_combo: 0,
            active_fruits: fruits,
            events: Vec::new(),
            slice_path: Vec::new(),
            slicing: false,
            game_over_reason: None,
            dropped_samples: 0,
        }
    }

    #[test]
    fn stroke_crosses_the_lowest_fruit() {
        let mut hand = HunterHand::new("test", "test", cfg());
        hand.reset(2);
        let fruits = vec![
            view(1, FruitKind::Apple, 0.3, 0.4),
            view(2, FruitKind::Peach, 0.7, 0.6),
        ];
        let samples = hand.next_samples(&snapshot(1.0, fruits), 1.0);
        assert!(!samples.is_empty());
        let stroke = hand.stroke.expect("stroke planned");
        let distance = point_segment_distance_sq(Vec2::new(0.7, 0.6), stroke.from, stroke.to).sqrt();
        assert!(distance < 1e-5, "stroke misses target by {distance}");
    }

    #[test]
    fn bombs_in_the_way_force_another_axis() {
        let mut hand = HunterHand::new("test", "test", cfg());
        hand.reset(2);
        let fruits = vec![
            view(1, FruitKind::Apple, 0.5, 0.5),
            view(2, FruitKind::Bomb, 0.65, 0.5),
        ];
        hand.next_samples(&snapshot(1.0, fruits), 1.0);
        let stroke = hand.stroke.expect("stroke planned");
        assert!((stroke.from.x - stroke.to.x).abs() < 1e-6, "stroke should be vertical");
    }

    #[test]
    fn nothing_to_hunt_means_no_samples() {
        let mut hand = HunterHand::new("test", "test", cfg());
        hand.reset(1);
        assert!(hand.next_samples(&snapshot(1.0, Vec::new()), 1.0).is_empty());
        let only_bomb = vec![view(1, FruitKind::Bomb, 0.5, 0.5)];
        assert!(hand.next_samples(&snapshot(1.1, only_bomb), 1.1).is_empty());
    }
}
