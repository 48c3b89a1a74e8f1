//! Spawn scheduling.
//!
//! Fruits are launched from just below the bottom edge on an upward arc that
//! leans toward the middle of the field. Every random draw goes through the
//! session's seeded generator, so a seed fixes the whole spawn sequence.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{Difficulty, GameConfig};
use crate::constants::{
    FIELD_BOTTOM, FIELD_CENTER_X, FIELD_LEFT, FIELD_RIGHT, GUIDED_OPENING, LATERAL_FROM_LEFT,
    LATERAL_FROM_MIDDLE, LATERAL_FROM_RIGHT, REGULAR_KINDS, SPAWN_CENTER_EXCLUSION,
    SPAWN_EDGE_MARGIN, SPAWN_INTERVAL_JITTER,
};
use crate::fruit::{Fruit, FruitId, FruitKind, FruitSet};
use crate::rng::SeededRng;

const RAMP_FULL_SECONDS: f64 = 90.0;
const RAMP_FULL_POINTS: u32 = 400;
const BURST_STEP_SECONDS: f64 = 30.0;
const BURST_STEP_POINTS: u32 = 200;

/// Difficulty adjustment derived from how far the round has gone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ramp {
    pub rate_scale: f32,
    pub speed_scale: f32,
    pub max_burst: u32,
}

#[derive(Clone, Debug)]
pub struct SpawnScheduler {
    spawn_rate: f32,
    velocity_range: (f32, f32),
    difficulty: Difficulty,
    fruit_radius: f32,
    max_angular_velocity: f32,
    bomb_chance: f32,
    max_burst: u32,
    guided_opening: bool,
    rng: SeededRng,
    seed: u32,
    next_spawn_at: f64,
    guided_index: usize,
}

impl SpawnScheduler {
    pub fn new(config: &GameConfig, seed: u32) -> Self {
        let mut scheduler = Self {
            spawn_rate: config.spawn_rate,
            velocity_range: config.fruit_velocity_range,
            difficulty: config.difficulty,
            fruit_radius: config.fruit_radius,
            max_angular_velocity: config.max_angular_velocity,
            bomb_chance: config.bomb_chance,
            max_burst: config.max_burst,
            guided_opening: config.guided_opening,
            rng: SeededRng::new(seed),
            seed,
            next_spawn_at: 0.0,
            guided_index: 0,
        };
        scheduler.reset_round();
        scheduler
    }

    pub fn next_spawn_at(&self) -> f64 {
        self.next_spawn_at
    }

    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    /// Re-arms the scheduler for a new round. The generator restarts from the
    /// session seed so every round of a session replays the same opening.
    pub fn reset_round(&mut self) {
        self.rng = SeededRng::new(self.seed);
        self.guided_index = 0;
        self.next_spawn_at = self.base_interval().map_or(f64::INFINITY, |interval| interval * 0.5);
    }

    pub fn ramp(&self, elapsed: f64, points: u32) -> Ramp {
        let time_progress = (elapsed / RAMP_FULL_SECONDS).clamp(0.0, 1.0) as f32;
        let point_progress = (points.min(RAMP_FULL_POINTS) as f32) / RAMP_FULL_POINTS as f32;
        let burst_steps = (elapsed.max(0.0) / BURST_STEP_SECONDS) as u32 + points / BURST_STEP_POINTS;
        Ramp {
            rate_scale: 1.0 + 0.5 * time_progress + 0.25 * point_progress,
            speed_scale: 1.0 + 0.15 * time_progress,
            max_burst: (1 + burst_steps).min(self.max_burst).max(1),
        }
    }

    /// Spawns whatever is due at `elapsed` seconds into the round and returns
    /// the new ids. `now` is the session clock stamped on each fruit.
    pub fn poll(&mut self, elapsed: f64, points: u32, now: f64, fruits: &mut FruitSet) -> Vec<FruitId> {
        if elapsed < self.next_spawn_at {
            return Vec::new();
        }
        let ramp = self.ramp(elapsed, points);

        let mut spawned = Vec::new();
        if self.guided_opening && self.guided_index < GUIDED_OPENING.len() {
            let kind = GUIDED_OPENING[self.guided_index];
            self.guided_index += 1;
            spawned.push(self.launch(kind, ramp, now, fruits));
        } else {
            let burst = 1 + self.rng.next_int(ramp.max_burst);
            for _ in 0..burst {
                let kind = self.draw_kind();
                spawned.push(self.launch(kind, ramp, now, fruits));
            }
        }

        let interval = self.interval(ramp).unwrap_or(f64::INFINITY);
        let jitter = self
            .rng
            .next_range_f32(-SPAWN_INTERVAL_JITTER, SPAWN_INTERVAL_JITTER) as f64;
        self.next_spawn_at = elapsed + interval * (1.0 + jitter);

        spawned
    }

    fn base_interval(&self) -> Option<f64> {
        self.interval(Ramp {
            rate_scale: 1.0,
            speed_scale: 1.0,
            max_burst: 1,
        })
    }

    fn interval(&self, ramp: Ramp) -> Option<f64> {
        let rate = self.spawn_rate * self.difficulty.rate_scale() * ramp.rate_scale;
        (rate > 0.0).then(|| 1.0 / rate as f64)
    }

    fn draw_kind(&mut self) -> FruitKind {
        if self.rng.chance(self.bomb_chance) {
            FruitKind::Bomb
        } else {
            REGULAR_KINDS[self.rng.next_int(REGULAR_KINDS.len() as u32) as usize]
        }
    }

    fn launch(&mut self, kind: FruitKind, ramp: Ramp, now: f64, fruits: &mut FruitSet) -> FruitId {
        let radius = self.fruit_radius * kind.profile().radius_scale;

        // Pick a side first, then a point on it; the central band stays empty.
        let x = if self.rng.chance(0.5) {
            self.rng.next_range_f32(
                FIELD_LEFT + SPAWN_EDGE_MARGIN,
                FIELD_CENTER_X - SPAWN_CENTER_EXCLUSION,
            )
        } else {
            self.rng.next_range_f32(
                FIELD_CENTER_X + SPAWN_CENTER_EXCLUSION,
                FIELD_RIGHT - SPAWN_EDGE_MARGIN,
            )
        };
        let position = Vec2::new(x, FIELD_BOTTOM + radius);

        let (lateral_min, lateral_max) = lateral_range(x);
        let lateral = self.rng.next_range_f32(lateral_min, lateral_max);
        let (speed_min, speed_max) = self.velocity_range;
        let speed = self.rng.next_range_f32(speed_min, speed_max)
            * self.difficulty.speed_scale()
            * ramp.speed_scale;
        let velocity = Vec2::new(lateral * speed, -speed);
        let spin = self
            .rng
            .next_range_f32(-self.max_angular_velocity, self.max_angular_velocity);

        let id = fruits.allocate_id();
        fruits.insert(Fruit::new(id, kind, position, velocity, self.fruit_radius, now).with_spin(spin));
        tracing::debug!(%id, ?kind, x, speed, "fruit spawned");
        id
    }
}

fn lateral_range(x: f32) -> (f32, f32) {
    let third = (FIELD_RIGHT - FIELD_LEFT) / 3.0;
    if x < FIELD_LEFT + third {
        LATERAL_FROM_LEFT
    } else if x > FIELD_RIGHT - third {
        LATERAL_FROM_RIGHT
    } else {
        LATERAL_FROM_MIDDLE
    }
}
