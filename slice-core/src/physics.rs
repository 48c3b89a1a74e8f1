use glam::Vec2;

use crate::config::GameConfig;
use crate::fruit::{Fruit, FruitSet};

/// Explicit Euler under constant gravity with optional linear drag: position
/// advances with the velocity from the start of the step.
#[derive(Clone, Copy, Debug)]
pub struct PhysicsEngine {
    gravity: Vec2,
    drag: f32,
}

impl PhysicsEngine {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            gravity: Vec2::new(0.0, config.gravity),
            drag: config.drag,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn step(&self, fruits: &mut FruitSet, dt: f32) {
        for fruit in fruits.iter_mut() {
            self.integrate(fruit, dt);
        }
    }

    #[inline]
    pub fn integrate(&self, fruit: &mut Fruit, dt: f32) {
        fruit.position += fruit.velocity * dt;
        fruit.velocity += self.gravity * dt;
        if self.drag > 0.0 {
            fruit.velocity *= (1.0 - self.drag * dt).max(0.0);
        }
        fruit.rotation += fruit.angular_velocity * dt;
    }
}

/// Converts variable frame durations into a whole number of fixed steps,
/// carrying the remainder into the next frame.
#[derive(Clone, Copy, Debug)]
pub struct FixedStepAccumulator {
    step: f64,
    max_frame: f64,
    remaining: f64,
}

impl FixedStepAccumulator {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            step: config.simulation_step_seconds,
            max_frame: config.max_frame_seconds,
            remaining: 0.0,
        }
    }

    pub fn step_seconds(&self) -> f64 {
        self.step
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Adds one frame of wall time and returns how many fixed steps are due.
    /// Frames longer than `max_frame` are clamped so a stalled host cannot
    /// queue an unbounded burst of steps.
    pub fn advance(&mut self, dt: f64) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        if dt > self.max_frame {
            tracing::warn!(dt, max_frame = self.max_frame, "frame time clamped");
        }
        self.remaining += dt.min(self.max_frame);

        let mut steps = 0u32;
        while self.remaining >= self.step {
            self.remaining -= self.step;
            steps += 1;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.remaining = 0.0;
    }
}
