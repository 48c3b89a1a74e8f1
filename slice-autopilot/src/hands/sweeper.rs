use std::f64::consts::TAU;

use glam::Vec2;
use serde::Serialize;
use slice_core::snapshot::{FrameSnapshot, GamePhase};
use slice_core::tracker::HandSample;

use super::{Sensor, SensorConfig, SyntheticHand};

#[derive(Clone, Copy, Debug, Serialize)]
pub struct SweeperConfig {
    pub sensor: SensorConfig,
    /// Half-width of the sweep around the field centre.
    pub amplitude: f32,
    pub period_seconds: f64,
    pub height: f32,
    /// Vertical drift so successive sweeps cover different rows.
    pub height_sway: f32,
    pub sway_period_seconds: f64,
}

/// Sweeps back and forth across the field without looking at it.
pub(crate) struct SweeperHand {
    id: &'static str,
    description: &'static str,
    cfg: SweeperConfig,
    sensor: Sensor,
    phase_offset: f64,
}

impl SweeperHand {
    pub(crate) fn new(id: &'static str, description: &'static str, cfg: SweeperConfig) -> Self {
        Self {
            id,
            description,
            cfg,
            sensor: Sensor::new(cfg.sensor),
            phase_offset: 0.0,
        }
    }
}

fn sweep_position(cfg: &SweeperConfig, phase_offset: f64, t: f64) -> Vec2 {
    let sweep = (TAU * (t + phase_offset) / cfg.period_seconds).sin() as f32;
    let sway = (TAU * t / cfg.sway_period_seconds).sin() as f32;
    Vec2::new(0.5 + cfg.amplitude * sweep, cfg.height + cfg.height_sway * sway)
}

impl SyntheticHand for SweeperHand {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn reset(&mut self, seed: u32) {
        self.sensor.reset(seed);
        self.phase_offset = (seed % 997) as f64 / 997.0 * self.cfg.period_seconds;
    }

    fn next_samples(&mut self, snapshot: &FrameSnapshot, now: f64) -> Vec<HandSample> {
        if snapshot.phase != GamePhase::Playing {
            self.sensor.skip_until(now);
            return Vec::new();
        }
        let (cfg, offset) = (self.cfg, self.phase_offset);
        let sensor = &mut self.sensor;
        sensor
            .due(now)
            .into_iter()
            .map(|t| sensor.read(t, sweep_position(&cfg, offset, t)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SweeperConfig {
        SweeperConfig {
            sensor: SensorConfig {
                sample_rate_hz: 30.0,
                jitter: 0.0,
                low_confidence_chance: 0.0,
            },
            amplitude: 0.4,
            period_seconds: 1.0,
            height: 0.4,
            height_sway: 0.1,
            sway_period_seconds: 5.0,
        }
    }

    #[test]
    fn sweep_stays_inside_the_field() {
        let cfg = cfg();
        for i in 0..500 {
            let p = sweep_position(&cfg, 0.0, i as f64 * 0.013);
            assert!(p.x >= 0.09 && p.x <= 0.91, "{p:?}");
            assert!(p.y >= 0.29 && p.y <= 0.51, "{p:?}");
        }
    }

    #[test]
    fn peak_speed_clears_default_activation() {
        let cfg = cfg();
        let dt = 1.0 / 30.0;
        let fastest = (0..60)
            .map(|i| {
                let t = i as f64 * dt;
                (sweep_position(&cfg, 0.0, t + dt) - sweep_position(&cfg, 0.0, t)).length() / dt as f32
            })
            .fold(0.0f32, f32::max);
        assert!(fastest > 1.5, "fastest = {fastest}");
    }
}
