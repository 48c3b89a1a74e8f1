use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Easy),
            2 => Some(Self::Medium),
            3 => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
        }
    }

    /// Multiplier on the configured spawn rate.
    pub fn rate_scale(self) -> f32 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 1.25,
            Self::Hard => 1.6,
        }
    }

    /// Multiplier on the configured launch speed range.
    pub fn speed_scale(self) -> f32 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 1.08,
            Self::Hard => 1.15,
        }
    }

    /// Lives taken off `max_lives` at round start.
    pub fn lives_penalty(self) -> u32 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }
}

/// One immutable bundle of tunables, handed to every component at
/// construction. Speeds are field units per second, times are seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Mean fruits spawned per second. Zero disables automatic spawning.
    pub spawn_rate: f32,
    pub fruit_velocity_range: (f32, f32),
    pub difficulty: Difficulty,
    pub max_lives: u32,
    pub slice_activation_threshold: f32,
    pub slice_deactivation_threshold: f32,
    pub simulation_step_seconds: f64,

    pub confidence_threshold: f32,
    pub retention_window_seconds: f64,
    pub tracker_smoothing: f32,
    pub gesture_timeout_seconds: f64,

    pub gravity: f32,
    pub drag: f32,
    pub fruit_radius: f32,
    pub max_angular_velocity: f32,
    pub removal_grace_seconds: f64,
    pub max_frame_seconds: f64,

    pub combo_window_seconds: f64,
    pub combo_threshold: u32,
    pub combo_multiplier: f32,

    pub bomb_chance: f32,
    pub max_burst: u32,
    pub guided_opening: bool,
    pub round_time_limit_seconds: Option<f64>,
    pub slice_to_start: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            spawn_rate: 0.8,
            fruit_velocity_range: (1.2, 1.6),
            difficulty: Difficulty::Easy,
            max_lives: 3,
            slice_activation_threshold: 1.5,
            slice_deactivation_threshold: 0.9,
            simulation_step_seconds: 1.0 / 120.0,

            confidence_threshold: 0.5,
            retention_window_seconds: 0.15,
            tracker_smoothing: 0.65,
            gesture_timeout_seconds: 0.12,

            gravity: 1.6,
            drag: 0.0,
            fruit_radius: 0.06,
            max_angular_velocity: std::f32::consts::PI,
            removal_grace_seconds: 1.0,
            max_frame_seconds: 0.25,

            combo_window_seconds: 0.6,
            combo_threshold: 3,
            combo_multiplier: 1.5,

            bomb_chance: 0.1,
            max_burst: 3,
            guided_opening: true,
            round_time_limit_seconds: None,
            slice_to_start: false,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("spawn_rate", self.spawn_rate as f64, 0.0, 60.0)?;

        let (speed_min, speed_max) = self.fruit_velocity_range;
        check_range("fruit_velocity_range.min", speed_min as f64, 0.01, 20.0)?;
        check_range("fruit_velocity_range.max", speed_max as f64, 0.01, 20.0)?;
        if speed_min > speed_max {
            return Err(ConfigError::InvertedRange {
                field: "fruit_velocity_range",
                min: speed_min as f64,
                max: speed_max as f64,
            });
        }

        check_range("max_lives", self.max_lives as f64, 1.0, 99.0)?;
        check_range(
            "slice_activation_threshold",
            self.slice_activation_threshold as f64,
            0.01,
            100.0,
        )?;
        check_range(
            "slice_deactivation_threshold",
            self.slice_deactivation_threshold as f64,
            0.0,
            100.0,
        )?;
        if self.slice_deactivation_threshold > self.slice_activation_threshold {
            return Err(ConfigError::ThresholdOrder {
                activation: self.slice_activation_threshold,
                deactivation: self.slice_deactivation_threshold,
            });
        }
        check_range(
            "simulation_step_seconds",
            self.simulation_step_seconds,
            1e-4,
            0.1,
        )?;

        check_range("confidence_threshold", self.confidence_threshold as f64, 0.0, 1.0)?;
        check_range(
            "retention_window_seconds",
            self.retention_window_seconds,
            0.01,
            5.0,
        )?;
        check_range("tracker_smoothing", self.tracker_smoothing as f64, 0.01, 1.0)?;
        check_range(
            "gesture_timeout_seconds",
            self.gesture_timeout_seconds,
            0.001,
            5.0,
        )?;

        check_range("gravity", self.gravity as f64, 0.0, 50.0)?;
        check_range("drag", self.drag as f64, 0.0, 10.0)?;
        check_range("fruit_radius", self.fruit_radius as f64, 0.001, 0.5)?;
        check_range(
            "max_angular_velocity",
            self.max_angular_velocity as f64,
            0.0,
            100.0,
        )?;
        check_range("removal_grace_seconds", self.removal_grace_seconds, 0.0, 30.0)?;
        check_range(
            "max_frame_seconds",
            self.max_frame_seconds,
            self.simulation_step_seconds,
            5.0,
        )?;

        check_range("combo_window_seconds", self.combo_window_seconds, 0.0, 30.0)?;
        check_range("combo_threshold", self.combo_threshold as f64, 1.0, 1000.0)?;
        check_range("combo_multiplier", self.combo_multiplier as f64, 1.0, 100.0)?;

        check_range("bomb_chance", self.bomb_chance as f64, 0.0, 1.0)?;
        check_range("max_burst", self.max_burst as f64, 1.0, 16.0)?;
        if let Some(limit) = self.round_time_limit_seconds {
            check_range("round_time_limit_seconds", limit, 1.0, 86_400.0)?;
        }

        Ok(())
    }

    /// Lives a round starts with once the difficulty penalty is applied.
    pub fn starting_lives(&self) -> u32 {
        self.max_lives
            .saturating_sub(self.difficulty.lives_penalty())
            .max(1)
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default()
            .validate()
            .expect("default config must validate");
    }

    #[test]
    fn negative_spawn_rate_is_rejected() {
        let config = GameConfig {
            spawn_rate: -1.0,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "spawn_rate",
                ..
            })
        ));
    }

    #[test]
    fn nan_step_is_rejected() {
        let config = GameConfig {
            simulation_step_seconds: f64::NAN,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "simulation_step_seconds"
            })
        );
    }

    #[test]
    fn inverted_velocity_range_is_rejected() {
        let config = GameConfig {
            fruit_velocity_range: (2.0, 1.0),
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { .. })
        ));
    }

    #[test]
    fn hysteresis_thresholds_must_be_ordered() {
        let config = GameConfig {
            slice_activation_threshold: 1.0,
            slice_deactivation_threshold: 1.2,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn zero_lives_is_rejected() {
        let config = GameConfig {
            max_lives: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn difficulty_penalty_never_drops_below_one_life() {
        let config = GameConfig {
            max_lives: 2,
            difficulty: Difficulty::Hard,
            ..GameConfig::default()
        };
        assert_eq!(config.starting_lives(), 1);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"spawn_rate": 1.0, "max_lives": 5, "difficulty": "hard"}"#)
                .expect("partial config should parse");
        assert_eq!(config.spawn_rate, 1.0);
        assert_eq!(config.max_lives, 5);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.gravity, GameConfig::default().gravity);
    }

    #[test]
    fn unknown_json_keys_are_rejected() {
        let parsed: Result<GameConfig, _> = serde_json::from_str(r#"{"spwan_rate": 1.0}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn difficulty_levels_round_trip() {
        for level in 1..=3 {
            let difficulty = Difficulty::from_level(level).expect("known level");
            assert_eq!(difficulty.level(), level);
        }
        assert_eq!(Difficulty::from_level(4), None);
    }
}
