use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::fruit::FruitKind;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub points: u32,
    pub lives: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub last_hit_at: Option<f64>,
}

/// Outcome of one slice as seen by the scorer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitAward {
    pub points: u32,
    pub combo: u32,
    pub multiplier: f32,
    pub life_lost: bool,
}

#[derive(Clone, Debug)]
pub struct ScoreKeeper {
    starting_lives: u32,
    combo_window: f64,
    combo_threshold: u32,
    combo_multiplier: f32,
    state: ScoreState,
}

impl ScoreKeeper {
    pub fn new(config: &GameConfig) -> Self {
        let starting_lives = config.starting_lives();
        Self {
            starting_lives,
            combo_window: config.combo_window_seconds,
            combo_threshold: config.combo_threshold,
            combo_multiplier: config.combo_multiplier,
            state: ScoreState {
                lives: starting_lives,
                ..ScoreState::default()
            },
        }
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn starting_lives(&self) -> u32 {
        self.starting_lives
    }

    pub fn on_hit(&mut self, kind: FruitKind, now: f64) -> HitAward {
        if kind.is_bomb() {
            self.lose_life();
            return HitAward {
                points: 0,
                combo: 0,
                multiplier: 1.0,
                life_lost: true,
            };
        }

        let chained = self
            .state
            .last_hit_at
            .is_some_and(|last| now - last <= self.combo_window);
        self.state.combo = if chained {
            self.state.combo.saturating_add(1)
        } else {
            1
        };
        self.state.max_combo = self.state.max_combo.max(self.state.combo);
        self.state.last_hit_at = Some(now);

        let multiplier = if self.state.combo >= self.combo_threshold {
            self.combo_multiplier
        } else {
            1.0
        };
        let points = (kind.profile().points as f32 * multiplier).round() as u32;
        self.state.points = self.state.points.saturating_add(points);

        HitAward {
            points,
            combo: self.state.combo,
            multiplier,
            life_lost: false,
        }
    }

    pub fn on_miss(&mut self) {
        self.lose_life();
    }

    pub fn lives_remaining(&self) -> u32 {
        self.state.lives
    }

    pub fn is_depleted(&self) -> bool {
        self.state.lives == 0
    }

    pub fn reset(&mut self) {
        self.state = ScoreState {
            lives: self.starting_lives,
            ..ScoreState::default()
        };
    }

    fn lose_life(&mut self) {
        self.state.lives = self.state.lives.saturating_sub(1);
        self.state.combo = 0;
        self.state.last_hit_at = None;
    }
}
