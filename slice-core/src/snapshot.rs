//! Per-frame output handed to renderers and other hosts.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::SliceHit;
use crate::fruit::{Fruit, FruitId, FruitKind, FruitState};
use crate::score::HitAward;
use crate::tracker::PathPoint;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Attract,
    Playing,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    LivesDepleted,
    TimeUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FruitView {
    pub id: FruitId,
    pub kind: FruitKind,
    pub position: Vec2,
    pub rotation: f32,
    pub radius: f32,
    pub state: FruitState,
}

impl From<&Fruit> for FruitView {
    fn from(fruit: &Fruit) -> Self {
        Self {
            id: fruit.id,
            kind: fruit.kind,
            position: fruit.position,
            rotation: fruit.rotation,
            radius: fruit.radius,
            state: fruit.state,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    #[serde(flatten)]
    pub hit: SliceHit,
    pub points: u32,
    pub combo: u32,
    pub life_lost: bool,
}

impl HitEvent {
    pub fn new(hit: SliceHit, award: HitAward) -> Self {
        Self {
            hit,
            points: award.points,
            combo: award.combo,
            life_lost: award.life_lost,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MissEvent {
    pub fruit_id: FruitId,
    pub kind: FruitKind,
    pub position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameEvent {
    Hit(HitEvent),
    Miss(MissEvent),
}

/// Everything a renderer needs to draw one frame. Owned, so hosts may keep
/// or ship it elsewhere without borrowing the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub time: f64,
    pub phase: GamePhase,
    pub score: u32,
    pub lives: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub active_fruits: Vec<FruitView>,
    pub events: Vec<FrameEvent>,
    pub slice_path: Vec<PathPoint>,
    pub slicing: bool,
    pub game_over_reason: Option<GameOverReason>,
    /// Hand samples the tracker refused this frame.
    pub dropped_samples: u32,
}

impl FrameSnapshot {
    pub fn hits(&self) -> impl Iterator<Item = &HitEvent> {
        self.events.iter().filter_map(|event| match event {
            FrameEvent::Hit(hit) => Some(hit),
            FrameEvent::Miss(_) => None,
        })
    }

    pub fn misses(&self) -> impl Iterator<Item = &MissEvent> {
        self.events.iter().filter_map(|event| match event {
            FrameEvent::Miss(miss) => Some(miss),
            FrameEvent::Hit(_) => None,
        })
    }

    pub fn falling_fruits(&self) -> impl Iterator<Item = &FruitView> {
        self.active_fruits
            .iter()
            .filter(|fruit| fruit.state == FruitState::Falling)
    }
}
