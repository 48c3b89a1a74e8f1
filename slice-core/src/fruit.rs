use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::{kind_profile, KindProfile};
use crate::error::RuleCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FruitId(pub u32);

impl fmt::Display for FruitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fruit#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitKind {
    Apple,
    Banana,
    Peach,
    Strawberry,
    Watermelon,
    Bomb,
}

impl FruitKind {
    pub fn profile(self) -> KindProfile {
        kind_profile(self)
    }

    pub fn is_bomb(self) -> bool {
        self.profile().is_bomb
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitState {
    Falling,
    Sliced,
    Missed,
    Expired,
}

impl FruitState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Falling)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fruit {
    pub id: FruitId,
    pub kind: FruitKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub rotation: f32,
    pub radius: f32,
    pub spawned_at: f64,
    pub state: FruitState,
    /// Session time at which the fruit left `Falling`.
    pub resolved_at: Option<f64>,
    /// Position when the current frame began; the swept test runs from here.
    pub frame_origin: Vec2,
}

impl Fruit {
    pub fn new(
        id: FruitId,
        kind: FruitKind,
        position: Vec2,
        velocity: Vec2,
        base_radius: f32,
        spawned_at: f64,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            velocity,
            angular_velocity: 0.0,
            rotation: 0.0,
            radius: base_radius * kind.profile().radius_scale,
            spawned_at,
            state: FruitState::Falling,
            resolved_at: None,
            frame_origin: position,
        }
    }

    pub fn with_spin(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn is_falling(&self) -> bool {
        self.state == FruitState::Falling
    }
}

/// The active fruit population. Ordered by id so every pass over it visits
/// fruits in the same order on every run.
#[derive(Clone, Debug, Default)]
pub struct FruitSet {
    fruits: BTreeMap<FruitId, Fruit>,
    next_id: u32,
}

impl FruitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&mut self) -> FruitId {
        let id = FruitId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn insert(&mut self, fruit: Fruit) {
        self.fruits.insert(fruit.id, fruit);
    }

    pub fn get(&self, id: FruitId) -> Option<&Fruit> {
        self.fruits.get(&id)
    }

    pub fn len(&self) -> usize {
        self.fruits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fruits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fruit> {
        self.fruits.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Fruit> {
        self.fruits.values_mut()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&FruitId, &Fruit)> {
        self.fruits.iter()
    }

    pub fn falling_count(&self) -> usize {
        self.fruits.values().filter(|fruit| fruit.is_falling()).count()
    }

    pub fn mark_frame_origins(&mut self) {
        for fruit in self.fruits.values_mut() {
            fruit.frame_origin = fruit.position;
        }
    }

    /// Moves a falling fruit into a terminal state. Anything else is a core bug.
    pub fn resolve(&mut self, id: FruitId, state: FruitState, now: f64) -> Result<(), RuleCode> {
        let fruit = self
            .fruits
            .get_mut(&id)
            .ok_or(RuleCode::FruitIdMismatch)?;
        if !state.is_terminal() || fruit.state.is_terminal() {
            return Err(RuleCode::FruitIllegalTransition);
        }
        fruit.state = state;
        fruit.resolved_at = Some(now);
        Ok(())
    }

    /// Deletes terminal fruits whose grace period has run out; returns how
    /// many were removed.
    pub fn purge_resolved(&mut self, now: f64, grace: f64) -> usize {
        let before = self.fruits.len();
        self.fruits.retain(|_, fruit| match fruit.resolved_at {
            Some(resolved_at) => now - resolved_at < grace,
            None => true,
        });
        before - self.fruits.len()
    }

    pub fn clear(&mut self) {
        self.fruits.clear();
    }
}
