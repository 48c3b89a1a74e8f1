//! Swept slice-versus-fruit testing and exit detection.
//!
//! Each falling fruit is treated as a capsule: the chord from its position at
//! frame start to its position at frame end, inflated by its radius plus the
//! largest distance a constant-gravity arc can bow away from that chord
//! within the frame (`g·T²/8`). A slice segment hits when its distance to the
//! chord is within that inflated radius. The capsule contains every position
//! the fruit occupied during the frame, so a blade that crossed the fruit at
//! any instant is reported no matter how far either moved.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::constants::FIELD_BOTTOM;
use crate::error::RuleCode;
use crate::fruit::{Fruit, FruitId, FruitKind, FruitSet, FruitState};
use crate::gesture::{SliceSegment, SwipeDirection};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliceHit {
    pub fruit_id: FruitId,
    pub kind: FruitKind,
    pub position: Vec2,
    pub slice_velocity: Vec2,
    pub slice_angle: f32,
    pub direction: SwipeDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FruitExit {
    pub fruit_id: FruitId,
    pub kind: FruitKind,
    pub position: Vec2,
    pub state: FruitState,
}

#[derive(Clone, Copy, Debug)]
pub struct CollisionEngine {
    gravity: f32,
}

impl CollisionEngine {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            gravity: config.gravity,
        }
    }

    /// Radius of the swept capsule for a frame that simulated `frame_time`
    /// seconds.
    pub fn swept_radius(&self, fruit: &Fruit, frame_time: f32) -> f32 {
        fruit.radius + self.gravity.abs() * frame_time * frame_time / 8.0
    }

    pub fn segment_hits(&self, segment: &SliceSegment, fruit: &Fruit, frame_time: f32) -> bool {
        let reach = self.swept_radius(fruit, frame_time);
        segment_distance_sq(segment.from, segment.to, fruit.frame_origin, fruit.position)
            <= reach * reach
    }

    /// Tests every segment against every falling fruit and slices all that
    /// are crossed. One segment may slice any number of fruits.
    pub fn resolve_slices(
        &self,
        segments: &[SliceSegment],
        fruits: &mut FruitSet,
        frame_time: f32,
        now: f64,
    ) -> Result<Vec<SliceHit>, RuleCode> {
        let mut hits = Vec::new();

        for segment in segments {
            let crossed: Vec<(FruitId, FruitKind, Vec2)> = fruits
                .iter()
                .filter(|fruit| fruit.is_falling())
                .filter(|fruit| self.segment_hits(segment, fruit, frame_time))
                .map(|fruit| (fruit.id, fruit.kind, fruit.position))
                .collect();

            for (fruit_id, kind, position) in crossed {
                fruits.resolve(fruit_id, FruitState::Sliced, now)?;
                tracing::debug!(%fruit_id, ?kind, "fruit sliced");
                hits.push(SliceHit {
                    fruit_id,
                    kind,
                    position,
                    slice_velocity: segment.velocity(),
                    slice_angle: segment.angle(),
                    direction: segment.direction,
                });
            }
        }

        Ok(hits)
    }

    /// Resolves falling fruits that dropped out through the bottom edge.
    /// Fruits become `Missed`; bombs become `Expired` since letting one fall
    /// is the right play.
    pub fn detect_exits(&self, fruits: &mut FruitSet, now: f64) -> Result<Vec<FruitExit>, RuleCode> {
        let exited: Vec<(FruitId, FruitKind, Vec2)> = fruits
            .iter()
            .filter(|fruit| fruit.is_falling() && has_exited(fruit))
            .map(|fruit| (fruit.id, fruit.kind, fruit.position))
            .collect();

        let mut exits = Vec::with_capacity(exited.len());
        for (fruit_id, kind, position) in exited {
            let state = if kind.is_bomb() {
                FruitState::Expired
            } else {
                FruitState::Missed
            };
            fruits.resolve(fruit_id, state, now)?;
            tracing::debug!(%fruit_id, ?kind, ?state, "fruit left the field");
            exits.push(FruitExit {
                fruit_id,
                kind,
                position,
                state,
            });
        }
        Ok(exits)
    }
}

/// Entirely below the bottom edge and still descending. Fresh spawns start
/// below the edge too, but rising.
fn has_exited(fruit: &Fruit) -> bool {
    fruit.velocity.y > 0.0 && fruit.position.y - fruit.radius > FIELD_BOTTOM
}

/// Squared distance from `p` to segment `a..b`.
pub fn point_segment_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// Squared distance between segments `p1..q1` and `p2..q2`.
pub fn segment_distance_sq(p1: Vec2, q1: Vec2, p2: Vec2, q2: Vec2) -> f32 {
    if segments_intersect(p1, q1, p2, q2) {
        return 0.0;
    }
    point_segment_distance_sq(p1, p2, q2)
        .min(point_segment_distance_sq(q1, p2, q2))
        .min(point_segment_distance_sq(p2, p1, q1))
        .min(point_segment_distance_sq(q2, p1, q1))
}

fn segments_intersect(p1: Vec2, q1: Vec2, p2: Vec2, q2: Vec2) -> bool {
    let d1 = (q1 - p1).perp_dot(p2 - p1);
    let d2 = (q1 - p1).perp_dot(q2 - p1);
    let d3 = (q2 - p2).perp_dot(p1 - p2);
    let d4 = (q2 - p2).perp_dot(q1 - p2);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}
