//! Field geometry and per-kind data.
//!
//! The field is normalized: `x` runs 0..1 left to right, `y` runs 0..1 top to
//! bottom (camera image convention), so gravity points toward `+y`.

use crate::fruit::FruitKind;

pub const FIELD_LEFT: f32 = 0.0;
pub const FIELD_RIGHT: f32 = 1.0;
pub const FIELD_TOP: f32 = 0.0;
pub const FIELD_BOTTOM: f32 = 1.0;
pub const FIELD_CENTER_X: f32 = 0.5;

// Spawns stay out of the central strip so arcs cross the middle of the field.
pub const SPAWN_CENTER_EXCLUSION: f32 = 0.1;
pub const SPAWN_EDGE_MARGIN: f32 = 0.08;

// Lateral launch fraction ranges, by spawn side.
pub const LATERAL_FROM_LEFT: (f32, f32) = (0.05, 0.25);
pub const LATERAL_FROM_RIGHT: (f32, f32) = (-0.25, -0.05);
pub const LATERAL_FROM_MIDDLE: (f32, f32) = (-0.15, 0.15);

pub const SPAWN_INTERVAL_JITTER: f32 = 0.25;

pub const BASE_POINTS_PER_FRUIT: u32 = 10;

pub const GUIDED_OPENING: [FruitKind; 9] = [
    FruitKind::Apple,
    FruitKind::Apple,
    FruitKind::Strawberry,
    FruitKind::Strawberry,
    FruitKind::Banana,
    FruitKind::Banana,
    FruitKind::Watermelon,
    FruitKind::Watermelon,
    FruitKind::Bomb,
];

pub const REGULAR_KINDS: [FruitKind; 5] = [
    FruitKind::Apple,
    FruitKind::Banana,
    FruitKind::Peach,
    FruitKind::Strawberry,
    FruitKind::Watermelon,
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KindProfile {
    pub points: u32,
    pub radius_scale: f32,
    pub is_bomb: bool,
}

pub const fn kind_profile(kind: FruitKind) -> KindProfile {
    match kind {
        FruitKind::Apple | FruitKind::Banana | FruitKind::Peach => KindProfile {
            points: BASE_POINTS_PER_FRUIT,
            radius_scale: 1.0,
            is_bomb: false,
        },
        FruitKind::Strawberry => KindProfile {
            points: BASE_POINTS_PER_FRUIT + 5,
            radius_scale: 0.75,
            is_bomb: false,
        },
        FruitKind::Watermelon => KindProfile {
            points: BASE_POINTS_PER_FRUIT * 2,
            radius_scale: 1.35,
            is_bomb: false,
        },
        FruitKind::Bomb => KindProfile {
            points: 0,
            radius_scale: 0.9,
            is_bomb: true,
        },
    }
}
