//! Randomized fast crossings: blade and fruit both move far within one frame,
//! so checking only end-of-frame positions would miss most of these.

use glam::Vec2;
use slice_core::collision::CollisionEngine;
use slice_core::fruit::{Fruit, FruitId, FruitKind, FruitSet};
use slice_core::gesture::SliceSegment;
use slice_core::physics::PhysicsEngine;
use slice_core::rng::SeededRng;
use slice_core::tracker::HandSample;
use slice_core::{FrameInput, GameConfig, Session};

const FRAME: f32 = 1.0 / 30.0;
const SUBSTEPS: u32 = 64;

struct Case {
    fruit_start: Vec2,
    fruit_velocity: Vec2,
    radius: f32,
    blade_from: Vec2,
    blade_to: Vec2,
}

fn random_case(rng: &mut SeededRng) -> Case {
    let fruit_start = Vec2::new(rng.next_range_f32(0.2, 0.8), rng.next_range_f32(0.2, 0.8));
    let fruit_velocity = Vec2::new(rng.next_range_f32(-6.0, 6.0), rng.next_range_f32(-6.0, 6.0));
    let blade_from = Vec2::new(rng.next_range_f32(0.0, 1.0), rng.next_range_f32(0.0, 1.0));
    let blade_to = Vec2::new(rng.next_range_f32(0.0, 1.0), rng.next_range_f32(0.0, 1.0));
    Case {
        fruit_start,
        fruit_velocity,
        radius: rng.next_range_f32(0.01, 0.03),
        blade_from,
        blade_to,
    }
}

fn fruit_for(case: &Case) -> Fruit {
    let mut fruit = Fruit::new(
        FruitId(0),
        FruitKind::Apple,
        case.fruit_start,
        case.fruit_velocity,
        case.radius,
        0.0,
    );
    fruit.radius = case.radius;
    fruit
}

/// Distance from `p` to segment `a..b`.
fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    slice_core::collision::point_segment_distance_sq(p, a, b).sqrt()
}

/// Dense sampling of the fruit's arc against the swept blade. The blade has
/// swept its whole segment by the end of the frame, so any sampled fruit
/// position within reach of the segment is a contact.
fn touches_during_frame(case: &Case, physics: &PhysicsEngine) -> bool {
    let mut fruit = fruit_for(case);
    let dt = FRAME / SUBSTEPS as f32;
    for _ in 0..=SUBSTEPS {
        if point_segment_distance(fruit.position, case.blade_from, case.blade_to) < case.radius * 0.95 {
            return true;
        }
        physics.integrate(&mut fruit, dt);
    }
    false
}

#[test]
fn swept_test_never_misses_a_contact() {
    let config = GameConfig::default();
    let physics = PhysicsEngine::new(&config);
    let collision = CollisionEngine::new(&config);
    let mut rng = SeededRng::new(0xC0FF_EE11);

    let mut contacts = 0;
    let mut endpoint_misses = 0;
    for _ in 0..4_000 {
        let case = random_case(&mut rng);
        if !touches_during_frame(&case, &physics) {
            continue;
        }
        contacts += 1;

        // Advance the real fruit over the frame in the same fixed steps the
        // session would use.
        let mut set = FruitSet::new();
        let id = set.allocate_id();
        let mut fruit = fruit_for(&case);
        fruit.id = id;
        set.insert(fruit);
        set.mark_frame_origins();
        let step = FRAME / SUBSTEPS as f32;
        for _ in 0..SUBSTEPS {
            physics.step(&mut set, step);
        }

        let end = set.get(id).expect("fruit present").position;
        if point_segment_distance(end, case.blade_from, case.blade_to) > case.radius {
            endpoint_misses += 1;
        }

        let segment = SliceSegment::new(case.blade_from, case.blade_to, 0.0, FRAME as f64, 30.0);
        let hits = collision
            .resolve_slices(&[segment], &mut set, FRAME, 0.0)
            .expect("legal transitions");
        assert_eq!(hits.len(), 1, "tunneled through {:?}", case.blade_from);
    }

    assert!(contacts > 50, "only {contacts} contacts generated");
    assert!(
        endpoint_misses > 0,
        "cases should include crossings an end-of-frame check would miss"
    );
}

#[test]
fn distant_blade_is_never_a_hit() {
    let config = GameConfig::default();
    let collision = CollisionEngine::new(&config);
    let mut set = FruitSet::new();
    let id = set.allocate_id();
    set.insert(Fruit::new(
        id,
        FruitKind::Apple,
        Vec2::new(0.2, 0.2),
        Vec2::new(0.5, 0.0),
        0.05,
        0.0,
    ));
    set.mark_frame_origins();
    let segment = SliceSegment::new(Vec2::new(0.7, 0.7), Vec2::new(0.9, 0.9), 0.0, 0.03, 10.0);
    let hits = collision
        .resolve_slices(&[segment], &mut set, FRAME, 0.0)
        .expect("legal transitions");
    assert!(hits.is_empty());
}

/// Hand path whose consecutive points are far enough apart that every
/// sub-segment is fast enough to keep a slice going.
fn random_hand_path(rng: &mut SeededRng, points: usize) -> Vec<Vec2> {
    let mut path: Vec<Vec2> = Vec::with_capacity(points);
    while path.len() < points {
        let candidate = Vec2::new(rng.next_range_f32(0.0, 1.0), rng.next_range_f32(0.0, 1.0));
        if path.last().map_or(true, |last| last.distance(candidate) > 0.08) {
            path.push(candidate);
        }
    }
    path
}

fn near_polyline(point: Vec2, path: &[Vec2], reach: f32) -> bool {
    path.windows(2)
        .any(|pair| point_segment_distance(point, pair[0], pair[1]) < reach)
}

#[test]
fn several_samples_in_one_frame_never_skip_a_fruit() {
    const SESSION_FRAME: f64 = 1.0 / 60.0;
    let mut rng = SeededRng::new(0x5A11_CE55);

    let mut contacts = 0;
    let mut chord_misses = 0;
    for _ in 0..1_500 {
        let radius = rng.next_range_f32(0.015, 0.04);
        let config = GameConfig {
            spawn_rate: 0.0,
            tracker_smoothing: 1.0,
            fruit_radius: radius,
            ..GameConfig::default()
        };
        let mut session = Session::new(config, 1).expect("valid config");
        session
            .tick(FrameInput::new(SESSION_FRAME).with_start())
            .expect("start frame");

        let points = 2 + rng.next_int(3) as usize;
        let hand = random_hand_path(&mut rng, points);
        let anchor_at = session.clock() + SESSION_FRAME;
        session
            .tick(
                FrameInput::new(SESSION_FRAME)
                    .with_sample(HandSample::new(anchor_at, hand[0].x, hand[0].y, 1.0)),
            )
            .expect("anchor frame");

        let start = Vec2::new(rng.next_range_f32(0.2, 0.8), rng.next_range_f32(0.2, 0.8));
        let velocity = Vec2::new(rng.next_range_f32(-6.0, 6.0), rng.next_range_f32(-6.0, 6.0));
        let id = session.inject_fruit(FruitKind::Apple, start, velocity);

        let frame_end = anchor_at + SESSION_FRAME;
        let later = hand.len() - 1;
        let samples = hand[1..]
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let at = anchor_at + SESSION_FRAME * (index + 1) as f64 / later as f64;
                HandSample::new(at.min(frame_end), point.x, point.y, 1.0)
            })
            .collect();
        let snapshot = session
            .tick(FrameInput::new(SESSION_FRAME).with_samples(samples))
            .expect("slice frame");
        let end = session.fruits().get(id).expect("fruit tracked").position;

        let touched = (0..=SUBSTEPS).any(|step| {
            let point = start.lerp(end, step as f32 / SUBSTEPS as f32);
            near_polyline(point, &hand, radius * 0.95)
        });
        if !touched {
            continue;
        }
        contacts += 1;

        let chord = [hand[0], hand[later]];
        if (0..=SUBSTEPS).all(|step| {
            let point = start.lerp(end, step as f32 / SUBSTEPS as f32);
            !near_polyline(point, &chord, radius)
        }) {
            chord_misses += 1;
        }

        assert_eq!(
            snapshot.hits().count(),
            1,
            "hand {hand:?} skipped fruit moving {start:?} -> {end:?}"
        );
    }

    assert!(contacts > 30, "only {contacts} contacts generated");
    assert!(
        chord_misses > 0,
        "cases should include paths whose first-to-last chord misses the fruit"
    );
}
