//! The game loop.
//!
//! A [`Session`] owns every component and is the only thing that moves the
//! game between phases. Hosts call [`Session::tick`] once per rendered frame
//! with the frame's duration and whatever hand samples arrived; each call
//! returns an owned [`FrameSnapshot`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::CollisionEngine;
use crate::config::GameConfig;
use crate::error::{ConfigError, InvariantViolation, RuleCode, SessionError};
use crate::fruit::{Fruit, FruitId, FruitKind, FruitSet, FruitState};
use crate::gesture::{GestureEvent, GestureMapper, SliceSegment};
use crate::physics::{FixedStepAccumulator, PhysicsEngine};
use crate::score::{ScoreKeeper, ScoreState};
use crate::snapshot::{
    FrameEvent, FrameSnapshot, FruitView, GameOverReason, GamePhase, HitEvent, MissEvent,
};
use crate::spawn::SpawnScheduler;
use crate::tracker::{HandSample, TrajectoryTracker};

/// What the host hands the session for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameInput {
    /// Wall time since the previous frame, in seconds.
    pub dt: f64,
    /// Samples that arrived since the previous frame, oldest first. Empty
    /// means no new sample, not a zero-confidence one.
    pub samples: Vec<HandSample>,
    pub start: bool,
    pub restart: bool,
}

impl FrameInput {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            ..Self::default()
        }
    }

    pub fn with_samples(mut self, samples: Vec<HandSample>) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_sample(mut self, sample: HandSample) -> Self {
        self.samples.push(sample);
        self
    }

    pub fn with_start(mut self) -> Self {
        self.start = true;
        self
    }

    pub fn with_restart(mut self) -> Self {
        self.restart = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    config: GameConfig,
    seed: u32,
    phase: GamePhase,
    frame: u64,
    clock: f64,
    round_started_at: f64,
    game_over_reason: Option<GameOverReason>,
    dropped_samples_total: u64,
    tracker: TrajectoryTracker,
    mapper: GestureMapper,
    physics: PhysicsEngine,
    accumulator: FixedStepAccumulator,
    collision: CollisionEngine,
    spawner: SpawnScheduler,
    score: ScoreKeeper,
    fruits: FruitSet,
}

impl Session {
    pub fn new(config: GameConfig, seed: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            seed,
            phase: GamePhase::Attract,
            frame: 0,
            clock: 0.0,
            round_started_at: 0.0,
            game_over_reason: None,
            dropped_samples_total: 0,
            tracker: TrajectoryTracker::new(&config),
            mapper: GestureMapper::new(&config),
            physics: PhysicsEngine::new(&config),
            accumulator: FixedStepAccumulator::new(&config),
            collision: CollisionEngine::new(&config),
            spawner: SpawnScheduler::new(&config, seed),
            score: ScoreKeeper::new(&config),
            fruits: FruitSet::new(),
            config,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Seconds since the session was created. Hand sample timestamps are
    /// expected on this clock.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn round_elapsed(&self) -> f64 {
        match self.phase {
            GamePhase::Attract => 0.0,
            GamePhase::Playing | GamePhase::GameOver => self.clock - self.round_started_at,
        }
    }

    pub fn score(&self) -> &ScoreState {
        self.score.state()
    }

    pub fn fruits(&self) -> &FruitSet {
        &self.fruits
    }

    pub fn tracker(&self) -> &TrajectoryTracker {
        &self.tracker
    }

    pub fn spawner(&self) -> &SpawnScheduler {
        &self.spawner
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over_reason
    }

    pub fn dropped_samples_total(&self) -> u64 {
        self.dropped_samples_total
    }

    /// Places a fruit directly into the field, bypassing the spawn scheduler.
    pub fn inject_fruit(&mut self, kind: FruitKind, position: Vec2, velocity: Vec2) -> FruitId {
        let id = self.fruits.allocate_id();
        self.fruits.insert(Fruit::new(
            id,
            kind,
            position,
            velocity,
            self.config.fruit_radius,
            self.clock,
        ));
        tracing::debug!(%id, ?kind, "fruit injected");
        id
    }

    pub fn tick(&mut self, input: FrameInput) -> Result<FrameSnapshot, InvariantViolation> {
        self.frame += 1;
        let dt = if input.dt.is_finite() && input.dt >= 0.0 {
            input.dt
        } else {
            tracing::warn!(frame = self.frame, dt = input.dt, "ignoring invalid frame time");
            0.0
        };
        self.clock += dt;

        let mut dropped = 0u32;
        for sample in input.samples {
            if let Err(anomaly) = self.tracker.ingest(sample) {
                dropped += 1;
                tracing::trace!(frame = self.frame, %anomaly, "hand sample dropped");
            }
        }
        self.dropped_samples_total += dropped as u64;
        self.tracker.prune(self.clock);

        let gestures = self.mapper.update(&self.tracker, self.clock);
        let slice_began = gestures
            .iter()
            .any(|event| matches!(event, GestureEvent::SliceBegin { .. }));

        let mut events = Vec::new();
        match self.phase {
            GamePhase::Attract => {
                if input.start || (self.config.slice_to_start && slice_began) {
                    self.begin_round();
                }
            }
            GamePhase::Playing => {
                let segments: Vec<SliceSegment> = gestures
                    .iter()
                    .filter_map(|event| match event {
                        GestureEvent::SliceSegment(segment) => Some(*segment),
                        _ => None,
                    })
                    .collect();
                self.advance_round(dt, &segments, &mut events)
                    .map_err(|rule| self.violation(rule))?;
            }
            GamePhase::GameOver => {
                if input.start {
                    self.begin_round();
                } else if input.restart {
                    self.return_to_attract();
                }
            }
        }

        self.validate_invariants()
            .map_err(|rule| self.violation(rule))?;
        Ok(self.snapshot(events, dropped))
    }

    fn begin_round(&mut self) {
        self.phase = GamePhase::Playing;
        self.round_started_at = self.clock;
        self.game_over_reason = None;
        self.fruits.clear();
        self.score.reset();
        self.spawner.reset_round();
        self.accumulator.reset();
        tracing::info!(
            frame = self.frame,
            seed = self.seed,
            lives = self.score.lives_remaining(),
            "round started"
        );
    }

    fn return_to_attract(&mut self) {
        self.phase = GamePhase::Attract;
        self.game_over_reason = None;
        self.fruits.clear();
        self.score.reset();
        self.accumulator.reset();
        tracing::info!(frame = self.frame, "returned to attract");
    }

    fn end_round(&mut self, reason: GameOverReason) {
        self.phase = GamePhase::GameOver;
        self.game_over_reason = Some(reason);
        let state = self.score.state();
        tracing::info!(
            frame = self.frame,
            ?reason,
            score = state.points,
            max_combo = state.max_combo,
            "round over"
        );
    }

    fn advance_round(
        &mut self,
        dt: f64,
        segments: &[SliceSegment],
        events: &mut Vec<FrameEvent>,
    ) -> Result<(), RuleCode> {
        self.fruits.mark_frame_origins();

        let steps = self.accumulator.advance(dt);
        let step = self.accumulator.step_seconds() as f32;
        for _ in 0..steps {
            self.physics.step(&mut self.fruits, step);
        }
        let frame_time = steps as f32 * step;

        let elapsed = self.clock - self.round_started_at;
        self.spawner
            .poll(elapsed, self.score.state().points, self.clock, &mut self.fruits);

        let hits = self
            .collision
            .resolve_slices(segments, &mut self.fruits, frame_time, self.clock)?;
        for hit in hits {
            let award = self.score.on_hit(hit.kind, self.clock);
            events.push(FrameEvent::Hit(HitEvent::new(hit, award)));
        }

        let exits = self.collision.detect_exits(&mut self.fruits, self.clock)?;
        for exit in exits {
            if exit.state == FruitState::Missed {
                self.score.on_miss();
                events.push(FrameEvent::Miss(MissEvent {
                    fruit_id: exit.fruit_id,
                    kind: exit.kind,
                    position: exit.position,
                }));
            }
        }

        self.fruits
            .purge_resolved(self.clock, self.config.removal_grace_seconds);

        if self.score.is_depleted() {
            self.end_round(GameOverReason::LivesDepleted);
        } else if self
            .config
            .round_time_limit_seconds
            .is_some_and(|limit| elapsed >= limit)
        {
            self.end_round(GameOverReason::TimeUp);
        }

        Ok(())
    }

    pub fn validate_invariants(&self) -> Result<(), RuleCode> {
        let lives = self.score.lives_remaining();
        let phase_lives_consistent = match (self.phase, self.game_over_reason) {
            (GamePhase::Attract, None) => true,
            (GamePhase::Playing, None) => lives > 0,
            (GamePhase::GameOver, Some(GameOverReason::LivesDepleted)) => lives == 0,
            (GamePhase::GameOver, Some(GameOverReason::TimeUp)) => lives > 0,
            _ => false,
        };
        if !phase_lives_consistent {
            return Err(RuleCode::PhaseLivesConsistency);
        }

        if lives > self.score.starting_lives() {
            return Err(RuleCode::LivesAboveMaximum);
        }

        for (id, fruit) in self.fruits.entries() {
            if *id != fruit.id {
                return Err(RuleCode::FruitIdMismatch);
            }
            let resolution_consistent = match (fruit.state.is_terminal(), fruit.resolved_at) {
                (false, None) => true,
                (true, Some(at)) => at >= fruit.spawned_at && at <= self.clock,
                _ => false,
            };
            if !resolution_consistent {
                return Err(RuleCode::FruitResolutionTimestamp);
            }
            if !fruit.position.is_finite() || !fruit.velocity.is_finite() || !fruit.rotation.is_finite()
            {
                return Err(RuleCode::FruitNonFinite);
            }
        }

        let path = self.tracker.current_path();
        if !path
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
        {
            return Err(RuleCode::SlicePathOrder);
        }
        let oldest_allowed = self.clock - self.tracker.retention_window();
        if path.first().is_some_and(|point| point.timestamp < oldest_allowed) {
            return Err(RuleCode::SlicePathRetention);
        }

        Ok(())
    }

    fn violation(&self, rule: RuleCode) -> InvariantViolation {
        tracing::error!(frame = self.frame, %rule, "invariant violation");
        InvariantViolation {
            frame: self.frame,
            rule,
        }
    }

    fn snapshot(&self, events: Vec<FrameEvent>, dropped_samples: u32) -> FrameSnapshot {
        let state = self.score.state();
        FrameSnapshot {
            frame: self.frame,
            time: self.clock,
            phase: self.phase,
            score: state.points,
            lives: state.lives,
            combo: state.combo,
            max_combo: state.max_combo,
            active_fruits: self.fruits.iter().map(FruitView::from).collect(),
            events,
            slice_path: self.tracker.current_path().to_vec(),
            slicing: self.mapper.is_slicing(),
            game_over_reason: self.game_over_reason,
            dropped_samples,
        }
    }
}

/// Runs a fresh session over `frames` and collects every snapshot.
pub fn simulate<I>(config: GameConfig, seed: u32, frames: I) -> Result<Vec<FrameSnapshot>, SessionError>
where
    I: IntoIterator<Item = FrameInput>,
{
    let mut session = Session::new(config, seed)?;
    let mut snapshots = Vec::new();
    for input in frames {
        snapshots.push(session.tick(input)?);
    }
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn quiet_config() -> GameConfig {
        GameConfig {
            spawn_rate: 0.0,
            tracker_smoothing: 1.0,
            ..GameConfig::default()
        }
    }

    fn playing(config: GameConfig) -> Session {
        let mut session = Session::new(config, 42).expect("valid config");
        let snapshot = session
            .tick(FrameInput::new(DT).with_start())
            .expect("start frame");
        assert_eq!(snapshot.phase, GamePhase::Playing);
        session
    }

    #[test]
    fn invalid_config_does_not_start() {
        let result = Session::new(
            GameConfig {
                spawn_rate: -1.0,
                ..GameConfig::default()
            },
            1,
        );
        assert!(matches!(
            result,
            Err(ConfigError::OutOfRange {
                field: "spawn_rate",
                ..
            })
        ));
    }

    #[test]
    fn attract_waits_for_start() {
        let mut session = Session::new(GameConfig::default(), 1).expect("valid config");
        for _ in 0..120 {
            let snapshot = session.tick(FrameInput::new(DT)).expect("attract frame");
            assert_eq!(snapshot.phase, GamePhase::Attract);
            assert!(snapshot.active_fruits.is_empty());
        }
        let snapshot = session
            .tick(FrameInput::new(DT).with_start())
            .expect("start frame");
        assert_eq!(snapshot.phase, GamePhase::Playing);
        assert_eq!(snapshot.lives, 3);
    }

    #[test]
    fn slice_starts_the_round_when_enabled() {
        let mut session = Session::new(
            GameConfig {
                slice_to_start: true,
                ..quiet_config()
            },
            1,
        )
        .expect("valid config");

        let first = session.clock() + DT;
        session
            .tick(FrameInput::new(DT).with_sample(HandSample::new(first, 0.1, 0.5, 1.0)))
            .expect("frame");
        let second = session.clock() + DT;
        let snapshot = session
            .tick(FrameInput::new(DT).with_sample(HandSample::new(second, 0.4, 0.5, 1.0)))
            .expect("frame");
        assert_eq!(snapshot.phase, GamePhase::Playing);
    }

    #[test]
    fn blade_across_fruit_slices_it_and_scores() {
        let mut session = playing(quiet_config());
        let id = session.inject_fruit(FruitKind::Apple, Vec2::new(0.5, 0.5), Vec2::ZERO);

        let t1 = session.clock() + DT;
        session
            .tick(FrameInput::new(DT).with_sample(HandSample::new(t1, 0.1, 0.5, 1.0)))
            .expect("frame");
        let t2 = session.clock() + DT;
        let snapshot = session
            .tick(FrameInput::new(DT).with_sample(HandSample::new(t2, 0.9, 0.5, 1.0)))
            .expect("frame");

        let hits: Vec<_> = snapshot.hits().collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].hit.fruit_id, id);
        assert_eq!(snapshot.score, 10);
        assert_eq!(snapshot.combo, 1);
        let view = snapshot
            .active_fruits
            .iter()
            .find(|fruit| fruit.id == id)
            .expect("sliced fruit stays visible during grace");
        assert_eq!(view.state, FruitState::Sliced);
    }

    #[test]
    fn sliced_fruits_are_purged_after_grace() {
        let mut session = playing(quiet_config());
        let id = session.inject_fruit(FruitKind::Apple, Vec2::new(0.5, 0.5), Vec2::ZERO);
        let t1 = session.clock() + DT;
        session
            .tick(FrameInput::new(DT).with_sample(HandSample::new(t1, 0.1, 0.5, 1.0)))
            .expect("frame");
        let t2 = session.clock() + DT;
        session
            .tick(FrameInput::new(DT).with_sample(HandSample::new(t2, 0.9, 0.5, 1.0)))
            .expect("frame");
        assert!(session.fruits().get(id).is_some());

        for _ in 0..90 {
            session.tick(FrameInput::new(DT)).expect("frame");
        }
        assert!(session.fruits().get(id).is_none());
    }

    #[test]
    fn unsliced_fruit_costs_a_life() {
        let mut session = playing(quiet_config());
        session.inject_fruit(FruitKind::Peach, Vec2::new(0.3, 0.9), Vec2::new(0.0, 1.0));

        let mut misses = 0;
        for _ in 0..60 {
            let snapshot = session.tick(FrameInput::new(DT)).expect("frame");
            misses += snapshot.misses().count();
        }
        assert_eq!(misses, 1);
        assert_eq!(session.score().lives, 2);
    }

    #[test]
    fn dropped_bomb_is_harmless_and_sliced_bomb_is_not() {
        let mut session = playing(quiet_config());
        session.inject_fruit(FruitKind::Bomb, Vec2::new(0.2, 0.95), Vec2::new(0.0, 1.0));
        for _ in 0..30 {
            let snapshot = session.tick(FrameInput::new(DT)).expect("frame");
            assert_eq!(snapshot.misses().count(), 0);
        }
        assert_eq!(session.score().lives, 3);

        session.inject_fruit(FruitKind::Bomb, Vec2::new(0.5, 0.5), Vec2::ZERO);
        let t1 = session.clock() + DT;
        session
            .tick(FrameInput::new(DT).with_sample(HandSample::new(t1, 0.1, 0.5, 1.0)))
            .expect("frame");
        let t2 = session.clock() + DT;
        let snapshot = session
            .tick(FrameInput::new(DT).with_sample(HandSample::new(t2, 0.9, 0.5, 1.0)))
            .expect("frame");
        assert_eq!(snapshot.lives, 2);
        assert!(snapshot.hits().all(|hit| hit.life_lost));
    }

    #[test]
    fn bad_samples_are_counted_not_fatal() {
        let mut session = playing(quiet_config());
        let t = session.clock() + DT;
        let snapshot = session
            .tick(FrameInput::new(DT).with_samples(vec![
                HandSample::new(t, 0.5, 0.5, 0.1),
                HandSample::new(t, f32::NAN, 0.5, 1.0),
                HandSample::new(t, 0.5, 0.5, 1.0),
                HandSample::new(t - 0.5, 0.5, 0.5, 1.0),
            ]))
            .expect("frame");
        assert_eq!(snapshot.dropped_samples, 3);
        assert_eq!(snapshot.slice_path.len(), 1);
        assert_eq!(session.dropped_samples_total(), 3);
    }

    #[test]
    fn game_over_then_restart_and_start() {
        let mut session = playing(GameConfig {
            max_lives: 1,
            ..quiet_config()
        });
        session.inject_fruit(FruitKind::Apple, Vec2::new(0.5, 0.99), Vec2::new(0.0, 2.0));
        let mut last = None;
        for _ in 0..30 {
            last = Some(session.tick(FrameInput::new(DT)).expect("frame"));
        }
        let last = last.expect("ticked");
        assert_eq!(last.phase, GamePhase::GameOver);
        assert_eq!(last.game_over_reason, Some(GameOverReason::LivesDepleted));
        assert_eq!(last.lives, 0);

        let attract = session
            .tick(FrameInput::new(DT).with_restart())
            .expect("frame");
        assert_eq!(attract.phase, GamePhase::Attract);
        assert!(attract.active_fruits.is_empty());

        let again = session
            .tick(FrameInput::new(DT).with_start())
            .expect("frame");
        assert_eq!(again.phase, GamePhase::Playing);
        assert_eq!(again.lives, 1);
        assert_eq!(again.score, 0);
    }

    #[test]
    fn time_limit_ends_round_with_lives_left() {
        let mut session = playing(GameConfig {
            round_time_limit_seconds: Some(1.0),
            ..quiet_config()
        });
        let mut phase = GamePhase::Playing;
        for _ in 0..70 {
            phase = session.tick(FrameInput::new(DT)).expect("frame").phase;
        }
        assert_eq!(phase, GamePhase::GameOver);
        assert_eq!(session.game_over_reason(), Some(GameOverReason::TimeUp));
        assert_eq!(session.score().lives, 3);
    }

    #[test]
    fn invalid_dt_does_not_move_the_clock() {
        let mut session = playing(quiet_config());
        let before = session.clock();
        session.tick(FrameInput::new(f64::NAN)).expect("frame");
        session.tick(FrameInput::new(-1.0)).expect("frame");
        assert_eq!(session.clock(), before);
    }

    #[test]
    fn invariants_hold_through_a_spawned_round() {
        let mut session = playing(GameConfig {
            spawn_rate: 3.0,
            ..GameConfig::default()
        });
        for _ in 0..3_600 {
            let snapshot = session.tick(FrameInput::new(DT)).expect("frame");
            if snapshot.phase == GamePhase::GameOver {
                break;
            }
        }
        session.validate_invariants().expect("invariants hold");
        assert_eq!(session.phase(), GamePhase::GameOver);
    }

    #[test]
    fn simulate_matches_manual_ticks() {
        let frames: Vec<FrameInput> = std::iter::once(FrameInput::new(DT).with_start())
            .chain((0..300).map(|_| FrameInput::new(DT)))
            .collect();
        let batch = simulate(GameConfig::default(), 9, frames.clone()).expect("simulate");

        let mut session = Session::new(GameConfig::default(), 9).expect("valid config");
        for (input, expected) in frames.into_iter().zip(&batch) {
            assert_eq!(&session.tick(input).expect("frame"), expected);
        }
    }
}
