use crate::hands::{create_hand, hand_fingerprint, SyntheticHand};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use slice_core::snapshot::{FrameSnapshot, GamePhase};
use slice_core::{FrameInput, GameConfig, Session};
use std::fs;
use std::path::Path;

/// Host frame time: a 60 Hz display.
pub const FRAME_SECONDS: f64 = 1.0 / 60.0;

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub hand_id: String,
    pub hand_fingerprint: String,
    pub seed: u32,
    pub max_frames: u32,
    pub frame_count: u32,
    pub final_score: u32,
    pub final_lives: u32,
    pub max_combo: u32,
    pub hits: u32,
    pub misses: u32,
    pub bombs_sliced: u32,
    pub dropped_samples: u64,
    pub game_over: bool,
    pub final_phase: GamePhase,
    pub elapsed_seconds: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    pub final_snapshot: FrameSnapshot,
}

pub fn run_hand(hand_id: &str, seed: u32, max_frames: u32, config: &GameConfig) -> Result<RunArtifact> {
    let mut hand = create_hand(hand_id).ok_or_else(|| anyhow!("unknown hand '{hand_id}'"))?;
    run_hand_instance(hand.as_mut(), seed, max_frames, config)
}

pub fn run_hand_instance(
    hand: &mut dyn SyntheticHand,
    seed: u32,
    max_frames: u32,
    config: &GameConfig,
) -> Result<RunArtifact> {
    if max_frames == 0 {
        return Err(anyhow!("max_frames must be > 0"));
    }

    hand.reset(seed);
    let mut session = Session::new(config.clone(), seed)
        .with_context(|| format!("session rejected config for seed {seed:#x}"))?;

    // The first frame presses start; the hand joins from the next one.
    let mut snapshot = session
        .tick(FrameInput::new(FRAME_SECONDS).with_start())
        .context("first frame failed")?;

    let mut hits = 0u32;
    let mut misses = 0u32;
    let mut bombs_sliced = 0u32;
    let mut frame_count = 1u32;

    while frame_count < max_frames && snapshot.phase != GamePhase::GameOver {
        let now = session.clock() + FRAME_SECONDS;
        let samples = hand.next_samples(&snapshot, now);
        snapshot = session
            .tick(FrameInput::new(FRAME_SECONDS).with_samples(samples))
            .with_context(|| format!("hand '{}' seed {seed:#x}", hand.id()))?;
        frame_count += 1;

        for hit in snapshot.hits() {
            if hit.hit.kind.is_bomb() {
                bombs_sliced += 1;
            } else {
                hits += 1;
            }
        }
        misses += snapshot.misses().count() as u32;
    }

    let score = session.score();
    tracing::debug!(
        hand = hand.id(),
        seed,
        frames = frame_count,
        score = score.points,
        "run finished"
    );

    Ok(RunArtifact {
        metrics: RunMetrics {
            hand_id: hand.id().to_string(),
            hand_fingerprint: hand_fingerprint(hand.id()).unwrap_or_else(|| "unknown".to_string()),
            seed,
            max_frames,
            frame_count,
            final_score: score.points,
            final_lives: score.lives,
            max_combo: score.max_combo,
            hits,
            misses,
            bombs_sliced,
            dropped_samples: session.dropped_samples_total(),
            game_over: snapshot.phase == GamePhase::GameOver,
            final_phase: snapshot.phase,
            elapsed_seconds: session.round_elapsed(),
        },
        final_snapshot: snapshot,
    })
}

pub fn write_report(path: &Path, artifact: &RunArtifact) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let encoded = serde_json::to_vec_pretty(artifact).context("failed to serialize run report")?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}
