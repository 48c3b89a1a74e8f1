use crate::hands::{create_hand, hand_ids};
use crate::runner::{run_hand, RunArtifact, RunMetrics};
use crate::util::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use slice_core::GameConfig;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Score,
    Survival,
    Hybrid,
}

impl Objective {
    pub fn run_value(self, metrics: &RunMetrics) -> f64 {
        let score = metrics.final_score as f64;
        let seconds = metrics.elapsed_seconds;
        let lives = metrics.final_lives as f64;
        let combo = metrics.max_combo as f64;
        match self {
            Self::Score => score + combo * 5.0 + lives * 10.0,
            Self::Survival => seconds * 10.0 + lives * 60.0 + score * 0.1,
            Self::Hybrid => score * 0.6 + seconds * 4.0 + lives * 25.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::Survival => "survival",
            Self::Hybrid => "hybrid",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub hands: Vec<String>,
    pub seeds: Vec<u32>,
    pub max_frames: u32,
    pub objective: Objective,
    pub game_config: GameConfig,
    pub out_dir: PathBuf,
    pub save_top: usize,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunRecord {
    pub hand_id: String,
    pub hand_fingerprint: String,
    pub seed: u32,
    pub seed_hex: String,
    pub frame_count: u32,
    pub final_score: u32,
    pub final_lives: u32,
    pub max_combo: u32,
    pub hits: u32,
    pub misses: u32,
    pub bombs_sliced: u32,
    pub dropped_samples: u64,
    pub game_over: bool,
    pub elapsed_seconds: f64,
    pub objective_value: f64,
}

impl RunRecord {
    fn new(metrics: &RunMetrics, objective_value: f64) -> Self {
        Self {
            hand_id: metrics.hand_id.clone(),
            hand_fingerprint: metrics.hand_fingerprint.clone(),
            seed: metrics.seed,
            seed_hex: seed_to_hex(metrics.seed),
            frame_count: metrics.frame_count,
            final_score: metrics.final_score,
            final_lives: metrics.final_lives,
            max_combo: metrics.max_combo,
            hits: metrics.hits,
            misses: metrics.misses,
            bombs_sliced: metrics.bombs_sliced,
            dropped_samples: metrics.dropped_samples,
            game_over: metrics.game_over,
            elapsed_seconds: metrics.elapsed_seconds,
            objective_value,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HandAggregate {
    pub hand_id: String,
    pub hand_fingerprint: String,
    pub runs: usize,
    pub avg_score: f64,
    pub max_score: u32,
    pub avg_seconds: f64,
    pub avg_lives: f64,
    pub best_combo: u32,
    /// Hits over hits plus misses, ignoring sliced bombs.
    pub hit_rate: f64,
    pub bombs_sliced: u32,
    pub survival_rate: f64,
    pub objective_value: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SavedRunRecord {
    pub rank: usize,
    pub metric: String,
    pub hand_id: String,
    pub seed_hex: String,
    pub score: u32,
    pub frames: u32,
    pub path: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub objective: Objective,
    pub max_frames: u32,
    pub jobs: Option<usize>,
    pub hands: Vec<String>,
    pub seeds: Vec<u32>,
    pub game_config: GameConfig,
    pub run_count: usize,
    pub hand_rankings: Vec<HandAggregate>,
    pub runs: Vec<RunRecord>,
    pub saved_runs: Vec<SavedRunRecord>,
}

struct InternalRun {
    artifact: RunArtifact,
    objective_value: f64,
}

pub fn resolve_hands(input: Option<&str>) -> Result<Vec<String>> {
    let hands: Vec<String> = match input {
        None => hand_ids().iter().map(|id| (*id).to_string()).collect(),
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect(),
    };
    if hands.is_empty() {
        return Err(anyhow!("--hands resolved to empty list"));
    }
    if let Some(unknown) = hands.iter().find(|id| create_hand(id).is_none()) {
        let available = hand_ids().join(", ");
        return Err(anyhow!("unknown hand '{unknown}'. available: {available}"));
    }
    Ok(hands)
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.hands.is_empty() {
        return Err(anyhow!("benchmark requires at least one hand"));
    }
    if config.jobs == Some(0) {
        return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
    }
    config
        .game_config
        .validate()
        .context("benchmark game config is invalid")?;
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_jobs: Vec<(String, u32)> = config
        .hands
        .iter()
        .flat_map(|hand| config.seeds.iter().map(move |seed| (hand.clone(), *seed)))
        .collect();
    tracing::info!(
        runs = run_jobs.len(),
        objective = config.objective.as_str(),
        "benchmark starting"
    );

    let run_one = |(hand_id, seed): &(String, u32)| -> Result<InternalRun> {
        let artifact = run_hand(hand_id, *seed, config.max_frames, &config.game_config)
            .with_context(|| format!("benchmark run failed for hand={hand_id} seed={seed:#x}"))?;
        let objective_value = config.objective.run_value(&artifact.metrics);
        Ok(InternalRun {
            artifact,
            objective_value,
        })
    };

    let run_results: Vec<Result<InternalRun>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };
    let runs = run_results.into_iter().collect::<Result<Vec<_>>>()?;

    let rankings = rank_hands(&runs, config.max_frames);

    let mut run_records: Vec<RunRecord> = runs
        .iter()
        .map(|run| RunRecord::new(&run.artifact.metrics, run.objective_value))
        .collect();
    run_records.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.final_score.cmp(&a.final_score))
            .then_with(|| a.hand_id.cmp(&b.hand_id))
            .then_with(|| a.seed.cmp(&b.seed))
    });

    let mut saved_runs = Vec::new();
    if config.save_top > 0 {
        save_top_runs(
            &config.out_dir,
            &runs,
            "objective",
            config.save_top,
            |run| run.objective_value,
            &mut saved_runs,
        )?;
        save_top_runs(
            &config.out_dir,
            &runs,
            "score",
            config.save_top,
            |run| run.artifact.metrics.final_score as f64,
            &mut saved_runs,
        )?;
    }

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        objective: config.objective,
        max_frames: config.max_frames,
        jobs: config.jobs,
        hands: config.hands,
        seeds: config.seeds,
        game_config: config.game_config,
        run_count: run_records.len(),
        hand_rankings: rankings,
        runs: run_records,
        saved_runs,
    };

    let report_path = config.out_dir.join("summary.json");
    fs::write(
        &report_path,
        serde_json::to_vec_pretty(&report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", report_path.display()))?;

    Ok(report)
}

fn rank_hands(runs: &[InternalRun], max_frames: u32) -> Vec<HandAggregate> {
    let mut grouped: BTreeMap<&str, Vec<&InternalRun>> = BTreeMap::new();
    for run in runs {
        grouped
            .entry(run.artifact.metrics.hand_id.as_str())
            .or_default()
            .push(run);
    }

    let mut rankings: Vec<HandAggregate> = grouped
        .into_iter()
        .map(|(hand_id, hand_runs)| {
            let count = hand_runs.len() as f64;
            let metrics = || hand_runs.iter().map(|run| &run.artifact.metrics);
            let hits: u64 = metrics().map(|m| m.hits as u64).sum();
            let misses: u64 = metrics().map(|m| m.misses as u64).sum();
            let survived = metrics()
                .filter(|m| !m.game_over && m.frame_count >= max_frames)
                .count();
            HandAggregate {
                hand_id: hand_id.to_string(),
                hand_fingerprint: metrics()
                    .next()
                    .map(|m| m.hand_fingerprint.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
                runs: hand_runs.len(),
                avg_score: metrics().map(|m| m.final_score as f64).sum::<f64>() / count,
                max_score: metrics().map(|m| m.final_score).max().unwrap_or_default(),
                avg_seconds: metrics().map(|m| m.elapsed_seconds).sum::<f64>() / count,
                avg_lives: metrics().map(|m| m.final_lives as f64).sum::<f64>() / count,
                best_combo: metrics().map(|m| m.max_combo).max().unwrap_or_default(),
                hit_rate: if hits + misses == 0 {
                    0.0
                } else {
                    hits as f64 / (hits + misses) as f64
                },
                bombs_sliced: metrics().map(|m| m.bombs_sliced).sum(),
                survival_rate: survived as f64 / count,
                objective_value: hand_runs.iter().map(|run| run.objective_value).sum::<f64>()
                    / count,
            }
        })
        .collect();

    rankings.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.avg_score.total_cmp(&a.avg_score))
            .then_with(|| a.hand_id.cmp(&b.hand_id))
    });
    rankings
}

fn save_top_runs<F>(
    out_dir: &Path,
    runs: &[InternalRun],
    metric_name: &str,
    count: usize,
    metric: F,
    saved_runs: &mut Vec<SavedRunRecord>,
) -> Result<()>
where
    F: Fn(&InternalRun) -> f64,
{
    let mut order: Vec<&InternalRun> = runs.iter().collect();
    order.sort_by(|a, b| {
        metric(b)
            .total_cmp(&metric(a))
            .then_with(|| a.artifact.metrics.seed.cmp(&b.artifact.metrics.seed))
    });

    let save_dir = out_dir.join(format!("top-{metric_name}"));
    fs::create_dir_all(&save_dir)
        .with_context(|| format!("failed creating {}", save_dir.display()))?;

    for (idx, run) in order.into_iter().take(count).enumerate() {
        let rank = idx + 1;
        let metrics = &run.artifact.metrics;
        let path = save_dir.join(format!(
            "rank{rank:02}-{}-seed{:08x}-score{}.json",
            metrics.hand_id, metrics.seed, metrics.final_score
        ));
        let report = serde_json::json!({
            "rank": rank,
            "metric": metric_name,
            "objective_value": run.objective_value,
            "run": run.artifact,
        });
        fs::write(
            &path,
            serde_json::to_vec_pretty(&report).context("failed to serialize top run report")?,
        )
        .with_context(|| format!("failed writing {}", path.display()))?;

        saved_runs.push(SavedRunRecord {
            rank,
            metric: metric_name.to_string(),
            hand_id: metrics.hand_id.clone(),
            seed_hex: seed_to_hex(metrics.seed),
            score: metrics.final_score,
            frames: metrics.frame_count,
            path: path.to_string_lossy().into_owned(),
        });
    }

    Ok(())
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "hand_id,hand_fingerprint,seed_hex,seed,frame_count,final_score,final_lives,max_combo,hits,misses,bombs_sliced,dropped_samples,game_over,elapsed_seconds,objective_value\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{:.3},{:.3}\n",
            row.hand_id,
            row.hand_fingerprint,
            row.seed_hex,
            row.seed,
            row.frame_count,
            row.final_score,
            row.final_lives,
            row.max_combo,
            row.hits,
            row.misses,
            row.bombs_sliced,
            row.dropped_samples,
            row.game_over,
            row.elapsed_seconds,
            row.objective_value
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[HandAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,hand_id,hand_fingerprint,runs,avg_score,max_score,avg_seconds,avg_lives,best_combo,hit_rate,bombs_sliced,survival_rate,objective_value\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{:.2},{},{:.2},{:.2},{},{:.4},{},{:.4},{:.4}\n",
            idx + 1,
            row.hand_id,
            row.hand_fingerprint,
            row.runs,
            row.avg_score,
            row.max_score,
            row.avg_seconds,
            row.avg_lives,
            row.best_combo,
            row.hit_rate,
            row.bombs_sliced,
            row.survival_rate,
            row.objective_value
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
