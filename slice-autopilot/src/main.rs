use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use slice_autopilot::benchmark::{resolve_hands, run_benchmark, BenchmarkConfig, Objective};
use slice_autopilot::config::load_config;
use slice_autopilot::hands::{create_hand, describe_hands, hand_ids, hand_manifest_entries};
use slice_autopilot::runner::{run_hand, write_report};
use slice_autopilot::util::{parse_seed, resolve_seeds, seed_to_hex, timestamp_suffix};
use slice_core::Difficulty;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "slice-autopilot")]
#[command(about = "Headless harness that plays the slicing game with synthetic hands")]
struct Cli {
    /// Game config JSON; omitted keys take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the difficulty from the config file
    #[arg(long, global = true, value_enum)]
    difficulty: Option<CliDifficulty>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available synthetic hands
    ListHands {
        /// Print the full manifest with config fingerprints as JSON
        #[arg(long)]
        manifest: bool,
    },
    /// Play one round with one hand
    Run {
        #[arg(long)]
        hand: String,
        #[arg(long)]
        seed: String,
        #[arg(long, default_value_t = 36_000)]
        max_frames: u32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run multi-seed benchmark across one or more hands
    Benchmark {
        #[arg(long)]
        hands: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long, default_value_t = 36_000)]
        max_frames: u32,
        #[arg(long, value_enum, default_value_t = CliObjective::Score)]
        objective: CliObjective,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        save_top: usize,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Validate the game config and print the resolved values
    CheckConfig,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliObjective {
    Score,
    Survival,
    Hybrid,
}

impl From<CliObjective> for Objective {
    fn from(value: CliObjective) -> Self {
        match value {
            CliObjective::Score => Objective::Score,
            CliObjective::Survival => Objective::Survival,
            CliObjective::Hybrid => Objective::Hybrid,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliDifficulty {
    Easy,
    Medium,
    Hard,
}

impl From<CliDifficulty> for Difficulty {
    fn from(value: CliDifficulty) -> Self {
        match value {
            CliDifficulty::Easy => Difficulty::Easy,
            CliDifficulty::Medium => Difficulty::Medium,
            CliDifficulty::Hard => Difficulty::Hard,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let Cli {
        config,
        difficulty,
        command,
    } = Cli::parse();
    let game_config = load_config(config.as_deref(), difficulty.map(Difficulty::from))?;

    match command {
        Commands::ListHands { manifest } => {
            if manifest {
                let encoded = serde_json::to_vec_pretty(&hand_manifest_entries())?;
                println!("{}", String::from_utf8_lossy(&encoded));
            } else {
                for (id, description) in describe_hands() {
                    println!("{id:14} {description}");
                }
            }
        }
        Commands::Run {
            hand,
            seed,
            max_frames,
            output,
        } => {
            if create_hand(&hand).is_none() {
                let available = hand_ids().join(", ");
                return Err(anyhow!("unknown hand '{hand}'. available: {available}"));
            }
            let seed = parse_seed(&seed)?;
            let artifact = run_hand(&hand, seed, max_frames, &game_config)?;
            let metrics = &artifact.metrics;

            println!("hand={}", metrics.hand_id);
            println!("hand_fingerprint={}", metrics.hand_fingerprint);
            println!("seed={}", seed_to_hex(seed));
            println!("frames={}", metrics.frame_count);
            println!("seconds={:.2}", metrics.elapsed_seconds);
            println!("score={}", metrics.final_score);
            println!("lives={}", metrics.final_lives);
            println!("max_combo={}", metrics.max_combo);
            println!("hits={}", metrics.hits);
            println!("misses={}", metrics.misses);
            println!("bombs_sliced={}", metrics.bombs_sliced);
            println!("dropped_samples={}", metrics.dropped_samples);
            println!("phase={:?}", metrics.final_phase);

            if let Some(path) = output {
                write_report(&path, &artifact)?;
                println!("output={}", path.display());
            }
        }
        Commands::Benchmark {
            hands,
            seeds,
            seed_file,
            seed_start,
            seed_count,
            max_frames,
            objective,
            out_dir,
            save_top,
            jobs,
        } => {
            let hands = resolve_hands(hands.as_deref())?;
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let objective: Objective = objective.into();
            let out_dir = out_dir.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "benchmarks/{}-{}",
                    objective.as_str(),
                    timestamp_suffix()
                ))
            });

            let report = run_benchmark(BenchmarkConfig {
                hands,
                seeds,
                max_frames,
                objective,
                game_config,
                out_dir: out_dir.clone(),
                save_top,
                jobs,
            })?;

            println!("objective={}", objective.as_str());
            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("hand rankings:");
            for (idx, hand) in report.hand_rankings.iter().enumerate() {
                println!(
                    "  {}. {}  objective={:.2} avg_score={:.1} max_score={} avg_seconds={:.1} hit_rate={:.0}% bombs={} survival={:.0}%",
                    idx + 1,
                    hand.hand_id,
                    hand.objective_value,
                    hand.avg_score,
                    hand.max_score,
                    hand.avg_seconds,
                    hand.hit_rate * 100.0,
                    hand.bombs_sliced,
                    hand.survival_rate * 100.0,
                );
            }
            println!("saved runs:");
            for run in report.saved_runs.iter().take(10) {
                println!(
                    "  [{} #{:02}] {} {} score={} frames={}",
                    run.metric, run.rank, run.hand_id, run.seed_hex, run.score, run.frames,
                );
            }
        }
        Commands::CheckConfig => {
            let encoded = serde_json::to_vec_pretty(&game_config)?;
            println!("{}", String::from_utf8_lossy(&encoded));
            println!("starting_lives={}", game_config.starting_lives());
            if let Some(path) = &config {
                println!("source={}", path.display());
            }
        }
    }

    Ok(())
}
