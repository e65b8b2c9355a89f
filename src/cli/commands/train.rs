//! Train command - Self-play training of an afterstate agent

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    app::{AgentConfig, App, TrainingConfig},
    cli::output::{format_number, format_rate, print_kv, print_section, print_subsection},
    pipeline::{
        JsonlObserver, MetricsObserver, MetricsSummary, MilestoneObserver, ProgressObserver,
        SampleLogObserver, SelfPlay, SharedObserver, TrainingResult,
    },
    tictactoe::{TicTacToeEnv, Variant},
};

#[derive(Debug, Serialize)]
struct SummaryStats {
    total_games: usize,
    first_player_wins: usize,
    second_player_wins: usize,
    draws: usize,
    first_player_win_rate: f64,
    second_player_win_rate: f64,
    draw_rate: f64,
}

impl From<&TrainingResult> for SummaryStats {
    fn from(result: &TrainingResult) -> Self {
        Self {
            total_games: result.total_games,
            first_player_wins: result.first_player_wins,
            second_player_wins: result.second_player_wins,
            draws: result.draws,
            first_player_win_rate: result.first_player_win_rate,
            second_player_win_rate: result.second_player_win_rate,
            draw_rate: result.draw_rate,
        }
    }
}

#[derive(Debug, Serialize)]
struct MilestoneSummary {
    first_draw: Option<usize>,
    last_decisive: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    training: SummaryStats,
    metrics: MetricsSummary,
    milestones: MilestoneSummary,
    agent: AgentConfig,
    schedule: TrainingConfig,
    afterstates: usize,
    values: PathBuf,
    checkpoints: Vec<PathBuf>,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Treat trailing separators or missing filename as a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

/// File name of the checkpoint written after `games_played` games
pub fn checkpoint_path(dir: &Path, games_played: usize) -> PathBuf {
    dir.join(format!("values_{games_played:08}.bin"))
}

#[derive(Parser, Debug)]
#[command(about = "Train an agent by self-play")]
pub struct TrainArgs {
    /// Rule variant to train on
    #[arg(long, value_enum, default_value_t = Variant::Standard)]
    pub variant: Variant,

    /// Number of self-play games
    #[arg(long, short = 'g', default_value_t = 1_000_000)]
    pub games: usize,

    /// Learning rate α (0.0-1.0)
    #[arg(long, default_value_t = 0.1)]
    pub alpha: f64,

    /// Discount factor γ (0.0-1.0)
    #[arg(long, default_value_t = 0.9)]
    pub gamma: f64,

    /// Exploration rate ε (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    pub epsilon: f64,

    /// Always play greedily while training
    #[arg(long, default_value_t = false)]
    pub no_explore: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file for the learned values
    #[arg(long, short = 'O')]
    pub output: Option<PathBuf>,

    /// Directory for periodic value checkpoints
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Games between checkpoints
    #[arg(long, default_value_t = 10_000)]
    pub checkpoint_interval: usize,

    /// Games between logged sample games (0 disables)
    #[arg(long, default_value_t = 10_000)]
    pub sample_interval: usize,

    /// Optional file for JSONL observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Directory for cached afterstate tables
    #[arg(long)]
    pub table_cache: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl TrainArgs {
    fn agent_config(&self) -> AgentConfig {
        let config = AgentConfig::new(self.variant)
            .with_learning_rate(self.alpha)
            .with_discount_factor(self.gamma)
            .with_epsilon(self.epsilon)
            .with_explore(!self.no_explore);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    fn training_config(&self) -> TrainingConfig {
        let checkpoint_interval = if self.checkpoint_dir.is_some() {
            self.checkpoint_interval
        } else {
            0
        };
        TrainingConfig::new(self.games)
            .with_checkpoint_interval(checkpoint_interval)
            .with_sample_interval(self.sample_interval)
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.values", self.variant)))
    }
}

/// Execute the train command
pub fn execute(args: TrainArgs) -> Result<()> {
    let agent_config = args.agent_config();
    let training_config = args.training_config();
    let output = args.output_path();

    let mut app = App::new();
    if let Some(dir) = &args.table_cache {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating table cache {}", dir.display()))?;
        app = app.with_table_cache(dir);
    }
    let mut agent = app.create_agent(&agent_config)?;

    print_section("Self-Play Training");
    print_kv("Variant", &args.variant.to_string());
    print_kv("Games", &format_number(training_config.games));
    print_kv(
        "α / γ / ε",
        &format!("{} / {} / {}", args.alpha, args.gamma, args.epsilon),
    );
    print_kv("Explore", &agent_config.explore.to_string());
    print_kv("Afterstates", &format_number(agent.table().afterstate_count()));
    if let Some(seed) = args.seed {
        print_kv("Seed", &seed.to_string());
    }

    let metrics = SharedObserver::new(MetricsObserver::new());
    let milestones = SharedObserver::new(MilestoneObserver::new());
    let mut driver = SelfPlay::new(TicTacToeEnv::new(args.variant))
        .with_observer(Box::new(metrics.clone()))
        .with_observer(Box::new(milestones.clone()));
    if !args.no_progress {
        driver = driver.with_observer(Box::new(ProgressObserver::new()));
    }
    if training_config.sample_interval > 0 {
        driver = driver.with_observer(Box::new(SampleLogObserver::new(
            training_config.sample_interval,
        )));
    }
    if let Some(path) = &args.observations {
        driver = driver.with_observer(Box::new(JsonlObserver::new(path)?));
    }

    let mut checkpoints = Vec::new();
    if let Some(dir) = &args.checkpoint_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating checkpoint directory {}", dir.display()))?;
        // The untrained values are the first point of the learning curve
        let path = checkpoint_path(dir, 0);
        agent.save_values(&path)?;
        checkpoints.push(path);
    }

    let result = driver.run_with(&mut agent, training_config.games, |played, agent| {
        if let Some(dir) = &args.checkpoint_dir
            && training_config.checkpoint_due(played)
        {
            let path = checkpoint_path(dir, played);
            agent.save_values(&path)?;
            log::info!("Checkpoint after {played} games: {}", path.display());
            checkpoints.push(path);
        }
        Ok(())
    })?;

    app.save_agent(&agent, &output)
        .with_context(|| format!("saving values to {}", output.display()))?;

    print_subsection("Results");
    print_kv("Games played", &format_number(result.total_games));
    print_kv(
        "First player wins",
        &format_rate(result.first_player_wins, result.total_games),
    );
    print_kv(
        "Second player wins",
        &format_rate(result.second_player_wins, result.total_games),
    );
    print_kv("Draws", &format_rate(result.draws, result.total_games));

    let metrics_summary = metrics.borrow().summary();
    print_kv(
        "Avg game length",
        &format!("{:.2} moves", metrics_summary.avg_game_length),
    );
    let milestone_summary = {
        let milestones = milestones.borrow();
        MilestoneSummary {
            first_draw: milestones.first_draw(),
            last_decisive: milestones.last_decisive(),
        }
    };
    if let Some(game) = milestone_summary.last_decisive {
        print_kv("Last decisive game", &format_number(game + 1));
    }
    print_kv("Values", &output.display().to_string());
    if !checkpoints.is_empty() {
        print_kv("Checkpoints", &checkpoints.len().to_string());
    }

    if let Some(raw) = &args.summary {
        let path = sanitize_summary_path(raw);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let summary = TrainingSummaryFile {
            training: SummaryStats::from(&result),
            metrics: metrics_summary,
            milestones: milestone_summary,
            agent: agent_config,
            schedule: training_config,
            afterstates: agent.table().afterstate_count(),
            values: output,
            checkpoints,
        };
        let file = File::create(&path)
            .with_context(|| format!("creating summary {}", path.display()))?;
        to_writer_pretty(file, &summary)?;
        println!("\nSummary written to {}", path.display());
    }

    Ok(())
}
