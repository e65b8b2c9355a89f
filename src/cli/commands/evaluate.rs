//! Evaluate command - Play trained agents against a random agent and each other

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;

use crate::{
    app::{AgentConfig, App},
    cli::output::{create_progress, print_head_to_head, print_kv, print_section, print_subsection},
    pipeline::{HeadToHead, head_to_head},
    q_learning::AfterstateAgent,
    tictactoe::{TicTacToeEnv, Variant},
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate trained values")]
pub struct EvaluateArgs {
    /// Value file to evaluate
    #[arg(required_unless_present = "curve")]
    pub values: Option<PathBuf>,

    /// Rule variant the values were trained on
    #[arg(long, value_enum, default_value_t = Variant::Standard)]
    pub variant: Variant,

    /// Second value file to play against
    #[arg(long)]
    pub against: Option<PathBuf>,

    /// Evaluate every checkpoint in this directory instead of one file
    #[arg(long, conflicts_with = "values")]
    pub curve: Option<PathBuf>,

    /// Games per seat against the random agent
    #[arg(long, short = 'g', default_value_t = 1000)]
    pub games: usize,

    /// Random seed for the random agent
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for cached afterstate tables
    #[arg(long)]
    pub table_cache: Option<PathBuf>,

    /// Export results to file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct MatchupExport {
    opponent: String,
    games: usize,
    wins: usize,
    losses: usize,
    draws: usize,
    #[serde(flatten)]
    by_seat: HeadToHead,
}

impl MatchupExport {
    fn new(opponent: impl Into<String>, tally: HeadToHead) -> Self {
        Self {
            opponent: opponent.into(),
            games: tally.total_games(),
            wins: tally.wins(),
            losses: tally.losses(),
            draws: tally.draws(),
            by_seat: tally,
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckpointExport {
    games_trained: usize,
    values: PathBuf,
    vs_random: MatchupExport,
    #[serde(skip_serializing_if = "Option::is_none")]
    vs_previous: Option<MatchupExport>,
}

#[derive(Debug, Serialize)]
struct EvaluationExport {
    variant: Variant,
    games_per_seat: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    matchups: Vec<MatchupExport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    curve: Vec<CheckpointExport>,
}

/// Checkpoints written by `train --checkpoint-dir`, ordered by games trained
pub fn list_checkpoints(dir: &Path) -> Result<Vec<(usize, PathBuf)>> {
    let mut checkpoints = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("reading checkpoints in {}", dir.display()))?
    {
        let path = entry?.path();
        let games = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix("values_"))
            .and_then(|name| name.strip_suffix(".bin"))
            .and_then(|games| games.parse::<usize>().ok());
        if let Some(games) = games {
            checkpoints.push((games, path));
        }
    }
    checkpoints.sort();
    Ok(checkpoints)
}

struct Evaluator {
    app: App,
    config: AgentConfig,
    env: TicTacToeEnv,
    random: AfterstateAgent,
    games_per_seat: usize,
}

impl Evaluator {
    fn new(args: &EvaluateArgs) -> Result<Self> {
        let mut app = App::new();
        if let Some(dir) = &args.table_cache {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating table cache {}", dir.display()))?;
            app = app.with_table_cache(dir);
        }

        let mut random = AfterstateAgent::random(app.table(args.variant)?);
        if let Some(seed) = args.seed {
            random = random.with_seed(seed);
        }

        Ok(Self {
            app,
            config: AgentConfig::new(args.variant).with_explore(false),
            env: TicTacToeEnv::new(args.variant),
            random,
            games_per_seat: args.games,
        })
    }

    fn load(&self, path: &Path) -> Result<AfterstateAgent> {
        let name = path.display().to_string();
        let agent = self
            .app
            .load_agent(&self.config, path)
            .with_context(|| format!("loading values from {name}"))?;
        Ok(agent.with_name(name))
    }

    fn against_random(&mut self, agent: &mut AfterstateAgent) -> Result<HeadToHead> {
        Ok(head_to_head(
            &mut self.env,
            agent,
            &mut self.random,
            self.games_per_seat,
        )?)
    }

    /// Greedy agents are deterministic, so one game per seat settles it
    fn against(
        &mut self,
        agent: &mut AfterstateAgent,
        other: &mut AfterstateAgent,
    ) -> Result<HeadToHead> {
        Ok(head_to_head(&mut self.env, agent, other, 1)?)
    }
}

/// Execute the evaluate command
pub fn execute(args: EvaluateArgs) -> Result<()> {
    let mut evaluator = Evaluator::new(&args)?;
    let mut export = EvaluationExport {
        variant: args.variant,
        games_per_seat: args.games,
        seed: args.seed,
        matchups: Vec::new(),
        curve: Vec::new(),
    };

    print_section("Evaluation");
    print_kv("Variant", &args.variant.to_string());
    print_kv("Games per seat", &args.games.to_string());
    if let Some(seed) = args.seed {
        print_kv("Seed", &seed.to_string());
    }

    if let Some(dir) = &args.curve {
        export.curve = evaluate_curve(&mut evaluator, dir)?;
    } else {
        let path = args
            .values
            .as_deref()
            .ok_or_else(|| anyhow!("a value file or --curve directory is required"))?;
        let mut agent = evaluator.load(path)?;

        print_subsection(&format!("{} vs random", path.display()));
        let tally = evaluator.against_random(&mut agent)?;
        print_head_to_head(&tally);
        export.matchups.push(MatchupExport::new("random", tally));

        if let Some(other_path) = &args.against {
            let mut other = evaluator.load(other_path)?;
            print_subsection(&format!("{} vs {}", path.display(), other_path.display()));
            let tally = evaluator.against(&mut agent, &mut other)?;
            print_head_to_head(&tally);
            export
                .matchups
                .push(MatchupExport::new(other_path.display().to_string(), tally));
        }
    }

    if let Some(export_path) = &args.export {
        let file = File::create(export_path)
            .with_context(|| format!("creating {}", export_path.display()))?;
        serde_json::to_writer_pretty(file, &export)?;
        println!("\nResults exported to: {}", export_path.display());
    }

    Ok(())
}

fn evaluate_curve(evaluator: &mut Evaluator, dir: &Path) -> Result<Vec<CheckpointExport>> {
    let checkpoints = list_checkpoints(dir)?;
    if checkpoints.is_empty() {
        return Err(anyhow!("no checkpoints found in {}", dir.display()));
    }

    let pb = create_progress(checkpoints.len() as u64, "checkpoints")?;
    let mut curve = Vec::with_capacity(checkpoints.len());
    let mut previous: Option<AfterstateAgent> = None;

    for (games, path) in checkpoints {
        pb.set_message(format!("{games} games"));
        let mut agent = evaluator.load(&path)?;

        let vs_random = evaluator.against_random(&mut agent)?;
        let vs_previous = match previous.as_mut() {
            Some(prev) => Some(evaluator.against(&mut agent, prev)?),
            None => None,
        };

        curve.push(CheckpointExport {
            games_trained: games,
            values: path,
            vs_random: MatchupExport::new("random", vs_random),
            vs_previous: vs_previous.map(|tally| MatchupExport::new("previous", tally)),
        });
        previous = Some(agent);
        pb.inc(1);
    }
    pb.finish_and_clear();

    print_subsection("Learning curve vs random");
    println!(
        "  {:>10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "games", "1st win", "1st lose", "1st draw", "2nd win", "2nd lose", "2nd draw"
    );
    for point in &curve {
        let seats = &point.vs_random.by_seat;
        println!(
            "  {:>10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            point.games_trained,
            seats.first_move_win,
            seats.first_move_lose,
            seats.first_move_draw,
            seats.second_move_win,
            seats.second_move_lose,
            seats.second_move_draw
        );
    }

    Ok(curve)
}
