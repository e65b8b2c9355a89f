//! Play command - Interactive console game against trained values

use std::{
    fmt::{self, Write as _},
    fs,
    path::PathBuf,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use dialoguer::{Input, Select};

use crate::{
    app::{AgentConfig, App},
    cli::output::{print_kv, print_section},
    ports::{Agent, Environment},
    q_learning::AfterstateAgent,
    tictactoe::{Action, BOARD_CELLS, BoardState, Judgment, PASS, Player, TicTacToeEnv, Variant},
};

#[derive(Parser, Debug)]
#[command(about = "Play against trained values")]
pub struct PlayArgs {
    /// Value file of the opponent
    pub values: PathBuf,

    /// Rule variant the values were trained on
    #[arg(long, value_enum, default_value_t = Variant::Standard)]
    pub variant: Variant,

    /// Directory for cached afterstate tables
    #[arg(long)]
    pub table_cache: Option<PathBuf>,
}

/// One line of player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Place(Action),
    Pass,
    Hint,
    Resign,
}

/// Parse `"x y"` (column, row), `p`, `h` or `r`
pub fn parse_command(input: &str, variant: Variant) -> std::result::Result<Command, String> {
    let input = input.trim();
    match input.to_ascii_lowercase().as_str() {
        "h" => return Ok(Command::Hint),
        "r" => return Ok(Command::Resign),
        "p" if variant.allows_pass() => return Ok(Command::Pass),
        _ => {}
    }

    let coords: Vec<usize> = input
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| format!("expected two numbers 'x y', got '{input}'"))?;
    match coords.as_slice() {
        &[x, y] if x < 3 && y < 3 => Ok(Command::Place(y * 3 + x)),
        &[_, _] => Err("coordinates run from 0 to 2".to_string()),
        _ => Err(format!("expected two numbers 'x y', got '{input}'")),
    }
}

/// Draw the board with the first player as `X`, whoever is to move
pub fn render(state: &BoardState, mover: Player) -> String {
    let absolute = match mover {
        Player::X => *state,
        Player::O => state.reverse(),
    };

    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_board(&mut out, &absolute);
    out
}

fn write_board(out: &mut String, state: &BoardState) -> fmt::Result {
    writeln!(out, "    0 1 2")?;
    for y in 0..3 {
        write!(out, "  {y}")?;
        for x in 0..3 {
            write!(out, " {}", state.get(y * 3 + x).to_char())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn action_label(action: Action) -> String {
    if action == PASS {
        "pass".to_string()
    } else {
        format!("{} {}", action % 3, action / 3)
    }
}

/// Values of the legal moves scaled by 100, best first marked with `*`
fn hint(agent: &AfterstateAgent, state: &BoardState) -> Result<String> {
    let legal = state.legal_actions();
    let values: Vec<(Action, f64)> = agent
        .value_of_state(state.code())?
        .into_iter()
        .filter(|(action, _)| legal.contains(action))
        .collect();
    let best = values
        .iter()
        .copied()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
        .map(|(action, _)| action);

    let mut grid: [String; BOARD_CELLS] = std::array::from_fn(|_| String::from("   . "));
    let mut pass = None;
    for &(action, value) in &values {
        let mark = if Some(action) == best { '*' } else { ' ' };
        let cell = format!("{:>4.0}{mark}", value * 100.0);
        if action == PASS {
            pass = Some(cell);
        } else {
            grid[action] = cell;
        }
    }

    let mut out = String::new();
    for row in grid.chunks(3) {
        out.push_str(&format!("  {}\n", row.join(" ")));
    }
    if let Some(pass) = pass {
        out.push_str(&format!("  pass: {pass}\n"));
    }
    Ok(out)
}

#[derive(Debug, Default)]
struct Tally {
    win: usize,
    lose: usize,
    draw: usize,
    resign: usize,
}

enum Ending {
    Won,
    Lost,
    Drawn,
    Resigned,
}

fn play_game(
    env: &mut TicTacToeEnv,
    agent: &mut AfterstateAgent,
    human_first: bool,
) -> Result<Ending> {
    env.reset();
    let mut mover = Player::X;
    let mut human_moves = human_first;

    loop {
        let state = env.state();
        let valid = env.valid_actions();

        let action = if human_moves {
            println!("\n{}", render(&state, mover));
            match prompt_move(env.variant(), &valid)? {
                Command::Resign => return Ok(Ending::Resigned),
                Command::Hint => {
                    print!("{}", hint(agent, &state)?);
                    continue;
                }
                Command::Pass => PASS,
                Command::Place(action) => action,
            }
        } else {
            let action = agent.select_action(state.code(), &valid)?;
            println!("\nAgent plays {}", action_label(action));
            action
        };

        let (_, afterstate) = env.step(action)?;
        match afterstate.judgment() {
            Judgment::Draw => {
                println!("\n{}", render(&afterstate, mover));
                return Ok(Ending::Drawn);
            }
            Judgment::Win(winner) => {
                println!("\n{}", render(&afterstate, mover));
                let mover_won = winner == Player::X;
                return Ok(if mover_won == human_moves {
                    Ending::Won
                } else {
                    Ending::Lost
                });
            }
            Judgment::Impossible => {
                return Err(anyhow!(
                    "game reached an impossible board: {}",
                    afterstate.label()
                ));
            }
            Judgment::InProgress => {}
        }

        env.set_state(afterstate.reverse());
        mover = mover.opponent();
        human_moves = !human_moves;
    }
}

/// Ask until the input is a hint, a resignation or a legal move
fn prompt_move(variant: Variant, valid: &[Action]) -> Result<Command> {
    let prompt = if variant.allows_pass() && valid.contains(&PASS) {
        "Your move (x y, p = pass, h = hint, r = resign)"
    } else {
        "Your move (x y, h = hint, r = resign)"
    };

    let valid = valid.to_vec();
    let input: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            match parse_command(input, variant)? {
                Command::Place(action) if !valid.contains(&action) => {
                    Err("that cell is not free".to_string())
                }
                Command::Pass if !valid.contains(&PASS) => {
                    Err("no two passes in a row".to_string())
                }
                _ => Ok(()),
            }
        })
        .interact_text()?;

    parse_command(&input, variant).map_err(anyhow::Error::msg)
}

/// Execute the play command
pub fn execute(args: PlayArgs) -> Result<()> {
    let mut app = App::new();
    if let Some(dir) = &args.table_cache {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating table cache {}", dir.display()))?;
        app = app.with_table_cache(dir);
    }
    let config = AgentConfig::new(args.variant).with_explore(false);
    let mut agent = app
        .load_agent(&config, &args.values)
        .with_context(|| format!("loading values from {}", args.values.display()))?;
    let mut env = TicTacToeEnv::new(args.variant);
    let mut tally = Tally::default();

    print_section("Play");
    print_kv("Variant", &args.variant.to_string());
    print_kv("Values", &args.values.display().to_string());
    println!("\nYou are always shown as the side that moved first (X) or second (O).");

    let choices = ["Move first", "Move second", "Quit"];
    loop {
        let choice = Select::new()
            .with_prompt("New game")
            .items(&choices)
            .default(0)
            .interact()?;
        if choice == 2 {
            break;
        }

        match play_game(&mut env, &mut agent, choice == 0)? {
            Ending::Won => {
                println!("You win.");
                tally.win += 1;
            }
            Ending::Lost => {
                println!("You lose.");
                tally.lose += 1;
            }
            Ending::Drawn => {
                println!("Draw.");
                tally.draw += 1;
            }
            Ending::Resigned => {
                println!("You resigned.");
                tally.resign += 1;
            }
        }
        println!(
            "win: {}  lose: {}  draw: {}  resign: {}",
            tally.win, tally.lose, tally.draw, tally.resign
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::afterstates::AfterstateTable;

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("2 1", Variant::Standard),
            Ok(Command::Place(5))
        );
        assert_eq!(parse_command(" h ", Variant::Standard), Ok(Command::Hint));
        assert_eq!(parse_command("R", Variant::Standard), Ok(Command::Resign));
        assert_eq!(parse_command("p", Variant::Capture), Ok(Command::Pass));
        assert!(parse_command("p", Variant::Standard).is_err());
        assert!(parse_command("3 0", Variant::Standard).is_err());
        assert!(parse_command("1", Variant::Standard).is_err());
    }

    #[test]
    fn test_render_keeps_absolute_orientation() {
        // O to move sees its own markers as X
        let state = BoardState::from_string(Variant::Standard, "OX.......").unwrap();
        let from_o = render(&state, Player::O);
        assert_eq!(from_o, render(&state.reverse(), Player::X));
        assert!(from_o.contains("  0 X O ."));
    }

    #[test]
    fn test_hint_marks_best_move() {
        let table = Arc::new(AfterstateTable::build(Variant::Standard).unwrap());
        let mut agent = AfterstateAgent::with_defaults(table);
        let state = BoardState::from_string(Variant::Standard, "XX.OO....").unwrap();
        // Completing the top row earns the terminal reward
        agent
            .update(state.code(), 2, 1.0, state.apply(2).unwrap().code(), &[])
            .unwrap();

        let text = hint(&agent, &state).unwrap();
        assert!(text.contains("10*"));
        assert_eq!(text.matches('*').count(), 1);

        // Filled and empty cells share one width, so every row lines up
        let widths: Vec<usize> = text.lines().map(str::len).collect();
        assert_eq!(widths, vec![widths[0]; 3]);
    }

    #[test]
    fn test_execute_creates_missing_table_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = dir.path().join("tables");
        let args = PlayArgs::parse_from([
            "play",
            dir.path().join("missing.values").to_str().unwrap(),
            "--table-cache",
            cache.to_str().unwrap(),
        ]);

        // The value file is missing, but the cache directory is already in place
        assert!(execute(args).is_err());
        assert!(cache.is_dir());
    }
}
