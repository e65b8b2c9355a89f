//! Output formatting and progress bars for CLI

use indicatif::{ProgressBar, ProgressStyle};

use crate::{Error, Result, pipeline::HeadToHead};

/// Create a progress bar counting evaluation games
pub fn create_progress(total: u64, unit: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} {unit} ({{msg}})"
        ))
        .map_err(|e| Error::ProgressBarTemplate {
            message: e.to_string(),
        })?
        .progress_chars("=>-");
    pb.set_style(style);
    Ok(pb)
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Format `count` as a share of `total`
pub fn format_rate(count: usize, total: usize) -> String {
    if total == 0 {
        return format!("{count}");
    }
    format!("{count} ({:.1}%)", 100.0 * count as f64 / total as f64)
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Print win/lose/draw counts split by seat
pub fn print_head_to_head(tally: &HeadToHead) {
    let first = tally.first_move_win + tally.first_move_lose + tally.first_move_draw;
    let second = tally.second_move_win + tally.second_move_lose + tally.second_move_draw;

    println!("  {:12} {:>14} {:>14} {:>14}", "", "win", "lose", "draw");
    println!(
        "  {:12} {:>14} {:>14} {:>14}",
        "first move",
        format_rate(tally.first_move_win, first),
        format_rate(tally.first_move_lose, first),
        format_rate(tally.first_move_draw, first)
    );
    println!(
        "  {:12} {:>14} {:>14} {:>14}",
        "second move",
        format_rate(tally.second_move_win, second),
        format_rate(tally.second_move_lose, second),
        format_rate(tally.second_move_draw, second)
    );
}
