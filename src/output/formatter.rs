use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::fetch::LoadFailure;
use crate::history::{Category, History};
use crate::scoring::{EventResult, ScoreReport};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with up to two decimals, trimming trailing zeros
/// (7.85, 52.33, 100, 0.5)
pub fn format_score(score: f64) -> String {
    let formatted = format!("{:.2}", score);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Format a rank as an ordinal ("1st", "22nd"). Rank 0 means no history.
pub fn format_rank(rank: usize) -> String {
    if rank == 0 {
        return "n/a".to_string();
    }
    let suffix = match (rank % 10, rank % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", rank, suffix)
}

fn event_lines(name: &str, event: &EventResult, use_colors: bool) -> Vec<String> {
    let heading = if use_colors {
        name.bold().to_string()
    } else {
        name.to_string()
    };
    vec![
        heading,
        format!("  Team Raw Score: {}", format_score(event.raw)),
        format!("  Team Score:     {} / 100", format_score(event.normalized)),
    ]
}

/// Format a full report: the three events, then the overall composite
pub fn format_report(report: &ScoreReport, use_colors: bool) -> String {
    let mut lines = Vec::new();

    lines.extend(event_lines("Individual", &report.individual, use_colors));
    for (i, c) in report.contestants.iter().enumerate() {
        let rank = format_rank(c.rank);
        let rank = if use_colors {
            rank.cyan().to_string()
        } else {
            rank
        };
        lines.push(format!(
            "  Contestant {}: {} ({} + {} estimathon), rank {}",
            i + 1,
            format_score(c.adjusted),
            format_score(c.adjusted - c.estimathon),
            format_score(c.estimathon),
            rank
        ));
    }
    lines.push(String::new());

    lines.extend(event_lines("Guts", &report.guts, use_colors));
    lines.push(String::new());

    lines.extend(event_lines("Relay", &report.relay, use_colors));
    lines.push(String::new());

    let overall = format!("Team Overall: {} / 300", format_score(report.overall));
    let rank = format!("Team Rank: {}", format_rank(report.overall_rank));
    if use_colors {
        lines.push(overall.bold().to_string());
        lines.push(rank.bold().green().to_string());
    } else {
        lines.push(overall);
        lines.push(rank);
    }

    lines.join("\n")
}

/// Format a report as pretty JSON for scripting
pub fn format_report_json(report: &ScoreReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// One line per category: count and best historical score
pub fn format_history(history: &History, use_colors: bool) -> String {
    Category::ALL
        .iter()
        .map(|category| {
            let list = history.get(*category);
            let label = format!("{:<16}", category.label());
            let label = if use_colors {
                label.bold().to_string()
            } else {
                label
            };
            let top = list
                .top()
                .map(format_score)
                .unwrap_or_else(|| "-".to_string());
            format!("{} {:>3} scores, top {}", label, list.len(), top)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Banner lines for categories that failed to load
pub fn format_failures(failures: &[LoadFailure], use_colors: bool) -> String {
    failures
        .iter()
        .map(|f| {
            let line = format!("Warning: could not load {}", f);
            if use_colors {
                line.yellow().to_string()
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
