use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::leaderboard::{Leaderboard, LeaderboardMode, PersonalBest};
use crate::ranking::{RankMovement, Rankings};
use crate::results::ResultRow;
use crate::store::{EventSummary, TeamSummary};
use crate::tracker::{AthleteProfile, MeetReport, NormalizedResult, TeamProfile};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Fit a trailing column into whatever the terminal leaves after `used` chars.
fn fit(text: &str, used: usize, term_width: Option<usize>) -> String {
    match term_width {
        Some(width) if width > used + 10 => truncate_text(text, width - used),
        Some(_) => truncate_text(text, 20),
        None => text.to_string(),
    }
}

fn bold(text: &str, use_colors: bool) -> String {
    if use_colors {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn dim(text: &str, use_colors: bool) -> String {
    if use_colors {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

fn accent(text: &str, use_colors: bool) -> String {
    if use_colors {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

/// Format points without a trailing ".0" ("9", "4.5", "3.33")
pub fn format_points(points: f64) -> String {
    let formatted = format!("{:.2}", points);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn format_place(place: Option<u32>) -> String {
    place.map_or_else(|| "-".to_string(), |p| format!("{}.", p))
}

/// "5 -> 2", "- -> 1" for a first ranking, "3" when unchanged
pub fn format_movement(movement: &RankMovement) -> String {
    let show = |r: Option<u32>| r.map_or_else(|| "-".to_string(), |r| r.to_string());
    if movement.before == movement.after {
        show(movement.after)
    } else {
        format!("{} -> {}", show(movement.before), show(movement.after))
    }
}

/// One result per line: date, event, result, athlete, team, meet
pub fn format_results(rows: &[ResultRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No results found.".to_string();
    }

    let term_width = get_terminal_width();
    let event_width = rows.iter().map(|r| r.event.chars().count()).max().unwrap_or(0);
    let result_width = rows.iter().map(|r| r.result.chars().count()).max().unwrap_or(0);

    rows.iter()
        .map(|row| {
            let id = format!("#{:<5}", row.id);
            let event = format!("{:<width$}", row.event, width = event_width);
            let result = format!("{:>width$}", row.result, width = result_width);
            let used = id.len() + 12 + event_width + result_width + 6;
            let rest = fit(
                &format!("{} ({}) @ {}", row.athlete, row.team, row.meet),
                used,
                term_width,
            );
            format!(
                "{} {}  {}  {}  {}",
                dim(&id, use_colors),
                row.date,
                event,
                bold(&result, use_colors),
                rest
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_meet_report(report: &MeetReport, use_colors: bool) -> String {
    let mut out = vec![bold(&report.meet, use_colors)];

    if !report.scoring.team_scores.is_empty() {
        out.push(String::new());
        out.push(accent("Team scores", use_colors));
        for (i, score) in report.scoring.team_scores.iter().enumerate() {
            let points = format!("{:>7}", format_points(score.points));
            out.push(format!("{:>3}. {}  {}", i + 1, bold(&points, use_colors), score.team));
        }
    }

    let term_width = get_terminal_width();
    for event in &report.scoring.events {
        out.push(String::new());
        let title = if event.scored {
            format!("{} ({})", event.event, event.date)
        } else {
            format!("{} ({}, splits)", event.event, event.date)
        };
        out.push(accent(&title, use_colors));

        for placing in &event.placings {
            let place = format!("{:>4}", format_place(placing.place));
            let result = format!("{:>9}", placing.result);
            let points = if event.scored && placing.points > 0.0 {
                format!("{:>5}", format_points(placing.points))
            } else {
                " ".repeat(5)
            };
            let who = fit(&format!("{} ({})", placing.athlete, placing.team), 24, term_width);
            out.push(format!(
                "{} {} {}  {}",
                place,
                bold(&result, use_colors),
                dim(&points, use_colors),
                who
            ));
        }
    }

    let moved: Vec<_> = report
        .rankings
        .iter()
        .filter(|r| r.movement.after.is_some())
        .collect();
    if !moved.is_empty() {
        out.push(String::new());
        out.push(accent("Rankings", use_colors));
        for ranking in moved {
            let change = format_movement(&ranking.movement);
            let change = if use_colors && ranking.movement.improved() {
                change.green().to_string()
            } else {
                change
            };
            out.push(format!("  {}  {}: {}", ranking.athlete, ranking.event, change));
        }
    }

    out.join("\n")
}

pub fn format_rankings(rankings: &Rankings, use_colors: bool) -> String {
    let when = if rankings.include_current {
        "after"
    } else {
        "before"
    };
    let title = format!("{} rankings {} {}", rankings.event, when, rankings.as_of);
    if rankings.entries.is_empty() {
        return format!("{}\nNo ranked athletes.", bold(&title, use_colors));
    }

    let term_width = get_terminal_width();
    let mut out = vec![bold(&title, use_colors)];
    for entry in &rankings.entries {
        let result = format!("{:>9}", entry.result);
        let who = fit(
            &format!("{} ({}) {} {}", entry.athlete, entry.team, entry.date, entry.meet),
            16,
            term_width,
        );
        out.push(format!("{:>4}. {}  {}", entry.rank, bold(&result, use_colors), who));
    }
    out.join("\n")
}

pub fn format_leaderboard(board: &Leaderboard, use_colors: bool) -> String {
    let mode = match board.mode {
        LeaderboardMode::Best => "best marks",
        LeaderboardMode::All => "all marks",
    };
    let title = format!("{} {}", board.event, mode);
    if board.entries.is_empty() {
        return format!("{}\nNo results found.", bold(&title, use_colors));
    }

    let term_width = get_terminal_width();
    let mut out = vec![bold(&title, use_colors)];
    for entry in &board.entries {
        let result = format!("{:>9}", entry.result);
        let who = fit(
            &format!("{} ({}) {} {}", entry.athlete, entry.team, entry.date, entry.meet),
            16,
            term_width,
        );
        out.push(format!("{:>4}. {}  {}", entry.position, bold(&result, use_colors), who));
    }
    out.push(dim(
        &format!("Page {} of {} ({} total)", board.page, board.total_pages, board.total),
        use_colors,
    ));
    out.join("\n")
}

fn format_bests(title: &str, bests: &[PersonalBest], use_colors: bool) -> Vec<String> {
    if bests.is_empty() {
        return Vec::new();
    }
    let width = bests.iter().map(|b| b.event.chars().count()).max().unwrap_or(0);
    let mut out = vec![String::new(), accent(title, use_colors)];
    for best in bests {
        out.push(format!(
            "  {:<width$}  {}  {}",
            best.event,
            bold(&format!("{:>9}", best.result), use_colors),
            dim(&format!("{} {}", best.date, best.meet), use_colors),
            width = width
        ));
    }
    out
}

pub fn format_athlete_profile(profile: &AthleteProfile, use_colors: bool) -> String {
    let mut out = vec![format!(
        "{}  {}",
        bold(&profile.athlete, use_colors),
        profile.team.as_deref().unwrap_or("Unknown")
    )];

    out.extend(format_bests("Personal bests", &profile.personal_bests, use_colors));
    out.extend(format_bests("Last 12 months", &profile.annual_bests, use_colors));

    if !profile.relays.is_empty() {
        out.push(String::new());
        out.push(accent("Relays", use_colors));
        for relay in &profile.relays {
            out.push(format!(
                "  {}  {}  {} @ {}",
                relay.event,
                bold(&relay.result, use_colors),
                relay.athletes().join(", "),
                relay.meet
            ));
        }
    }

    out.push(String::new());
    out.push(accent("Results", use_colors));
    out.push(format_results(&profile.results, use_colors));
    out.join("\n")
}

pub fn format_team_profile(profile: &TeamProfile, use_colors: bool) -> String {
    let mut out = vec![format!(
        "{}  {} athletes, {} results",
        bold(&profile.team, use_colors),
        profile.athletes.len(),
        profile.results.len()
    )];

    let name_width = profile
        .athletes
        .iter()
        .map(|a| a.chars().count())
        .max()
        .unwrap_or(0);

    let columns: Vec<&String> = profile
        .events
        .iter()
        .filter(|e| profile.bests.values().any(|b| b.contains_key(*e)))
        .collect();

    if !columns.is_empty() {
        out.push(String::new());
        let mut header = format!("{:<width$}", "", width = name_width);
        for event in &columns {
            header.push_str(&format!("  {:>9}", event));
        }
        out.push(accent(&header, use_colors));

        for (athlete, bests) in &profile.bests {
            let mut line = format!("{:<width$}", athlete, width = name_width);
            for event in &columns {
                let mark = bests.get(*event).map(String::as_str).unwrap_or("-");
                line.push_str(&format!("  {:>9}", mark));
            }
            out.push(line);
        }
    }

    out.push(String::new());
    out.push(accent("Results", use_colors));
    out.push(format_results(&profile.results, use_colors));
    out.join("\n")
}

pub fn format_event_summaries(events: &[EventSummary], use_colors: bool) -> String {
    if events.is_empty() {
        return "No events recorded.".to_string();
    }
    let width = events.iter().map(|e| e.event.chars().count()).max().unwrap_or(0);
    events
        .iter()
        .map(|e| {
            format!(
                "{}  {:>4} athletes  {:>5} results",
                bold(&format!("{:<width$}", e.event, width = width), use_colors),
                e.athletes,
                e.results
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_team_summaries(teams: &[TeamSummary], use_colors: bool) -> String {
    if teams.is_empty() {
        return "No teams recorded.".to_string();
    }
    let width = teams.iter().map(|t| t.team.chars().count()).max().unwrap_or(0);
    teams
        .iter()
        .map(|t| {
            format!(
                "{}  {:>4} athletes  {:>5} results",
                bold(&format!("{:<width$}", t.team, width = width), use_colors),
                t.athletes,
                t.results
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_normalized(changes: &[NormalizedResult], dry_run: bool, use_colors: bool) -> String {
    if changes.is_empty() {
        return "All results already normalized.".to_string();
    }
    let verb = if dry_run { "Would rewrite" } else { "Rewrote" };
    let mut out = vec![format!("{} {} results", verb, changes.len())];
    for change in changes {
        out.push(format!(
            "  {} {} -> {}  {}",
            dim(&format!("#{}", change.id), use_colors),
            change.from,
            bold(&change.to, use_colors),
            change.meet
        ));
    }
    out.join("\n")
}
