pub mod formatter;

pub use formatter::{
    format_athlete_profile, format_event_summaries, format_leaderboard, format_meet_report,
    format_movement, format_normalized, format_points, format_rankings, format_results,
    format_team_profile, format_team_summaries, should_use_colors,
};
