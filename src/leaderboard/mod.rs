pub mod bests;
pub mod board;

pub use bests::{annual_bests, personal_bests, team_bests, PersonalBest, TeamBests};
pub use board::{
    leaderboard, Leaderboard, LeaderboardEntry, LeaderboardMode, LeaderboardQuery, DEFAULT_PER_PAGE,
};
