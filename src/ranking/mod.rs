pub mod engine;
pub mod window;

pub use engine::{
    meet_rankings, rank_athlete, rank_for_date, rank_movement, AthleteRanking, RankEntry,
    RankMovement, Rankings,
};
pub use window::{RankingConfig, RankingWindow};
