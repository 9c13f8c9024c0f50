pub mod config;
pub mod engine;
pub mod places;

pub use config::{PointTable, ScoringConfig};
pub use engine::{score_meet, team_totals, EventPlacings, MeetScoring, Placing, TeamScore};
pub use places::{assign_places, award_points};
