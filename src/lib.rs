pub mod cache;
pub mod config;
pub mod leaderboard;
pub mod output;
pub mod perf;
pub mod ranking;
pub mod relay;
pub mod results;
pub mod scoring;
pub mod store;
pub mod tracker;
