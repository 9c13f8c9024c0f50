pub mod backend;
pub mod derived;

pub use backend::{CacheBackend, DiskBackend, MemoryBackend};
pub use derived::{cache_scope, DerivedCache, ResultListener, ATHLETE_RANKINGS, TEAM_SCORES};
