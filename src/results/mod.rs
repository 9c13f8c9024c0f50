pub mod types;

pub use types::{NewResult, ResultEvent, ResultFilter, ResultPatch, ResultRow};
