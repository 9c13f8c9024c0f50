pub mod comparator;
pub mod event;
pub mod parse;

pub use comparator::{select_comparator, Comparator};
pub use event::{legacy_event_kind, Direction, EventCatalog, EventKind, Performance};
pub use parse::{
    all_results_are_field_format, format_time, looks_like_field_result, normalize_leading_zero,
    normalize_quotes, parse_field, parse_time, strip_result_suffix, FIELD_SENTINEL, TIME_SENTINEL,
};
