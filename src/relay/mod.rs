pub mod aggregator;

pub use aggregator::{
    athlete_relays, calculate_relay, group_splits, relay_event_name, relays_for, RelayLeg,
    RelayResult, Split, SplitGroup, RELAY_LEGS,
};
