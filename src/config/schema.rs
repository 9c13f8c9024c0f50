use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ranking::RankingConfig;
use crate::scoring::ScoringConfig;

/// Top-level configuration file.
///
/// Example YAML:
/// ```yaml
/// database: /srv/track/track.db
/// ranking:
///   window: "365 days"
/// scoring:
///   points: [10, 8, 6, 5, 4, 3, 2, 1]
/// relay:
///   leg_events: ["400m RS"]
/// events:
///   time: ["100m", "Mile", "* RS"]
///   field: ["Long Jump", "Shot Put"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the SQLite results file (default: ~/.config/wavelight/track.db)
    #[serde(default)]
    pub database: Option<PathBuf>,

    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

/// Relay split handling.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Events whose rows are individual legs of a relay
    #[serde(default = "default_leg_events")]
    pub leg_events: Vec<String>,

    /// Suffix that marks a leg event ("400m RS")
    #[serde(default = "default_split_marker")]
    pub split_marker: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            leg_events: default_leg_events(),
            split_marker: default_split_marker(),
        }
    }
}

impl RelayConfig {
    pub fn is_leg_event(&self, event: &str) -> bool {
        self.leg_events.iter().any(|e| e == event)
    }
}

fn default_leg_events() -> Vec<String> {
    ["200m RS", "400m RS", "800m RS"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_split_marker() -> String {
    " RS".to_string()
}

/// Explicit event classification and display order.
///
/// `time` and `field` entries are exact event names or glob patterns
/// ("* RS", "*Throw").
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    #[serde(default)]
    pub time: Vec<String>,

    #[serde(default)]
    pub field: Vec<String>,

    /// Preferred order for personal-best listings
    #[serde(default)]
    pub order: Vec<String>,

    /// Events shown in the team best-marks table
    #[serde(default)]
    pub team: Vec<String>,
}

const DEFAULT_TIME_EVENTS: &[&str] = &[
    "60m", "100m", "100mH", "110mH", "200m", "300m", "400m", "400mH", "500m", "600yd", "600m",
    "800m", "1000m", "1500m", "Mile", "3000m", "3200m", "5000m", "5K XC", "5K Road", "10000m",
    "Half Marathon", "Marathon", "4x400m", "* RS", "4x* Relay",
];

const DEFAULT_FIELD_EVENTS: &[&str] = &[
    "High Jump", "Long Jump", "Triple Jump", "Shot Put", "Discus", "Pole Vault", "Javelin",
    "Hammer",
];

const DEFAULT_EVENT_ORDER: &[&str] = &[
    "60m", "100m", "100mH", "110mH", "200m", "300m", "400m", "400m RS", "400mH", "500m",
    "600yd", "600m", "800m", "1000m", "1500m", "Mile", "3000m", "3200m", "5000m", "5K XC",
    "5K Road", "10000m", "Half Marathon", "Marathon", "High Jump", "Long Jump", "Triple Jump",
    "Shot Put", "Discus", "Pole Vault", "Javelin", "4x400m",
];

const DEFAULT_TEAM_EVENTS: &[&str] = &[
    "100m", "200m", "400m", "800m", "1500m", "Mile", "3000m", "5000m", "10000m",
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            time: to_strings(DEFAULT_TIME_EVENTS),
            field: to_strings(DEFAULT_FIELD_EVENTS),
            order: to_strings(DEFAULT_EVENT_ORDER),
            team: to_strings(DEFAULT_TEAM_EVENTS),
        }
    }
}
