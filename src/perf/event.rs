use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::parse::{parse_field, parse_time};
use crate::config::EventsConfig;

/// Whether an event is measured by a clock or by a tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Time,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

impl EventKind {
    pub fn direction(self) -> Direction {
        match self {
            EventKind::Time => Direction::LowerIsBetter,
            EventKind::Field => Direction::HigherIsBetter,
        }
    }

    /// Parse a result string the way this kind of event reads it.
    pub fn parse(self, result: &str) -> Performance {
        let value = match self {
            EventKind::Time => parse_time(result),
            EventKind::Field => parse_field(result),
        };
        Performance {
            value,
            direction: self.direction(),
        }
    }
}

/// Classify an event by its label alone: any label containing a lowercase
/// "m" or "Mile" is timed, everything else is a field event.
///
/// "Long Jump" is timed and "Marathon" is a field event under this rule.
pub fn legacy_event_kind(event: &str) -> EventKind {
    if event.contains('m') || event.contains("Mile") {
        EventKind::Time
    } else {
        EventKind::Field
    }
}

/// A parsed result with the direction that counts as better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Performance {
    pub value: f64,
    pub direction: Direction,
}

impl Performance {
    /// False for sentinel values produced by unparseable strings.
    pub fn is_valid(&self) -> bool {
        self.value.is_finite()
    }

    /// Order better performances first. Invalid values always sort last.
    pub fn compare(&self, other: &Performance) -> Ordering {
        match (self.is_valid(), other.is_valid()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => Ordering::Equal,
            (true, true) => match self.direction {
                Direction::LowerIsBetter => self.value.total_cmp(&other.value),
                Direction::HigherIsBetter => other.value.total_cmp(&self.value),
            },
        }
    }

    pub fn is_better_than(&self, other: &Performance) -> bool {
        self.compare(other) == Ordering::Less
    }
}

/// Explicit event classification.
///
/// Exact names are checked first, then glob patterns in config order.
/// Events the catalog does not know fall back to [`legacy_event_kind`].
#[derive(Debug, Clone)]
pub struct EventCatalog {
    exact: HashMap<String, EventKind>,
    patterns: Vec<(Pattern, EventKind)>,
}

impl EventCatalog {
    pub fn from_config(config: &EventsConfig) -> Result<Self> {
        let mut exact = HashMap::new();
        let mut patterns = Vec::new();

        let lists = [
            (&config.time, EventKind::Time),
            (&config.field, EventKind::Field),
        ];
        for (entries, kind) in lists {
            for entry in entries {
                if is_glob(entry) {
                    let pattern = Pattern::new(entry)
                        .with_context(|| format!("Invalid event pattern '{}'", entry))?;
                    patterns.push((pattern, kind));
                } else {
                    exact.insert(entry.clone(), kind);
                }
            }
        }

        Ok(Self { exact, patterns })
    }

    /// Catalog with no entries; every event uses the legacy label rule.
    pub fn legacy() -> Self {
        Self {
            exact: HashMap::new(),
            patterns: Vec::new(),
        }
    }

    pub fn kind(&self, event: &str) -> EventKind {
        if let Some(kind) = self.exact.get(event) {
            return *kind;
        }
        if let Some((_, kind)) = self.patterns.iter().find(|(p, _)| p.matches(event)) {
            return *kind;
        }
        let kind = legacy_event_kind(event);
        tracing::debug!(event, ?kind, "event not in catalog, classified by label");
        kind
    }

    pub fn parse(&self, event: &str, result: &str) -> Performance {
        self.kind(event).parse(result)
    }
}

impl Default for EventCatalog {
    fn default() -> Self {
        // Default config only holds valid patterns
        Self::from_config(&EventsConfig::default()).unwrap_or_else(|_| Self::legacy())
    }
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_kind_matches_label_rule() {
        assert_eq!(legacy_event_kind("100m"), EventKind::Time);
        assert_eq!(legacy_event_kind("Mile"), EventKind::Time);
        assert_eq!(legacy_event_kind("400m RS"), EventKind::Time);
        assert_eq!(legacy_event_kind("Shot Put"), EventKind::Field);
        assert_eq!(legacy_event_kind("Javelin"), EventKind::Field);
    }

    #[test]
    fn test_legacy_kind_known_misclassifications() {
        assert_eq!(legacy_event_kind("Long Jump"), EventKind::Time);
        assert_eq!(legacy_event_kind("Hammer"), EventKind::Time);
        assert_eq!(legacy_event_kind("Marathon"), EventKind::Field);
        assert_eq!(legacy_event_kind("5K XC"), EventKind::Field);
    }

    #[test]
    fn test_default_catalog_fixes_misclassifications() {
        let catalog = EventCatalog::default();
        assert_eq!(catalog.kind("Long Jump"), EventKind::Field);
        assert_eq!(catalog.kind("Triple Jump"), EventKind::Field);
        assert_eq!(catalog.kind("Marathon"), EventKind::Time);
        assert_eq!(catalog.kind("5K XC"), EventKind::Time);
    }

    #[test]
    fn test_catalog_falls_back_to_label_rule() {
        let catalog = EventCatalog::default();
        assert_eq!(catalog.kind("150m"), EventKind::Time);
        assert_eq!(catalog.kind("Weight Throw"), EventKind::Field);
    }

    #[test]
    fn test_catalog_patterns() {
        let config = EventsConfig {
            time: vec!["* RS".to_string()],
            field: vec!["*Throw".to_string()],
            order: vec![],
            team: vec![],
        };
        let catalog = EventCatalog::from_config(&config).unwrap();
        assert_eq!(catalog.kind("600yd RS"), EventKind::Time);
        assert_eq!(catalog.kind("Hammer Throw"), EventKind::Field);
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let config = EventsConfig {
            time: vec!["[100m".to_string()],
            field: vec![],
            order: vec![],
            team: vec![],
        };
        assert!(EventCatalog::from_config(&config).is_err());
    }

    #[test]
    fn test_performance_compare_time() {
        let fast = EventKind::Time.parse("10.9");
        let slow = EventKind::Time.parse("11.2");
        let bad = EventKind::Time.parse("DQ");
        assert!(fast.is_better_than(&slow));
        assert!(slow.is_better_than(&bad));
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_performance_compare_field() {
        let far = EventKind::Field.parse("18'2\"");
        let near = EventKind::Field.parse("17'6\"");
        let bad = EventKind::Field.parse("FOUL");
        assert!(far.is_better_than(&near));
        assert!(near.is_better_than(&bad));
        assert_eq!(bad.compare(&bad), Ordering::Equal);
    }
}
