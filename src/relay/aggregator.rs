use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::RelayConfig;
use crate::perf::{format_time, parse_time};
use crate::results::ResultRow;

/// Number of legs that make up a relay.
pub const RELAY_LEGS: usize = 4;

/// One leg's individual time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub athlete: String,
    pub result: String,
    pub date: NaiveDate,
    pub meet: String,
    pub team: String,
}

impl From<&ResultRow> for Split {
    fn from(row: &ResultRow) -> Self {
        Self {
            athlete: row.athlete.clone(),
            result: row.result.clone(),
            date: row.date,
            meet: row.meet.clone(),
            team: row.team.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayLeg {
    pub athlete: String,
    pub split: String,
}

/// A relay time synthesized from the fastest legs of one team at one meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResult {
    pub date: NaiveDate,
    pub meet: String,
    pub team: String,
    pub event: String,     // "4x400m Relay"
    pub leg_event: String, // "400m RS"
    pub result: String,    // "3:19.60"
    pub total_seconds: f64,
    pub legs: Vec<RelayLeg>,
}

impl RelayResult {
    pub fn athletes(&self) -> Vec<&str> {
        self.legs.iter().map(|l| l.athlete.as_str()).collect()
    }

    pub fn includes(&self, athlete: &str) -> bool {
        self.legs.iter().any(|l| l.athlete == athlete)
    }
}

/// Splits sharing event, team, date and meet.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitGroup {
    pub leg_event: String,
    pub date: NaiveDate,
    pub meet: String,
    pub team: String,
    pub splits: Vec<Split>,
}

/// "400m RS" -> "4x400m Relay"
pub fn relay_event_name(leg_event: &str, marker: &str) -> String {
    format!("{}x{} Relay", RELAY_LEGS, leg_event.replace(marker, ""))
}

/// Build a relay from one group of splits.
///
/// Needs at least four splits. The four fastest are summed; the relay's
/// date, meet and team come from the fastest leg. A group whose four
/// fastest legs include an unreadable time produces no relay.
pub fn calculate_relay(splits: &[Split], leg_event: &str, marker: &str) -> Option<RelayResult> {
    if splits.len() < RELAY_LEGS {
        return None;
    }

    let mut timed: Vec<(f64, &Split)> = splits.iter().map(|s| (parse_time(&s.result), s)).collect();
    timed.sort_by(|a, b| a.0.total_cmp(&b.0));
    let best = &timed[..RELAY_LEGS];

    if best.iter().any(|(t, _)| !t.is_finite()) {
        tracing::debug!(leg_event, "relay group has unreadable splits, skipping");
        return None;
    }

    let total: f64 = best.iter().map(|(t, _)| t).sum();
    let first = best[0].1;

    Some(RelayResult {
        date: first.date,
        meet: first.meet.clone(),
        team: first.team.clone(),
        event: relay_event_name(leg_event, marker),
        leg_event: leg_event.to_string(),
        result: format_time(total),
        total_seconds: total,
        legs: best
            .iter()
            .map(|(_, s)| RelayLeg {
                athlete: s.athlete.clone(),
                split: s.result.clone(),
            })
            .collect(),
    })
}

/// Group leg rows by (event, date, meet, team). Rows of other events are ignored.
pub fn group_splits(rows: &[ResultRow], relay: &RelayConfig) -> Vec<SplitGroup> {
    let mut groups: BTreeMap<(&str, NaiveDate, &str, &str), Vec<Split>> = BTreeMap::new();
    for row in rows.iter().filter(|r| relay.is_leg_event(&r.event)) {
        groups
            .entry((row.event.as_str(), row.date, row.meet.as_str(), row.team.as_str()))
            .or_default()
            .push(Split::from(row));
    }

    groups
        .into_iter()
        .map(|((event, date, meet, team), splits)| SplitGroup {
            leg_event: event.to_string(),
            date,
            meet: meet.to_string(),
            team: team.to_string(),
            splits,
        })
        .collect()
}

/// Every relay that can be built from `rows`.
pub fn relays_for(rows: &[ResultRow], relay: &RelayConfig) -> Vec<RelayResult> {
    group_splits(rows, relay)
        .iter()
        .filter_map(|g| calculate_relay(&g.splits, &g.leg_event, &relay.split_marker))
        .collect()
}

/// Relays from every group the athlete ran a leg in, whether or not their
/// split made the fastest four.
pub fn athlete_relays(rows: &[ResultRow], athlete: &str, relay: &RelayConfig) -> Vec<RelayResult> {
    group_splits(rows, relay)
        .iter()
        .filter(|g| g.splits.iter().any(|s| s.athlete == athlete))
        .filter_map(|g| calculate_relay(&g.splits, &g.leg_event, &relay.split_marker))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(athlete: &str, result: &str) -> Split {
        Split {
            athlete: athlete.to_string(),
            result: result.to_string(),
            date: "2024-04-13".parse().unwrap(),
            meet: "Spring Open".to_string(),
            team: "Harriers".to_string(),
        }
    }

    fn leg_row(id: i64, athlete: &str, result: &str, team: &str) -> ResultRow {
        ResultRow {
            id,
            date: "2024-04-13".parse().unwrap(),
            athlete: athlete.to_string(),
            meet: "Spring Open".to_string(),
            event: "400m RS".to_string(),
            result: result.to_string(),
            team: team.to_string(),
        }
    }

    #[test]
    fn test_four_fastest_of_five() {
        let splits = vec![
            split("A", "50.0"),
            split("B", "49.5"),
            split("C", "51.2"),
            split("D", "48.9"),
            split("E", "52.0"),
        ];
        let relay = calculate_relay(&splits, "400m RS", " RS").unwrap();
        assert!((relay.total_seconds - 199.6).abs() < 1e-9);
        assert_eq!(relay.result, "3:19.60");
        assert_eq!(relay.athletes(), vec!["D", "B", "A", "C"]);
        assert!(!relay.includes("E"));
        assert_eq!(relay.legs[0].split, "48.9");
        assert_eq!(relay.event, "4x400m Relay");
    }

    #[test]
    fn test_three_legs_is_no_relay() {
        let splits = vec![split("A", "50.0"), split("B", "49.5"), split("C", "51.2")];
        assert!(calculate_relay(&splits, "400m RS", " RS").is_none());
    }

    #[test]
    fn test_colon_splits() {
        let splits = vec![
            split("A", "2:01.50"),
            split("B", "2:03.00"),
            split("C", "1:59.75"),
            split("D", "2:05.25"),
        ];
        let relay = calculate_relay(&splits, "800m RS", " RS").unwrap();
        assert_eq!(relay.result, "8:09.50");
        assert_eq!(relay.event, "4x800m Relay");
    }

    #[test]
    fn test_unreadable_split_in_top_four() {
        let splits = vec![
            split("A", "50.0"),
            split("B", "49.5"),
            split("C", "DNF"),
            split("D", "48.9"),
        ];
        assert!(calculate_relay(&splits, "400m RS", " RS").is_none());
    }

    #[test]
    fn test_unreadable_split_outside_top_four() {
        let splits = vec![
            split("A", "50.0"),
            split("B", "49.5"),
            split("C", "DNF"),
            split("D", "48.9"),
            split("E", "51.0"),
        ];
        let relay = calculate_relay(&splits, "400m RS", " RS").unwrap();
        assert!(!relay.includes("C"));
    }

    #[test]
    fn test_relay_event_name() {
        assert_eq!(relay_event_name("400m RS", " RS"), "4x400m Relay");
        assert_eq!(relay_event_name("200m RS", " RS"), "4x200m Relay");
    }

    #[test]
    fn test_group_splits_by_team() {
        let rows = vec![
            leg_row(1, "A", "50.0", "Harriers"),
            leg_row(2, "B", "50.1", "Harriers"),
            leg_row(3, "C", "50.2", "Striders"),
        ];
        let groups = group_splits(&rows, &RelayConfig::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].team, "Harriers");
        assert_eq!(groups[0].splits.len(), 2);
    }

    #[test]
    fn test_relays_for_skips_short_groups() {
        let mut rows: Vec<_> = (0..4)
            .map(|i| leg_row(i, &format!("H{}", i), "50.0", "Harriers"))
            .collect();
        rows.push(leg_row(9, "S1", "49.0", "Striders"));
        let relays = relays_for(&rows, &RelayConfig::default());
        assert_eq!(relays.len(), 1);
        assert_eq!(relays[0].team, "Harriers");
        assert_eq!(relays[0].result, "3:20.00");
    }

    #[test]
    fn test_athlete_relays_includes_reserve() {
        let mut rows: Vec<_> = (0..4)
            .map(|i| leg_row(i, &format!("H{}", i), "50.0", "Harriers"))
            .collect();
        rows.push(leg_row(9, "Slow", "58.0", "Harriers"));
        let relays = athlete_relays(&rows, "Slow", &RelayConfig::default());
        assert_eq!(relays.len(), 1);
        assert!(!relays[0].includes("Slow"));
        assert!(athlete_relays(&rows, "Nobody", &RelayConfig::default()).is_empty());
    }
}
