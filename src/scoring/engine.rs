use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::config::PointTable;
use super::places::{assign_places, award_points};
use crate::config::RelayConfig;
use crate::perf::{select_comparator, Direction, EventCatalog, Performance};
use crate::relay::RelayResult;
use crate::results::ResultRow;

/// One line of an event's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placing {
    pub place: Option<u32>,
    /// Athlete name, or the leg runners joined with " / " for relays.
    pub athlete: String,
    pub team: String,
    pub result: String,
    pub points: f64,
}

/// Placings for one event on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPlacings {
    pub event: String,
    pub date: NaiveDate,
    /// Relay splits are listed but never score.
    pub scored: bool,
    pub placings: Vec<Placing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamScore {
    pub team: String,
    pub points: f64,
}

/// Everything the meet report shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetScoring {
    pub meet: String,
    pub events: Vec<EventPlacings>,
    pub team_scores: Vec<TeamScore>,
}

/// Score a meet.
///
/// Individual results are grouped by (event, date) and placed with the
/// event's comparator. Relay-leg rows are listed unscored; the relays built
/// from them are placed by total time and score instead.
pub fn score_meet(
    meet: &str,
    rows: &[ResultRow],
    relays: &[RelayResult],
    table: &PointTable,
    relay_config: &RelayConfig,
    catalog: &EventCatalog,
) -> MeetScoring {
    let mut groups: BTreeMap<(NaiveDate, &str), Vec<&ResultRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.date, row.event.as_str()))
            .or_default()
            .push(row);
    }

    let mut events = Vec::new();
    for ((date, event), group) in groups {
        let scored = !relay_config.is_leg_event(event);
        let results: Vec<&str> = group.iter().map(|r| r.result.as_str()).collect();
        let comparator = select_comparator(catalog.kind(event), &results);
        let perfs: Vec<Performance> = results.iter().map(|r| comparator.performance(r)).collect();

        let placings = place_entries(
            &perfs,
            table,
            scored,
            group.iter().map(|r| (r.athlete.clone(), r.team.clone(), r.result.clone())),
        );
        events.push(EventPlacings {
            event: event.to_string(),
            date,
            scored,
            placings,
        });
    }

    let mut relay_groups: BTreeMap<(NaiveDate, &str), Vec<&RelayResult>> = BTreeMap::new();
    for relay in relays {
        relay_groups
            .entry((relay.date, relay.event.as_str()))
            .or_default()
            .push(relay);
    }

    for ((date, event), group) in relay_groups {
        let perfs: Vec<Performance> = group
            .iter()
            .map(|r| Performance {
                value: r.total_seconds,
                direction: Direction::LowerIsBetter,
            })
            .collect();
        let placings = place_entries(
            &perfs,
            table,
            true,
            group
                .iter()
                .map(|r| (r.athletes().join(" / "), r.team.clone(), r.result.clone())),
        );
        events.push(EventPlacings {
            event: event.to_string(),
            date,
            scored: true,
            placings,
        });
    }

    let team_scores = team_totals(&events);
    tracing::debug!(meet, events = events.len(), teams = team_scores.len(), "scored meet");

    MeetScoring {
        meet: meet.to_string(),
        events,
        team_scores,
    }
}

/// Place one event's entries, best first with unplaced entries at the end.
fn place_entries(
    perfs: &[Performance],
    table: &PointTable,
    scored: bool,
    entries: impl Iterator<Item = (String, String, String)>,
) -> Vec<Placing> {
    let places = assign_places(perfs);
    let points = if scored {
        award_points(&places, table)
    } else {
        vec![0.0; places.len()]
    };

    let mut placings: Vec<Placing> = entries
        .zip(places)
        .zip(points)
        .map(|(((athlete, team, result), place), points)| Placing {
            place,
            athlete,
            team,
            result,
            points,
        })
        .collect();
    placings.sort_by_key(|p| p.place.unwrap_or(u32::MAX));
    placings
}

/// Sum points per team across scored events, highest first, ties by name.
///
/// Every team that appears in a scored event is listed, even with zero.
pub fn team_totals(events: &[EventPlacings]) -> Vec<TeamScore> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for placing in events.iter().filter(|e| e.scored).flat_map(|e| &e.placings) {
        *totals.entry(placing.team.as_str()).or_default() += placing.points;
    }

    let mut scores: Vec<TeamScore> = totals
        .into_iter()
        .map(|(team, points)| TeamScore {
            team: team.to_string(),
            points,
        })
        .collect();
    scores.sort_by(|a, b| b.points.total_cmp(&a.points).then_with(|| a.team.cmp(&b.team)));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::relays_for;

    fn row(id: i64, athlete: &str, event: &str, result: &str, team: &str) -> ResultRow {
        ResultRow {
            id,
            date: "2024-04-13".parse().unwrap(),
            athlete: athlete.to_string(),
            meet: "Spring Open".to_string(),
            event: event.to_string(),
            result: result.to_string(),
            team: team.to_string(),
        }
    }

    fn score(rows: &[ResultRow]) -> MeetScoring {
        let relay_config = RelayConfig::default();
        let relays = relays_for(rows, &relay_config);
        score_meet(
            "Spring Open",
            rows,
            &relays,
            &PointTable::ncaa(),
            &relay_config,
            &EventCatalog::default(),
        )
    }

    fn points_for(scoring: &MeetScoring, team: &str) -> f64 {
        scoring
            .team_scores
            .iter()
            .find(|t| t.team == team)
            .map(|t| t.points)
            .unwrap_or(0.0)
    }

    #[test]
    fn test_tie_for_first_shares_points() {
        let rows = vec![
            row(1, "Ana", "100m", "10.9", "A"),
            row(2, "Bea", "100m", "10.9", "B"),
            row(3, "Cai", "100m", "11.0", "C"),
            row(4, "Dee", "100m", "11.1", "D"),
        ];
        let scoring = score(&rows);
        let places: Vec<_> = scoring.events[0].placings.iter().map(|p| p.place).collect();
        assert_eq!(places, vec![Some(1), Some(1), Some(3), Some(4)]);
        assert_eq!(points_for(&scoring, "A"), 9.0);
        assert_eq!(points_for(&scoring, "B"), 9.0);
        assert_eq!(points_for(&scoring, "C"), 6.0);
        assert_eq!(points_for(&scoring, "D"), 5.0);
    }

    #[test]
    fn test_team_totals_sorted_with_name_tiebreak() {
        let rows = vec![
            row(1, "Ana", "100m", "10.9", "Striders"),
            row(2, "Bea", "100m", "11.0", "Harriers"),
            row(3, "Cai", "Long Jump", "18'1\"", "Harriers"),
            row(4, "Dee", "Long Jump", "17'6\"", "Striders"),
        ];
        let scoring = score(&rows);
        let teams: Vec<_> = scoring.team_scores.iter().map(|t| t.team.as_str()).collect();
        assert_eq!(teams, vec!["Harriers", "Striders"]);
        assert_eq!(scoring.team_scores[0].points, 18.0);
        assert_eq!(scoring.team_scores[1].points, 18.0);
    }

    #[test]
    fn test_unreadable_result_scores_nothing() {
        let rows = vec![
            row(1, "Ana", "100m", "DNF", "A"),
            row(2, "Bea", "100m", "11.0", "B"),
        ];
        let scoring = score(&rows);
        let placings = &scoring.events[0].placings;
        assert_eq!(placings[0].athlete, "Bea");
        assert_eq!(placings[1].place, None);
        assert_eq!(placings[1].points, 0.0);
        assert_eq!(points_for(&scoring, "A"), 0.0);
        assert_eq!(points_for(&scoring, "B"), 10.0);
    }

    #[test]
    fn test_relay_splits_listed_but_relay_scores() {
        let mut rows: Vec<_> = (0..5)
            .map(|i| row(i, &format!("H{}", i), "400m RS", &format!("5{}.0", i), "Harriers"))
            .collect();
        rows.extend((0..4).map(|i| row(10 + i, &format!("S{}", i), "400m RS", "49.0", "Striders")));
        let scoring = score(&rows);

        let splits = scoring.events.iter().find(|e| e.event == "400m RS").unwrap();
        assert!(!splits.scored);
        assert_eq!(splits.placings.len(), 9);
        assert!(splits.placings.iter().all(|p| p.points == 0.0));

        let relay = scoring
            .events
            .iter()
            .find(|e| e.event == "4x400m Relay")
            .unwrap();
        assert!(relay.scored);
        assert_eq!(relay.placings[0].team, "Striders");
        assert_eq!(relay.placings[0].result, "3:16.00");
        assert_eq!(relay.placings[1].athlete, "H0 / H1 / H2 / H3");

        assert_eq!(points_for(&scoring, "Striders"), 10.0);
        assert_eq!(points_for(&scoring, "Harriers"), 8.0);
    }

    #[test]
    fn test_groups_by_event_and_date() {
        let mut rows = vec![
            row(1, "Ana", "100m", "10.9", "A"),
            row(2, "Bea", "100m", "11.0", "B"),
        ];
        rows[1].date = "2024-04-14".parse().unwrap();
        let scoring = score(&rows);
        assert_eq!(scoring.events.len(), 2);
        assert_eq!(points_for(&scoring, "A"), 10.0);
        assert_eq!(points_for(&scoring, "B"), 10.0);
    }

    #[test]
    fn test_empty_meet() {
        let scoring = score(&[]);
        assert!(scoring.events.is_empty());
        assert!(scoring.team_scores.is_empty());
    }
}
