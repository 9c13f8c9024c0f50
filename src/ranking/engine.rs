use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::window::RankingWindow;
use crate::perf::{EventCatalog, Performance};
use crate::results::ResultRow;

/// One ranked athlete with the result that earned the rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub rank: u32,
    pub athlete: String,
    pub team: String,
    pub result: String,
    pub date: NaiveDate,
    pub meet: String,
}

/// Ranking of every athlete with a valid result in the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rankings {
    pub event: String,
    pub as_of: NaiveDate,
    pub include_current: bool,
    pub entries: Vec<RankEntry>,
}

impl Rankings {
    /// Rank of one athlete, `None` when unranked.
    pub fn rank_of(&self, athlete: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.athlete == athlete)
            .map(|e| e.rank)
    }
}

/// Where a result moved an athlete in the rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankMovement {
    pub before: Option<u32>,
    pub after: Option<u32>,
}

impl RankMovement {
    pub fn improved(&self) -> bool {
        match (self.before, self.after) {
            (None, Some(_)) => true,
            (Some(before), Some(after)) => after < before,
            _ => false,
        }
    }
}

/// Cached per-meet ranking change for one athlete in one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteRanking {
    pub meet: String,
    pub event: String,
    pub date: NaiveDate,
    pub athlete: String,
    pub movement: RankMovement,
}

/// Rank athletes in `event` by their best result in the trailing window.
///
/// `include_current` decides whether results on `as_of` itself count: false
/// gives the ranking going into a meet, true the ranking coming out of it.
/// Unparseable results never qualify. Athletes with equal bests get
/// consecutive ranks in the order the athletes first appear in `rows`;
/// callers should treat that order as stable but unspecified.
pub fn rank_for_date(
    rows: &[ResultRow],
    event: &str,
    as_of: NaiveDate,
    include_current: bool,
    window: &RankingWindow,
    catalog: &EventCatalog,
) -> Rankings {
    let kind = catalog.kind(event);

    let mut bests: Vec<(Performance, &ResultRow)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        if row.event != event || !window.contains(row.date, as_of, include_current) {
            continue;
        }
        let perf = kind.parse(&row.result);
        if !perf.is_valid() {
            continue;
        }
        match index.get(row.athlete.as_str()) {
            Some(&i) => {
                if perf.is_better_than(&bests[i].0) {
                    bests[i] = (perf, row);
                }
            }
            None => {
                index.insert(row.athlete.as_str(), bests.len());
                bests.push((perf, row));
            }
        }
    }

    bests.sort_by(|a, b| a.0.compare(&b.0));

    let entries = bests
        .into_iter()
        .enumerate()
        .map(|(i, (_, row))| RankEntry {
            rank: i as u32 + 1,
            athlete: row.athlete.clone(),
            team: row.team.clone(),
            result: row.result.clone(),
            date: row.date,
            meet: row.meet.clone(),
        })
        .collect();

    Rankings {
        event: event.to_string(),
        as_of,
        include_current,
        entries,
    }
}

/// Rank of a single athlete, `None` when they have no qualifying result.
pub fn rank_athlete(
    rows: &[ResultRow],
    event: &str,
    athlete: &str,
    as_of: NaiveDate,
    include_current: bool,
    window: &RankingWindow,
    catalog: &EventCatalog,
) -> Option<u32> {
    rank_for_date(rows, event, as_of, include_current, window, catalog).rank_of(athlete)
}

/// Rank going into and coming out of `date`.
pub fn rank_movement(
    rows: &[ResultRow],
    event: &str,
    athlete: &str,
    date: NaiveDate,
    window: &RankingWindow,
    catalog: &EventCatalog,
) -> RankMovement {
    RankMovement {
        before: rank_athlete(rows, event, athlete, date, false, window, catalog),
        after: rank_athlete(rows, event, athlete, date, true, window, catalog),
    }
}

/// Before/after ranks for every athlete and event in a meet.
///
/// `meet_rows` are the meet's own results; `event_rows` must hold every
/// result for the events those rows cover.
pub fn meet_rankings(
    meet_rows: &[ResultRow],
    event_rows: &[ResultRow],
    window: &RankingWindow,
    catalog: &EventCatalog,
) -> Vec<AthleteRanking> {
    let mut computed: HashMap<(String, NaiveDate, bool), Rankings> = HashMap::new();
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for row in meet_rows {
        if !seen.insert((row.event.as_str(), row.date, row.athlete.as_str())) {
            continue;
        }

        let mut lookup = |include_current: bool| {
            computed
                .entry((row.event.clone(), row.date, include_current))
                .or_insert_with(|| {
                    rank_for_date(
                        event_rows,
                        &row.event,
                        row.date,
                        include_current,
                        window,
                        catalog,
                    )
                })
                .rank_of(&row.athlete)
        };
        let before = lookup(false);
        let after = lookup(true);

        out.push(AthleteRanking {
            meet: row.meet.clone(),
            event: row.event.clone(),
            date: row.date,
            athlete: row.athlete.clone(),
            movement: RankMovement { before, after },
        });
    }

    tracing::debug!(entries = out.len(), "computed meet rankings");
    out
}
