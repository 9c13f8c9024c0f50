use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::perf::{select_comparator, EventCatalog, Performance};
use crate::ranking::RankingWindow;
use crate::results::ResultRow;

/// An athlete's best mark in one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalBest {
    pub event: String,
    pub result: String,
    pub date: NaiveDate,
    pub meet: String,
}

/// athlete -> event -> best mark
pub type TeamBests = BTreeMap<String, BTreeMap<String, String>>;

/// Best readable mark among rows of a single event.
fn best_of<'a>(rows: &[&'a ResultRow], catalog: &EventCatalog) -> Option<&'a ResultRow> {
    let event = rows.first().map(|r| r.event.as_str())?;
    let results: Vec<&str> = rows.iter().map(|r| r.result.as_str()).collect();
    let comparator = select_comparator(catalog.kind(event), &results);

    let mut best: Option<(Performance, &ResultRow)> = None;
    for &row in rows {
        let perf = comparator.performance(&row.result);
        if !perf.is_valid() {
            continue;
        }
        if best.map_or(true, |(b, _)| perf.is_better_than(&b)) {
            best = Some((perf, row));
        }
    }
    best.map(|(_, row)| row)
}

fn by_event(rows: &[ResultRow]) -> HashMap<&str, Vec<&ResultRow>> {
    let mut grouped: HashMap<&str, Vec<&ResultRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.event.as_str()).or_default().push(row);
    }
    grouped
}

/// Position of `event` in the preferred order; unlisted events go last.
fn order_key<'a>(event: &'a str, order: &[String]) -> (usize, &'a str) {
    let position = order.iter().position(|e| e == event).unwrap_or(order.len());
    (position, event)
}

/// One best per event for a single athlete's rows.
///
/// Events follow `order`; events not in it come after, alphabetically.
/// Events with no readable mark are left out.
pub fn personal_bests(
    rows: &[ResultRow],
    catalog: &EventCatalog,
    order: &[String],
) -> Vec<PersonalBest> {
    let mut bests: Vec<PersonalBest> = by_event(rows)
        .values()
        .filter_map(|group| best_of(group, catalog))
        .map(|row| PersonalBest {
            event: row.event.clone(),
            result: row.result.clone(),
            date: row.date,
            meet: row.meet.clone(),
        })
        .collect();
    bests.sort_by(|a, b| order_key(&a.event, order).cmp(&order_key(&b.event, order)));
    bests
}

/// Personal bests restricted to the trailing window ending on `as_of`.
pub fn annual_bests(
    rows: &[ResultRow],
    as_of: NaiveDate,
    window: &RankingWindow,
    catalog: &EventCatalog,
    order: &[String],
) -> Vec<PersonalBest> {
    let recent: Vec<ResultRow> = rows
        .iter()
        .filter(|r| window.contains(r.date, as_of, true))
        .cloned()
        .collect();
    personal_bests(&recent, catalog, order)
}

/// Best mark per athlete in each of `events` for one team's rows.
///
/// Every athlete in `rows` gets an entry, even with no mark in `events`.
pub fn team_bests(rows: &[ResultRow], events: &[String], catalog: &EventCatalog) -> TeamBests {
    let mut grouped: BTreeMap<&str, BTreeMap<&str, Vec<&ResultRow>>> = BTreeMap::new();
    for row in rows {
        let athlete = grouped.entry(row.athlete.as_str()).or_default();
        if events.iter().any(|e| e == &row.event) {
            athlete.entry(row.event.as_str()).or_default().push(row);
        }
    }

    grouped
        .into_iter()
        .map(|(athlete, per_event)| {
            let marks = per_event
                .into_iter()
                .filter_map(|(event, group)| {
                    best_of(&group, catalog).map(|row| (event.to_string(), row.result.clone()))
                })
                .collect();
            (athlete.to_string(), marks)
        })
        .collect()
}
