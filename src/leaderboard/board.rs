use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::perf::{select_comparator, Comparator, EventCatalog, Performance};
use crate::results::ResultRow;

pub const DEFAULT_PER_PAGE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardMode {
    /// One row per athlete: their best mark.
    #[default]
    Best,
    /// Every mark, unreduced.
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardQuery {
    pub event: String,
    pub team: Option<String>,
    pub athlete: Option<String>,
    pub mode: LeaderboardMode,
    /// 1-based
    pub page: usize,
    pub per_page: usize,
}

impl LeaderboardQuery {
    pub fn new(event: &str) -> Self {
        Self {
            event: event.to_string(),
            team: None,
            athlete: None,
            mode: LeaderboardMode::Best,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    fn matches(&self, row: &ResultRow) -> bool {
        row.event == self.event
            && self.team.as_ref().map_or(true, |t| &row.team == t)
            && self.athlete.as_ref().map_or(true, |a| &row.athlete == a)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub athlete: String,
    pub team: String,
    pub result: String,
    pub date: NaiveDate,
    pub meet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub event: String,
    pub mode: LeaderboardMode,
    pub comparator: Comparator,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub entries: Vec<LeaderboardEntry>,
}

/// Ordered marks for one event.
///
/// The comparator is chosen from this query's own result strings.
/// Unreadable marks sort after every readable one.
pub fn leaderboard(
    rows: &[ResultRow],
    query: &LeaderboardQuery,
    catalog: &EventCatalog,
) -> Leaderboard {
    let matching: Vec<&ResultRow> = rows.iter().filter(|r| query.matches(r)).collect();
    let results: Vec<&str> = matching.iter().map(|r| r.result.as_str()).collect();
    let comparator = select_comparator(catalog.kind(&query.event), &results);

    let mut ranked: Vec<(Performance, &ResultRow)> = match query.mode {
        LeaderboardMode::All => matching
            .iter()
            .map(|r| (comparator.performance(&r.result), *r))
            .collect(),
        LeaderboardMode::Best => best_per_athlete(&matching, comparator),
    };
    ranked.sort_by(|a, b| a.0.compare(&b.0));

    let per_page = query.per_page.max(1);
    let page = query.page.max(1);
    let total = ranked.len();
    let total_pages = total.div_ceil(per_page);
    let offset = (page - 1).saturating_mul(per_page);

    let entries = ranked
        .into_iter()
        .enumerate()
        .skip(offset)
        .take(per_page)
        .map(|(i, (_, row))| LeaderboardEntry {
            position: i + 1,
            athlete: row.athlete.clone(),
            team: row.team.clone(),
            result: row.result.clone(),
            date: row.date,
            meet: row.meet.clone(),
        })
        .collect();

    Leaderboard {
        event: query.event.clone(),
        mode: query.mode,
        comparator,
        page,
        total_pages,
        total,
        entries,
    }
}

fn best_per_athlete<'a>(
    rows: &[&'a ResultRow],
    comparator: Comparator,
) -> Vec<(Performance, &'a ResultRow)> {
    let mut bests: Vec<(Performance, &ResultRow)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for &row in rows {
        let perf = comparator.performance(&row.result);
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
    bests
}
