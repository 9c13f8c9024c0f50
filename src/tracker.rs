use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cache::{
    cache_scope, CacheBackend, DerivedCache, ResultListener, ATHLETE_RANKINGS, TEAM_SCORES,
};
use crate::config::Config;
use crate::leaderboard::{
    annual_bests, leaderboard, personal_bests, team_bests, Leaderboard, LeaderboardQuery,
    PersonalBest, TeamBests,
};
use crate::perf::{normalize_leading_zero, EventCatalog};
use crate::ranking::{meet_rankings, rank_for_date, AthleteRanking, RankingWindow, Rankings};
use crate::relay::{athlete_relays, relays_for, RelayResult};
use crate::results::{NewResult, ResultEvent, ResultFilter, ResultPatch, ResultRow};
use crate::scoring::{score_meet, MeetScoring, PointTable};
use crate::store::{EventSummary, ResultStore, TeamSummary};

/// Everything shown for one meet.
#[derive(Debug, Clone, Serialize)]
pub struct MeetReport {
    pub meet: String,
    pub scoring: MeetScoring,
    pub relays: Vec<RelayResult>,
    pub rankings: Vec<AthleteRanking>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AthleteProfile {
    pub athlete: String,
    pub team: Option<String>,
    /// Most recent first
    pub results: Vec<ResultRow>,
    pub personal_bests: Vec<PersonalBest>,
    pub annual_bests: Vec<PersonalBest>,
    pub relays: Vec<RelayResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamProfile {
    pub team: String,
    /// Most recent first
    pub results: Vec<ResultRow>,
    pub athletes: Vec<String>,
    pub events: Vec<String>,
    pub bests: TeamBests,
}

/// One result rewritten by [`Tracker::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResult {
    pub id: i64,
    pub meet: String,
    pub from: String,
    pub to: String,
}

/// Ties the store to the ranking, relay and scoring engines and keeps the
/// per-meet caches in step with every change.
pub struct Tracker<S: ResultStore> {
    store: S,
    config: Config,
    catalog: EventCatalog,
    window: RankingWindow,
    points: PointTable,
    team_scores: DerivedCache<MeetScoring>,
    athlete_rankings: DerivedCache<Vec<AthleteRanking>>,
    listeners: Vec<Box<dyn ResultListener>>,
}

impl<S: ResultStore> Tracker<S> {
    pub fn new(store: S, config: Config, backend: Arc<dyn CacheBackend>) -> Result<Self> {
        let catalog =
            EventCatalog::from_config(&config.events).context("Invalid event classification")?;
        let window = RankingWindow::from_config(&config.ranking)?;
        let points = PointTable::from_config(&config.scoring);

        let scope = cache_scope(store.location(), &config)?;
        tracing::debug!(location = %store.location(), scope = %scope, "derived cache scope");
        let team_scores = DerivedCache::new(TEAM_SCORES, &scope, Arc::clone(&backend));
        let athlete_rankings = DerivedCache::new(ATHLETE_RANKINGS, &scope, backend);

        let mut tracker = Self {
            store,
            config,
            catalog,
            window,
            points,
            team_scores: team_scores.clone(),
            athlete_rankings: athlete_rankings.clone(),
            listeners: Vec::new(),
        };
        tracker.subscribe(Box::new(team_scores));
        tracker.subscribe(Box::new(athlete_rankings));
        Ok(tracker)
    }

    /// Register another listener for result changes.
    pub fn subscribe(&mut self, listener: Box<dyn ResultListener>) {
        self.listeners.push(listener);
    }

    fn emit(&self, event: ResultEvent) {
        tracing::info!(?event, "results changed");
        for listener in &self.listeners {
            listener.on_result_event(&event);
        }
    }

    // --- changes ---

    /// Insert a result. A blank meet is named after the date.
    ///
    /// An exact copy of an existing row is refused unless `allow_duplicate`.
    pub fn add_result(&self, new: NewResult, allow_duplicate: bool) -> Result<ResultRow> {
        let new = new.with_meet_fallback();

        if !allow_duplicate {
            if let Some(existing) = self.store.find_duplicate(&new)? {
                anyhow::bail!(
                    "Result already recorded as #{} ({} {} {} at {})",
                    existing.id,
                    existing.athlete,
                    existing.event,
                    existing.result,
                    existing.meet
                );
            }
        }

        let row = self.store.insert(&new).context("Failed to add result")?;
        self.emit(ResultEvent::Added {
            meet: row.meet.clone(),
        });
        Ok(row)
    }

    pub fn update_result(&self, id: i64, patch: &ResultPatch) -> Result<ResultRow> {
        if patch.is_empty() {
            anyhow::bail!("Nothing to change for result #{}", id);
        }

        let (before, after) = self.store.update(id, patch)?;
        let mut meets = vec![before.meet];
        if after.meet != meets[0] {
            meets.push(after.meet.clone());
        }
        self.emit(ResultEvent::Updated { meets });
        Ok(after)
    }

    pub fn delete_result(&self, id: i64) -> Result<ResultRow> {
        let row = self.store.delete(id)?;
        self.emit(ResultEvent::Deleted {
            meet: row.meet.clone(),
        });
        Ok(row)
    }

    pub fn rename_meet(&self, from: &str, to: &str) -> Result<usize> {
        let to = to.trim();
        if to.is_empty() {
            anyhow::bail!("New meet name cannot be empty");
        }

        let changed = self.store.rename_meet(from, to)?;
        if changed == 0 {
            anyhow::bail!("No results for meet '{}'", from);
        }
        self.emit(ResultEvent::MeetRenamed {
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(changed)
    }

    /// Strip leading zeros from minute fields ("04:32.10" -> "4:32.10").
    ///
    /// All rows are rewritten in one transaction. With `dry_run` nothing is
    /// written and no caches are touched.
    pub fn normalize(&self, dry_run: bool) -> Result<Vec<NormalizedResult>> {
        let changes: Vec<NormalizedResult> = self
            .store
            .all()?
            .into_iter()
            .filter_map(|row| {
                normalize_leading_zero(&row.result).map(|to| NormalizedResult {
                    id: row.id,
                    meet: row.meet,
                    from: row.result,
                    to,
                })
            })
            .collect();

        if dry_run || changes.is_empty() {
            return Ok(changes);
        }

        let rewrites: Vec<(i64, String)> = changes.iter().map(|c| (c.id, c.to.clone())).collect();
        self.store
            .rewrite_results(&rewrites)
            .context("Failed to normalize results")?;

        let meets: BTreeSet<&str> = changes.iter().map(|c| c.meet.as_str()).collect();
        self.emit(ResultEvent::Updated {
            meets: meets.into_iter().map(String::from).collect(),
        });
        Ok(changes)
    }

    // --- views ---

    /// Placings, relays, team scores and rank movement for one meet.
    ///
    /// Team scores and rank movement come from the caches; `recompute`
    /// discards the cached copies first.
    pub fn meet_report(&self, meet: &str, recompute: bool) -> Result<MeetReport> {
        let rows = self.store.query(&ResultFilter::meet(meet))?;
        if rows.is_empty() {
            anyhow::bail!("No results for meet '{}'", meet);
        }

        if recompute {
            self.team_scores.invalidate(meet)?;
            self.athlete_rankings.invalidate(meet)?;
        }

        let relays = relays_for(&rows, &self.config.relay);

        let scoring = self.team_scores.compute_if_absent(meet, || {
            Ok(score_meet(
                meet,
                &rows,
                &relays,
                &self.points,
                &self.config.relay,
                &self.catalog,
            ))
        })?;

        let rankings = self.athlete_rankings.compute_if_absent(meet, || {
            let events: BTreeSet<String> = rows.iter().map(|r| r.event.clone()).collect();
            let history = self.store.query(&ResultFilter {
                events: Some(events.into_iter().collect()),
                ..Default::default()
            })?;
            Ok(meet_rankings(&rows, &history, &self.window, &self.catalog))
        })?;

        Ok(MeetReport {
            meet: meet.to_string(),
            scoring,
            relays,
            rankings,
        })
    }

    /// Ranking for `event` as of a date. `include_current` counts results on
    /// that date itself.
    pub fn rankings(
        &self,
        event: &str,
        as_of: NaiveDate,
        include_current: bool,
    ) -> Result<Rankings> {
        let rows = self.store.query(&ResultFilter::event(event))?;
        Ok(rank_for_date(
            &rows,
            event,
            as_of,
            include_current,
            &self.window,
            &self.catalog,
        ))
    }

    pub fn leaderboard(&self, query: &LeaderboardQuery) -> Result<Leaderboard> {
        let rows = self.store.query(&ResultFilter {
            event: Some(query.event.clone()),
            team: query.team.clone(),
            athlete: query.athlete.clone(),
            ..Default::default()
        })?;
        Ok(leaderboard(&rows, query, &self.catalog))
    }

    pub fn athlete_profile(&self, athlete: &str, as_of: NaiveDate) -> Result<AthleteProfile> {
        let rows = self.store.query(&ResultFilter::athlete(athlete))?;
        if rows.is_empty() {
            anyhow::bail!("No results for athlete '{}'", athlete);
        }

        let order = &self.config.events.order;
        let splits = self.store.query(&ResultFilter {
            events: Some(self.config.relay.leg_events.clone()),
            ..Default::default()
        })?;

        Ok(AthleteProfile {
            athlete: athlete.to_string(),
            team: self.store.latest_team(athlete)?,
            personal_bests: personal_bests(&rows, &self.catalog, order),
            annual_bests: annual_bests(&rows, as_of, &self.window, &self.catalog, order),
            relays: athlete_relays(&splits, athlete, &self.config.relay),
            results: rows.into_iter().rev().collect(),
        })
    }

    pub fn team_profile(&self, team: &str) -> Result<TeamProfile> {
        let rows = self.store.query(&ResultFilter::team(team))?;
        if rows.is_empty() {
            anyhow::bail!("No results for team '{}'", team);
        }

        let events = self.config.events.team.clone();
        let athletes: BTreeSet<&str> = rows.iter().map(|r| r.athlete.as_str()).collect();

        Ok(TeamProfile {
            team: team.to_string(),
            athletes: athletes.into_iter().map(String::from).collect(),
            bests: team_bests(&rows, &events, &self.catalog),
            events,
            results: rows.iter().rev().cloned().collect(),
        })
    }

    pub fn teams(&self) -> Result<Vec<TeamSummary>> {
        Ok(self.store.team_summaries()?)
    }

    pub fn events(&self) -> Result<Vec<EventSummary>> {
        Ok(self.store.event_summaries()?)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<ResultRow>> {
        Ok(self.store.recent(limit)?)
    }

    /// Team on the athlete's latest result, used to fill in `add`.
    pub fn latest_team(&self, athlete: &str) -> Result<Option<String>> {
        Ok(self.store.latest_team(athlete)?)
    }

    /// Meet of the last inserted result.
    pub fn last_meet(&self) -> Result<Option<String>> {
        Ok(self.store.last_meet()?)
    }
}
