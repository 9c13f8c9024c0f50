use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One performance as stored.
///
/// Athletes and teams are plain names. Two rows belong to the same athlete
/// only when the names are byte-for-byte equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: i64,
    pub date: NaiveDate,
    pub athlete: String,
    pub meet: String,
    pub event: String,
    pub result: String, // time or mark, format depends on event
    pub team: String,
}

/// A result waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResult {
    pub date: NaiveDate,
    pub athlete: String,
    pub meet: String,
    pub event: String,
    pub result: String,
    pub team: String,
}

impl NewResult {
    /// Fill a blank meet name with the date as YYYYMMDD.
    pub fn with_meet_fallback(mut self) -> Self {
        if self.meet.trim().is_empty() {
            self.meet = self.date.format("%Y%m%d").to_string();
        } else {
            self.meet = self.meet.trim().to_string();
        }
        self
    }
}

/// Field corrections for an existing result. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPatch {
    pub date: Option<NaiveDate>,
    pub athlete: Option<String>,
    pub meet: Option<String>,
    pub event: Option<String>,
    pub result: Option<String>,
    pub team: Option<String>,
}

impl ResultPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.athlete.is_none()
            && self.meet.is_none()
            && self.event.is_none()
            && self.result.is_none()
            && self.team.is_none()
    }
}

/// Row selection for store queries. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultFilter {
    pub event: Option<String>,
    pub events: Option<Vec<String>>,
    pub athlete: Option<String>,
    pub athlete_like: Option<String>,
    pub team: Option<String>,
    pub meet: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ResultFilter {
    pub fn event(event: &str) -> Self {
        Self {
            event: Some(event.to_string()),
            ..Default::default()
        }
    }

    pub fn athlete(athlete: &str) -> Self {
        Self {
            athlete: Some(athlete.to_string()),
            ..Default::default()
        }
    }

    pub fn team(team: &str) -> Self {
        Self {
            team: Some(team.to_string()),
            ..Default::default()
        }
    }

    pub fn meet(meet: &str) -> Self {
        Self {
            meet: Some(meet.to_string()),
            ..Default::default()
        }
    }

    /// Check a row against the filter in memory.
    pub fn matches(&self, row: &ResultRow) -> bool {
        fn eq(want: &Option<String>, have: &str) -> bool {
            want.as_deref().map_or(true, |w| w == have)
        }

        eq(&self.event, &row.event)
            && self
                .events
                .as_ref()
                .map_or(true, |events| events.iter().any(|e| e == &row.event))
            && eq(&self.athlete, &row.athlete)
            && self
                .athlete_like
                .as_deref()
                .map_or(true, |needle| row.athlete.to_lowercase().contains(&needle.to_lowercase()))
            && eq(&self.team, &row.team)
            && eq(&self.meet, &row.meet)
            && self.from.map_or(true, |from| row.date >= from)
            && self.to.map_or(true, |to| row.date <= to)
    }
}

/// Change notifications for derived views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEvent {
    Added { meet: String },
    Updated { meets: Vec<String> },
    Deleted { meet: String },
    MeetRenamed { from: String, to: String },
}

impl ResultEvent {
    /// Meets whose derived views are stale after this change.
    pub fn affected_meets(&self) -> Vec<&str> {
        match self {
            ResultEvent::Added { meet } | ResultEvent::Deleted { meet } => vec![meet.as_str()],
            ResultEvent::Updated { meets } => meets.iter().map(String::as_str).collect(),
            ResultEvent::MeetRenamed { from, to } => vec![from.as_str(), to.as_str()],
        }
    }
}
