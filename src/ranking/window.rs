use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: u64 = 86_400;

/// Ranking configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RankingConfig {
    /// Trailing window for current rankings, e.g. "365 days" or "52w"
    #[serde(default = "default_window")]
    pub window: String,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

fn default_window() -> String {
    "365 days".to_string()
}

/// Trailing window of whole days ending on a target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingWindow {
    pub days: i64,
}

impl Default for RankingWindow {
    fn default() -> Self {
        Self { days: 365 }
    }
}

impl RankingWindow {
    pub fn parse(s: &str) -> Result<Self> {
        let duration = humantime::parse_duration(s.trim())?;
        let days = duration.as_secs() / SECONDS_PER_DAY;
        if days == 0 {
            bail!("window must be at least one day");
        }
        Ok(Self { days: days as i64 })
    }

    pub fn from_config(config: &RankingConfig) -> Result<Self> {
        Self::parse(&config.window)
    }

    /// Inclusive date bounds for a ranking as of `as_of`.
    ///
    /// The upper bound is `as_of` itself when the day counts, otherwise the
    /// day before. The lower bound is always `as_of` minus the window.
    pub fn bounds(&self, as_of: NaiveDate, include_current: bool) -> (NaiveDate, NaiveDate) {
        let start = as_of - Duration::days(self.days);
        let end = if include_current {
            as_of
        } else {
            as_of - Duration::days(1)
        };
        (start, end)
    }

    pub fn contains(&self, date: NaiveDate, as_of: NaiveDate, include_current: bool) -> bool {
        let (start, end) = self.bounds(as_of, include_current);
        date >= start && date <= end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_window() {
        assert_eq!(RankingWindow::parse("365 days").unwrap().days, 365);
        assert_eq!(RankingWindow::parse("52w").unwrap().days, 364);
        assert!(RankingWindow::parse("12h").is_err());
        assert!(RankingWindow::parse("soon").is_err());
    }

    #[test]
    fn test_bounds_after_includes_date() {
        let window = RankingWindow::default();
        let (start, end) = window.bounds(d("2024-06-01"), true);
        assert_eq!(start, d("2023-06-02"));
        assert_eq!(end, d("2024-06-01"));
    }

    #[test]
    fn test_bounds_before_excludes_date() {
        let window = RankingWindow::default();
        assert!(!window.contains(d("2024-06-01"), d("2024-06-01"), false));
        assert!(window.contains(d("2024-05-31"), d("2024-06-01"), false));
    }

    #[test]
    fn test_window_edge() {
        let window = RankingWindow::default();
        assert!(window.contains(d("2023-06-02"), d("2024-06-01"), true));
        assert!(!window.contains(d("2023-06-01"), d("2024-06-01"), true));
    }
}
