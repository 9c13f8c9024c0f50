use serde::Serialize;
use std::cmp::Ordering;

use super::event::{Direction, EventKind, Performance};
use super::parse::{all_results_are_field_format, parse_field, parse_time};

/// How to order one query's result strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Times in seconds, lowest first.
    TimeAscending,
    /// Every mark is feet and inches; compare total inches, highest first.
    FeetInchesDescending,
    /// Decimal marks (meters or mixed formats), highest first.
    DecimalDescending,
}

impl Comparator {
    pub fn performance(self, result: &str) -> Performance {
        match self {
            Comparator::TimeAscending => Performance {
                value: parse_time(result),
                direction: Direction::LowerIsBetter,
            },
            Comparator::FeetInchesDescending | Comparator::DecimalDescending => Performance {
                value: parse_field(result),
                direction: Direction::HigherIsBetter,
            },
        }
    }

    /// Better result first, unparseable results last.
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        self.performance(a).compare(&self.performance(b))
    }
}

/// Pick the comparator for one set of results from the same event.
///
/// A set written entirely in feet and inches is compared as distances even
/// when the event label is unknown. Otherwise the event kind decides.
pub fn select_comparator<S: AsRef<str>>(kind: EventKind, results: &[S]) -> Comparator {
    if all_results_are_field_format(results) {
        return Comparator::FeetInchesDescending;
    }
    match kind {
        EventKind::Time => Comparator::TimeAscending,
        EventKind::Field => Comparator::DecimalDescending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_feet_inches_selects_field_order() {
        let results = ["17'6\"", "18'1\""];
        assert_eq!(
            select_comparator(EventKind::Time, &results),
            Comparator::FeetInchesDescending
        );
    }

    #[test]
    fn test_mixed_formats_follow_event_kind() {
        let results = ["17'6\"", "5.40"];
        assert_eq!(
            select_comparator(EventKind::Field, &results),
            Comparator::DecimalDescending
        );
        assert_eq!(
            select_comparator(EventKind::Time, &["4:32.10", "4:29.88"]),
            Comparator::TimeAscending
        );
    }

    #[test]
    fn test_empty_set_follows_event_kind() {
        let results: [&str; 0] = [];
        assert_eq!(
            select_comparator(EventKind::Time, &results),
            Comparator::TimeAscending
        );
    }

    #[test]
    fn test_time_comparator_reads_colons() {
        // A plain numeric cast would put "4:32.10" before "59.00"
        assert_eq!(
            Comparator::TimeAscending.compare("59.00", "4:32.10"),
            Ordering::Less
        );
    }

    #[test]
    fn test_field_comparators_put_bad_marks_last() {
        assert_eq!(
            Comparator::FeetInchesDescending.compare("NM", "17'6\""),
            Ordering::Greater
        );
        assert_eq!(
            Comparator::DecimalDescending.compare("6.10", "5.95"),
            Ordering::Less
        );
    }
}
