use super::schema::Config;
use crate::ranking::RankingWindow;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Err(e) = RankingWindow::parse(&config.ranking.window) {
        errors.push(format!(
            "ranking.window: invalid '{}' - {}",
            config.ranking.window, e
        ));
    }

    let points = &config.scoring.points;
    if points.is_empty() {
        errors.push("scoring.points: must list at least one value".to_string());
    }
    for (i, value) in points.iter().enumerate() {
        if !value.is_finite() || *value < 0.0 {
            errors.push(format!("scoring.points[{}]: must be non-negative", i));
        }
    }
    if points.windows(2).any(|w| w[1] > w[0]) {
        errors.push("scoring.points: values must not increase with place".to_string());
    }

    let marker = &config.relay.split_marker;
    if marker.is_empty() {
        errors.push("relay.split_marker: must not be empty".to_string());
    } else {
        for (i, event) in config.relay.leg_events.iter().enumerate() {
            if !event.ends_with(marker.as_str()) {
                errors.push(format!(
                    "relay.leg_events[{}]: '{}' does not end with split marker '{}'",
                    i, event, marker
                ));
            }
        }
    }

    for (section, entries) in [("time", &config.events.time), ("field", &config.events.field)] {
        for (i, entry) in entries.iter().enumerate() {
            if let Err(e) = glob::Pattern::new(entry) {
                errors.push(format!("events.{}[{}]: invalid '{}' - {}", section, i, entry, e));
            }
        }
    }
    for entry in &config.events.time {
        if config.events.field.contains(entry) {
            errors.push(format!("events: '{}' is listed as both time and field", entry));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_window() {
        let mut config = Config::default();
        config.ranking.window = "a while".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("ranking.window"));
    }

    #[test]
    fn test_increasing_points_rejected() {
        let mut config = Config::default();
        config.scoring.points = vec![1.0, 2.0];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("must not increase"));
    }

    #[test]
    fn test_leg_event_without_marker() {
        let mut config = Config::default();
        config.relay.leg_events = vec!["400m".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("relay.leg_events[0]"));
    }

    #[test]
    fn test_event_in_both_lists() {
        let mut config = Config::default();
        config.events.field.push("100m".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("'100m'")));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.ranking.window = "bad".to_string(); // Error 1
        config.scoring.points = vec![]; // Error 2
        config.relay.split_marker = String::new(); // Error 3
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
