use serde::{Deserialize, Serialize};

/// Main scoring configuration.
///
/// `points[0]` is awarded for 1st place, `points[1]` for 2nd, and so on.
/// Places past the end of the table score nothing.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   points: [10, 8, 6, 5, 4, 3, 2, 1]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default = "default_points")]
    pub points: Vec<f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
        }
    }
}

/// NCAA eight-place table: 10-8-6-5-4-3-2-1
fn default_points() -> Vec<f64> {
    vec![10.0, 8.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]
}

/// Place-to-points lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PointTable {
    points: Vec<f64>,
}

impl Default for PointTable {
    fn default() -> Self {
        Self::ncaa()
    }
}

impl PointTable {
    pub fn ncaa() -> Self {
        Self {
            points: default_points(),
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            points: config.points.clone(),
        }
    }

    /// Points for a 1-based place; zero past the table.
    pub fn points_for(&self, place: u32) -> f64 {
        if place == 0 {
            return 0.0;
        }
        self.points
            .get(place as usize - 1)
            .copied()
            .unwrap_or(0.0)
    }

    /// Share for each of `tied` competitors sharing `place`: the points for
    /// every slot the block occupies, split evenly.
    pub fn tie_share(&self, place: u32, tied: u32) -> f64 {
        if tied == 0 {
            return 0.0;
        }
        let total: f64 = (place..place + tied).map(|p| self.points_for(p)).sum();
        total / tied as f64
    }
}
