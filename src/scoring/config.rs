use serde::{Deserialize, Serialize};

use super::engine::{RelayRules, ESTIMATHON_ANSWER, INDIVIDUAL_WEIGHTS, RELAY_POINTS, RELAY_TIME_BONUS};

/// Competition scoring rules.
///
/// Defaults match CMWMC 2025. Every field may be overridden from the
/// `scoring` section of the config file.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   estimathon_answer: 338350
///   relay_points: [0, 1, 3, 6]
///   relay_time_bonus: 2
///   individual_weights: [3, 2, 1]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ScoringConfig {
    /// True value of the estimathon question
    pub estimathon_answer: f64,

    /// Relay points per leg, indexed by correct-answer count (0..=3)
    pub relay_points: [u32; 4],

    /// Bonus for a fully correct leg submitted under the time limit
    pub relay_time_bonus: u32,

    /// Weights for the best, second and third contestant
    pub individual_weights: [f64; 3],
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            estimathon_answer: ESTIMATHON_ANSWER,
            relay_points: RELAY_POINTS,
            relay_time_bonus: RELAY_TIME_BONUS,
            individual_weights: INDIVIDUAL_WEIGHTS,
        }
    }
}

impl ScoringConfig {
    pub fn relay_rules(&self) -> RelayRules {
        RelayRules {
            points: self.relay_points,
            time_bonus: self.relay_time_bonus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();

        assert_eq!(config.estimathon_answer, 338350.0);
        assert_eq!(config.relay_points, [0, 1, 3, 6]);
        assert_eq!(config.relay_time_bonus, 2);
        assert_eq!(config.individual_weights, [3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_scoring_config_parse() {
        let yaml = r#"
estimathon_answer: 1000
relay_time_bonus: 3
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.estimathon_answer, 1000.0);
        assert_eq!(config.relay_time_bonus, 3);
        assert_eq!(config.relay_points, [0, 1, 3, 6]);
        assert_eq!(config.individual_weights, [3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_empty_scoring_config_parse() {
        let config: ScoringConfig = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, ScoringConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "relay_bonus: 2\n";
        assert!(serde_saphyr::from_str::<ScoringConfig>(yaml).is_err());
    }

    #[test]
    fn test_relay_rules_from_config() {
        let config = ScoringConfig {
            relay_points: [0, 2, 4, 8],
            relay_time_bonus: 1,
            ..ScoringConfig::default()
        };
        let rules = config.relay_rules();
        assert_eq!(rules.points, [0, 2, 4, 8]);
        assert_eq!(rules.time_bonus, 1);
    }
}
