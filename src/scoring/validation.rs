use super::calculator::{TeamInput, MAX_GUTS_CORRECT, MAX_INDIVIDUAL_CORRECT, MAX_RELAY_CORRECT};
use super::config::ScoringConfig;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if !config.estimathon_answer.is_finite() || config.estimathon_answer <= 0.0 {
        errors.push(format!(
            "scoring.estimathon_answer: must be a positive number, got {}",
            config.estimathon_answer
        ));
    }

    if config.relay_points.windows(2).any(|w| w[1] < w[0]) {
        errors.push(format!(
            "scoring.relay_points: must be non-decreasing, got {:?}",
            config.relay_points
        ));
    }

    for (i, weight) in config.individual_weights.iter().enumerate() {
        if !weight.is_finite() || *weight < 0.0 {
            errors.push(format!(
                "scoring.individual_weights[{}]: must be non-negative, got {}",
                i, weight
            ));
        }
    }
    if config.individual_weights.iter().sum::<f64>() <= 0.0 {
        errors.push("scoring.individual_weights: sum must be positive".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a team's inputs against the ranges the competition allows.
pub fn validate_input(input: &TeamInput) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for (i, c) in input.contestants.iter().enumerate() {
        if c.correct > MAX_INDIVIDUAL_CORRECT {
            errors.push(format!(
                "contestant {}: correct answers must be 0-{}, got {}",
                i + 1,
                MAX_INDIVIDUAL_CORRECT,
                c.correct
            ));
        }
        if !c.estimathon_guess.is_finite() {
            errors.push(format!("contestant {}: estimathon guess must be a number", i + 1));
        }
    }

    if input.guts_correct > MAX_GUTS_CORRECT {
        errors.push(format!(
            "guts: correct answers must be 0-{}, got {}",
            MAX_GUTS_CORRECT, input.guts_correct
        ));
    }

    for (i, leg) in input.relay.iter().enumerate() {
        if leg.correct > MAX_RELAY_CORRECT {
            errors.push(format!(
                "relay {}: correct answers must be 0-{}, got {}",
                i + 1,
                MAX_RELAY_CORRECT,
                leg.correct
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
