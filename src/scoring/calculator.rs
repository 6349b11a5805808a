use serde::{Deserialize, Serialize};

use super::config::ScoringConfig;
use super::engine::{calc_estimathon, normalize, overall, rank, relay_score, team_composite, RelayAttempt};
use crate::history::History;

pub const MAX_INDIVIDUAL_CORRECT: u32 = 20;
pub const MAX_GUTS_CORRECT: u32 = 21;
pub const MAX_RELAY_CORRECT: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContestantInput {
    pub correct: u32,
    pub estimathon_guess: f64,
}

/// Hypothetical results for one team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamInput {
    pub contestants: [ContestantInput; 3],
    pub guts_correct: u32,
    pub relay: [RelayAttempt; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContestantResult {
    pub estimathon: f64,
    /// Correct answers plus estimathon contribution
    pub adjusted: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResult {
    pub raw: f64,
    pub normalized: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub contestants: Vec<ContestantResult>,
    pub individual: EventResult,
    pub guts: EventResult,
    pub relay: EventResult,
    pub overall: f64,
    pub overall_rank: usize,
}

/// Score a team against historical results.
pub fn evaluate(input: &TeamInput, history: &History, config: &ScoringConfig) -> ScoreReport {
    let contestants: Vec<ContestantResult> = input
        .contestants
        .iter()
        .map(|c| {
            let estimathon = calc_estimathon(c.estimathon_guess, config.estimathon_answer);
            let adjusted = c.correct as f64 + estimathon;
            ContestantResult {
                estimathon,
                adjusted,
                rank: rank(history.individual.as_slice(), adjusted),
            }
        })
        .collect();

    let adjusted = [
        contestants[0].adjusted,
        contestants[1].adjusted,
        contestants[2].adjusted,
    ];
    let individual_raw = team_composite(adjusted, config.individual_weights);
    let individual = EventResult {
        raw: individual_raw,
        normalized: normalize(individual_raw, history.team_individual.as_slice()),
    };

    let guts_raw = input.guts_correct as f64;
    let guts = EventResult {
        raw: guts_raw,
        normalized: normalize(guts_raw, history.guts.as_slice()),
    };

    let relay_raw = relay_score(&input.relay, &config.relay_rules()) as f64;
    let relay = EventResult {
        raw: relay_raw,
        normalized: normalize(relay_raw, history.relay.as_slice()),
    };

    let total = overall(individual.normalized, guts.normalized, relay.normalized);

    ScoreReport {
        contestants,
        individual,
        guts,
        relay,
        overall: total,
        overall_rank: rank(history.overall.as_slice(), total),
    }
}
