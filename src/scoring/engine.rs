use thiserror::Error;

/// True answer of the CMWMC 2025 estimathon question.
pub const ESTIMATHON_ANSWER: f64 = 338350.0;

/// Relay points keyed by correct-answer count (index = count).
pub const RELAY_POINTS: [u32; 4] = [0, 1, 3, 6];

/// Bonus for a fully correct relay leg submitted under the time limit.
pub const RELAY_TIME_BONUS: u32 = 2;

/// Individual composite weights, best contestant first.
pub const INDIVIDUAL_WEIGHTS: [f64; 3] = [3.0, 2.0, 1.0];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoreError {
    #[error("invalid score format in row {row}: '{value}'")]
    InvalidScoreFormat { row: usize, value: String },
}

/// One relay leg: correct answers (0-3) and whether it beat the time limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RelayAttempt {
    pub correct: u32,
    pub under_time: bool,
}

impl RelayAttempt {
    pub fn new(correct: u32, under_time: bool) -> Self {
        Self { correct, under_time }
    }
}

/// Relay scoring table plus time bonus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelayRules {
    pub points: [u32; 4],
    pub time_bonus: u32,
}

impl Default for RelayRules {
    fn default() -> Self {
        Self {
            points: RELAY_POINTS,
            time_bonus: RELAY_TIME_BONUS,
        }
    }
}

/// Turn raw spreadsheet rows into scores.
///
/// Only rows holding exactly one cell contribute; empty and multi-cell rows
/// are skipped. Order is preserved, sorting is the caller's job.
pub fn clean<R, S>(rows: &[R]) -> Result<Vec<f64>, ScoreError>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut scores = Vec::new();
    for (row_idx, row) in rows.iter().enumerate() {
        let cells = row.as_ref();
        if cells.len() != 1 {
            continue;
        }
        let text = cells[0].as_ref().trim();
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => scores.push(value),
            _ => {
                return Err(ScoreError::InvalidScoreFormat {
                    row: row_idx,
                    value: cells[0].as_ref().to_string(),
                })
            }
        }
    }
    Ok(scores)
}

/// 1-based rank of `score` within a list sorted descending.
///
/// Ties share the better rank. A score below every entry ties for last place
/// (`len`), and an empty list ranks everything 0.
pub fn rank(sorted_desc: &[f64], score: f64) -> usize {
    sorted_desc
        .iter()
        .position(|&s| s <= score)
        .map(|i| i + 1)
        .unwrap_or(sorted_desc.len())
}

/// Estimathon accuracy in [0, 1]: the smaller of `guess/answer` and
/// `answer/guess`. Zero, negative and non-finite guesses score 0.
pub fn calc_estimathon(guess: f64, answer: f64) -> f64 {
    if guess == 0.0 || !guess.is_finite() || answer <= 0.0 {
        return 0.0;
    }
    (guess / answer).min(answer / guess).max(0.0)
}

/// Weighted team composite of three contestant scores.
///
/// Scores are sorted descending before weighting so the first weight always
/// goes to the best contestant. Divides by the sum of weights.
pub fn team_composite(scores: [f64; 3], weights: [f64; 3]) -> f64 {
    let mut sorted = scores;
    sorted.sort_by(|a, b| b.total_cmp(a));

    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return 0.0;
    }

    let weighted: f64 = sorted.iter().zip(weights.iter()).map(|(s, w)| s * w).sum();
    weighted / total_weight
}

/// Rescale `raw` to 0-100 against the highest of `history` and `raw` itself.
pub fn normalize(raw: f64, history: &[f64]) -> f64 {
    let ceiling = history.iter().copied().fold(raw, f64::max);
    if ceiling > 0.0 {
        100.0 * raw / ceiling
    } else {
        0.0
    }
}

/// Total relay points over all legs.
///
/// Counts beyond the table are scored as the top row. The time bonus only
/// applies to legs at the top row.
pub fn relay_score(attempts: &[RelayAttempt], rules: &RelayRules) -> u32 {
    let max_count = rules.points.len() - 1;
    attempts
        .iter()
        .map(|leg| {
            let count = (leg.correct as usize).min(max_count);
            let bonus = if count == max_count && leg.under_time {
                rules.time_bonus
            } else {
                0
            };
            rules.points[count] + bonus
        })
        .sum()
}

/// Overall composite on a 0-300 scale.
pub fn overall(individual: f64, guts: f64, relay: f64) -> f64 {
    individual + guts + relay
}
