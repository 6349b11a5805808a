pub mod calculator;
pub mod config;
pub mod engine;
pub mod validation;

pub use calculator::{evaluate, ContestantInput, ContestantResult, EventResult, ScoreReport, TeamInput};
pub use config::ScoringConfig;
pub use engine::{
    calc_estimathon, clean, normalize, overall, rank, relay_score, team_composite, RelayAttempt,
    RelayRules, ScoreError,
};
pub use validation::{validate_input, validate_scoring};
