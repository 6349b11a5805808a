mod types;

pub use types::{Category, History, ScoreList};
