use chrono::{DateTime, Utc};
use std::time::Instant;

use crate::config::RangeConfig;
use crate::fetch::{HistoryLoad, LoadFailure};
use crate::history::{Category, History};
use crate::scoring::calculator::{MAX_GUTS_CORRECT, MAX_INDIVIDUAL_CORRECT, MAX_RELAY_CORRECT};
use crate::scoring::{evaluate, ScoreReport, ScoringConfig, TeamInput};
use crate::sheets::RangeCache;
use crate::tui::theme::ThemeColors;

const FLASH_SECS: u64 = 3;

/// One editable input on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Correct(usize),
    Guess(usize),
    Guts,
    RelayCorrect(usize),
    RelayUnderTime(usize),
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::Correct(0),
        Field::Correct(1),
        Field::Correct(2),
        Field::Guess(0),
        Field::Guess(1),
        Field::Guess(2),
        Field::Guts,
        Field::RelayCorrect(0),
        Field::RelayCorrect(1),
        Field::RelayCorrect(2),
        Field::RelayCorrect(3),
        Field::RelayUnderTime(0),
        Field::RelayUnderTime(1),
        Field::RelayUnderTime(2),
        Field::RelayUnderTime(3),
    ];

    pub fn label(&self) -> String {
        match self {
            Field::Correct(i) => format!("Contestant {} correct", i + 1),
            Field::Guess(i) => format!("Contestant {} estimathon", i + 1),
            Field::Guts => "Guts correct".to_string(),
            Field::RelayCorrect(i) => format!("Relay {} correct", i + 1),
            Field::RelayUnderTime(i) => format!("Relay {} before 6 min", i + 1),
        }
    }

    /// Section heading shown above the first field of each event
    pub fn section(&self) -> &'static str {
        match self {
            Field::Correct(_) | Field::Guess(_) => "Individual",
            Field::Guts => "Guts",
            Field::RelayCorrect(_) | Field::RelayUnderTime(_) => "Relay",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    EditGuess,
    Help,
}

pub struct App {
    pub input: TeamInput,
    pub report: ScoreReport,
    pub history: History,
    pub failures: Vec<LoadFailure>,
    pub scoring: ScoringConfig,
    pub sheet_id: String,
    pub ranges: RangeConfig,
    pub cache: RangeCache,
    pub theme: ThemeColors,
    pub selected: usize,
    pub input_mode: InputMode,
    pub edit_buffer: String,
    pub flash_message: Option<(String, Instant)>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub needs_refresh: bool,
    pub force_refresh: bool,
    pub should_quit: bool,
    pub is_loading: bool,
    pub spinner_frame: usize,
}

impl App {
    /// Create an App with empty history in loading state.
    /// Used for launching the TUI before data arrives.
    pub fn new_loading(
        scoring: ScoringConfig,
        sheet_id: String,
        ranges: RangeConfig,
        cache: RangeCache,
        theme: ThemeColors,
    ) -> Self {
        let input = TeamInput::default();
        let history = History::default();
        let report = evaluate(&input, &history, &scoring);

        Self {
            input,
            report,
            history,
            failures: Vec::new(),
            scoring,
            sheet_id,
            ranges,
            cache,
            theme,
            selected: 0,
            input_mode: InputMode::Normal,
            edit_buffer: String::new(),
            flash_message: None,
            loaded_at: None,
            needs_refresh: false,
            force_refresh: false,
            should_quit: false,
            is_loading: true,
            spinner_frame: 0,
        }
    }

    /// Re-run the calculation. Called after every input or history change.
    pub fn recompute(&mut self) {
        self.report = evaluate(&self.input, &self.history, &self.scoring);
    }

    /// Apply a finished load. Categories that failed keep their previous
    /// list; the failures still show in the banner.
    pub fn update_history(&mut self, load: HistoryLoad) {
        if load.is_complete() {
            self.show_flash("Refreshed historical scores".to_string());
        } else {
            self.show_flash(format!(
                "Error: {} of {} score lists failed to load",
                load.failures.len(),
                Category::ALL.len()
            ));
        }

        let mut history = load.history;
        for failure in &load.failures {
            history.set(failure.category, self.history.get(failure.category).clone());
        }
        self.history = history;
        self.failures = load.failures;
        self.loaded_at = Some(load.loaded_at);
        self.recompute();
    }

    pub fn selected_field(&self) -> Field {
        Field::ALL[self.selected]
    }

    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % Field::ALL.len();
    }

    pub fn previous_field(&mut self) {
        self.selected = if self.selected == 0 {
            Field::ALL.len() - 1
        } else {
            self.selected - 1
        };
    }

    fn adjust(&mut self, delta: i64) {
        let clamp = |value: u32, max: u32| (value as i64 + delta).clamp(0, max as i64) as u32;

        match self.selected_field() {
            Field::Correct(i) => {
                let c = &mut self.input.contestants[i];
                c.correct = clamp(c.correct, MAX_INDIVIDUAL_CORRECT);
            }
            Field::Guts => {
                self.input.guts_correct = clamp(self.input.guts_correct, MAX_GUTS_CORRECT);
            }
            Field::RelayCorrect(i) => {
                let leg = &mut self.input.relay[i];
                leg.correct = clamp(leg.correct, MAX_RELAY_CORRECT);
            }
            Field::RelayUnderTime(i) => {
                self.input.relay[i].under_time = delta > 0;
            }
            Field::Guess(_) => return,
        }
        self.recompute();
    }

    pub fn increment(&mut self) {
        self.adjust(1);
    }

    pub fn decrement(&mut self) {
        self.adjust(-1);
    }

    /// Flip a relay time flag, or start editing a guess
    pub fn toggle(&mut self) {
        match self.selected_field() {
            Field::RelayUnderTime(i) => {
                self.input.relay[i].under_time = !self.input.relay[i].under_time;
                self.recompute();
            }
            Field::Guess(_) => self.start_edit(),
            _ => {}
        }
    }

    pub fn start_edit(&mut self) {
        if let Field::Guess(i) = self.selected_field() {
            let current = self.input.contestants[i].estimathon_guess;
            self.edit_buffer = if current == 0.0 {
                String::new()
            } else {
                current.to_string()
            };
            self.input_mode = InputMode::EditGuess;
        }
    }

    pub fn confirm_edit(&mut self) {
        let Field::Guess(i) = self.selected_field() else {
            self.input_mode = InputMode::Normal;
            return;
        };

        let text = self.edit_buffer.trim();
        let parsed = if text.is_empty() {
            Ok(0.0)
        } else {
            text.parse::<f64>()
        };

        match parsed {
            Ok(value) if value.is_finite() => {
                self.input.contestants[i].estimathon_guess = value;
                self.input_mode = InputMode::Normal;
                self.edit_buffer.clear();
                self.recompute();
            }
            _ => {
                self.show_flash(format!("Error: '{}' is not a number", text));
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit_buffer.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Reset all inputs to zero
    pub fn reset_inputs(&mut self) {
        self.input = TeamInput::default();
        self.recompute();
        self.show_flash("Inputs cleared".to_string());
    }

    /// Display text for a field's current value
    pub fn field_value(&self, field: Field) -> String {
        match field {
            Field::Correct(i) => format!(
                "{} / {}",
                self.input.contestants[i].correct, MAX_INDIVIDUAL_CORRECT
            ),
            Field::Guess(i) => {
                let guess = self.input.contestants[i].estimathon_guess;
                if guess == 0.0 {
                    "-".to_string()
                } else {
                    guess.to_string()
                }
            }
            Field::Guts => format!("{} / {}", self.input.guts_correct, MAX_GUTS_CORRECT),
            Field::RelayCorrect(i) => {
                format!("{} / {}", self.input.relay[i].correct, MAX_RELAY_CORRECT)
            }
            Field::RelayUnderTime(i) => {
                if self.input.relay[i].under_time {
                    "[x]".to_string()
                } else {
                    "[ ]".to_string()
                }
            }
        }
    }

    pub fn show_flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now()));
    }

    pub fn update_flash(&mut self) {
        if let Some((_, shown_at)) = &self.flash_message {
            if shown_at.elapsed().as_secs() >= FLASH_SECS {
                self.flash_message = None;
            }
        }
    }

    pub fn advance_spinner(&mut self) {
        if self.is_loading {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ScoreList;
    use crate::sheets::FetchError;
    use chrono::Utc;

    fn test_app() -> App {
        App::new_loading(
            ScoringConfig::default(),
            "sheet".to_string(),
            RangeConfig::default(),
            RangeCache::disabled(),
            ThemeColors::dark(),
        )
    }

    fn select(app: &mut App, field: Field) {
        app.selected = Field::ALL.iter().position(|f| *f == field).unwrap();
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = test_app();
        app.previous_field();
        assert_eq!(app.selected_field(), Field::RelayUnderTime(3));
        app.next_field();
        assert_eq!(app.selected_field(), Field::Correct(0));
    }

    #[test]
    fn test_counts_clamp_to_range() {
        let mut app = test_app();
        select(&mut app, Field::RelayCorrect(1));
        for _ in 0..5 {
            app.increment();
        }
        assert_eq!(app.input.relay[1].correct, 3);

        for _ in 0..5 {
            app.decrement();
        }
        assert_eq!(app.input.relay[1].correct, 0);

        select(&mut app, Field::Guts);
        for _ in 0..30 {
            app.increment();
        }
        assert_eq!(app.input.guts_correct, 21);
    }

    #[test]
    fn test_change_recomputes_report() {
        let mut app = test_app();
        select(&mut app, Field::Guts);
        app.increment();
        app.increment();
        assert_eq!(app.report.guts.raw, 2.0);
        assert_eq!(app.report.guts.normalized, 100.0);
    }

    #[test]
    fn test_toggle_relay_flag() {
        let mut app = test_app();
        app.input.relay[0].correct = 3;
        select(&mut app, Field::RelayUnderTime(0));
        app.toggle();
        assert!(app.input.relay[0].under_time);
        assert_eq!(app.report.relay.raw, 8.0);
        app.toggle();
        assert_eq!(app.report.relay.raw, 6.0);
    }

    #[test]
    fn test_edit_guess() {
        let mut app = test_app();
        select(&mut app, Field::Guess(1));
        app.start_edit();
        assert_eq!(app.input_mode, InputMode::EditGuess);

        app.edit_buffer = "676700".to_string();
        app.confirm_edit();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.input.contestants[1].estimathon_guess, 676700.0);
        assert_eq!(app.report.contestants[1].estimathon, 0.5);
    }

    #[test]
    fn test_edit_guess_rejects_garbage() {
        let mut app = test_app();
        select(&mut app, Field::Guess(0));
        app.start_edit();
        app.edit_buffer = "lots".to_string();
        app.confirm_edit();

        assert_eq!(app.input_mode, InputMode::EditGuess);
        assert_eq!(app.input.contestants[0].estimathon_guess, 0.0);
        assert!(app.flash_message.is_some());
    }

    #[test]
    fn test_update_history_reranks() {
        let mut app = test_app();
        select(&mut app, Field::Guts);
        app.increment();

        let history = History {
            guts: ScoreList::from_unsorted(vec![4.0]),
            ..History::default()
        };
        app.update_history(HistoryLoad {
            history,
            failures: Vec::new(),
            loaded_at: Utc::now(),
        });

        assert_eq!(app.report.guts.normalized, 25.0);
        assert!(app.loaded_at.is_some());
    }

    fn loaded(history: History, failures: Vec<LoadFailure>) -> HistoryLoad {
        HistoryLoad {
            history,
            failures,
            loaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_failed_refresh_keeps_previous_history() {
        let mut app = test_app();
        app.input.guts_correct = 10;
        app.input.contestants[0].correct = 13;
        app.update_history(loaded(
            History {
                individual: ScoreList::from_unsorted(vec![15.0, 14.0, 12.0]),
                guts: ScoreList::from_unsorted(vec![20.0]),
                overall: ScoreList::from_unsorted(vec![280.0, 40.0]),
                ..History::default()
            },
            Vec::new(),
        ));
        let before = app.report.clone();
        assert_eq!(before.guts.normalized, 50.0);
        assert_eq!(before.contestants[0].rank, 3);

        let failures = Category::ALL
            .iter()
            .map(|category| LoadFailure {
                category: *category,
                range: "Team Overall!C2:C22".to_string(),
                error: FetchError::Network("connection reset".to_string()).into(),
            })
            .collect();
        app.update_history(loaded(History::default(), failures));

        assert_eq!(app.report, before);
        assert_eq!(app.history.guts.as_slice(), &[20.0]);
        assert_eq!(app.failures.len(), Category::ALL.len());
        let (msg, _) = app.flash_message.as_ref().unwrap();
        assert_eq!(msg, "Error: 5 of 5 score lists failed to load");
    }

    #[test]
    fn test_partial_refresh_replaces_only_loaded_lists() {
        let mut app = test_app();
        app.update_history(loaded(
            History {
                guts: ScoreList::from_unsorted(vec![20.0]),
                relay: ScoreList::from_unsorted(vec![30.0]),
                ..History::default()
            },
            Vec::new(),
        ));

        let failure = LoadFailure {
            category: Category::Relay,
            range: "Team Overall!D2:D22".to_string(),
            error: FetchError::RateLimited.into(),
        };
        app.update_history(loaded(
            History {
                guts: ScoreList::from_unsorted(vec![21.0]),
                ..History::default()
            },
            vec![failure],
        ));

        assert_eq!(app.history.guts.as_slice(), &[21.0]);
        assert_eq!(app.history.relay.as_slice(), &[30.0]);
    }

    #[test]
    fn test_field_values() {
        let mut app = test_app();
        app.input.contestants[2].correct = 17;
        assert_eq!(app.field_value(Field::Correct(2)), "17 / 20");
        assert_eq!(app.field_value(Field::Guess(0)), "-");
        assert_eq!(app.field_value(Field::RelayUnderTime(0)), "[ ]");
    }
}
