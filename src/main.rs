use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use cmwmc_calc::config::{self, Config};
use cmwmc_calc::fetch::{self, HistoryLoad, LoadError, LoadFailure};
use cmwmc_calc::scoring::calculator::{MAX_GUTS_CORRECT, MAX_RELAY_CORRECT};
use cmwmc_calc::scoring::{self, ContestantInput, RelayAttempt, TeamInput};
use cmwmc_calc::sheets::{self, FetchError, RangeCache, SheetsClient, SnapshotSource, Source};
use cmwmc_calc::{credentials, output, tui};

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_INVALID_DATA: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive calculator (default if no subcommand)
    Tui,
    /// Score one set of results and print the report
    Calc {
        /// Contestant result as CORRECT or CORRECT:GUESS (up to 3)
        #[arg(long = "contestant", value_name = "CORRECT[:GUESS]", value_parser = parse_contestant)]
        contestants: Vec<ContestantInput>,

        /// Guts round correct answers
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=MAX_GUTS_CORRECT as i64))]
        guts: u32,

        /// Relay leg as CORRECT or CORRECT:fast (up to 4)
        #[arg(long = "relay", value_name = "CORRECT[:fast]", value_parser = parse_relay)]
        relay: Vec<RelayAttempt>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the historical score lists
    History,
    /// Save the configured ranges to a snapshot file for offline use
    Snapshot {
        /// Where to write the snapshot
        out: PathBuf,
    },
    /// Delete the on-disk range cache
    ClearCache,
}

#[derive(Parser, Debug)]
#[command(name = "cmwmc-calc")]
#[command(about = "CMWMC team score calculator", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/cmwmc-calc/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Always fetch fresh data
    #[arg(long, global = true)]
    no_cache: bool,

    /// Read historical scores from a snapshot file instead of the Sheets API
    #[arg(long, global = true, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn parse_count(text: &str, max: u32, what: &str) -> Result<u32, String> {
    let count: u32 = text
        .trim()
        .parse()
        .map_err(|_| format!("{} must be a whole number, got '{}'", what, text))?;
    if count > max {
        return Err(format!("{} must be between 0 and {}, got {}", what, max, count));
    }
    Ok(count)
}

fn parse_contestant(s: &str) -> Result<ContestantInput, String> {
    let (correct, guess) = match s.split_once(':') {
        Some((c, g)) => (c, Some(g)),
        None => (s, None),
    };
    let correct = parse_count(
        correct,
        scoring::calculator::MAX_INDIVIDUAL_CORRECT,
        "correct answers",
    )?;
    let estimathon_guess = match guess {
        Some(g) => g
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("estimathon guess must be a number, got '{}'", g))?,
        None => 0.0,
    };
    Ok(ContestantInput {
        correct,
        estimathon_guess,
    })
}

fn parse_relay(s: &str) -> Result<RelayAttempt, String> {
    let (correct, flag) = match s.split_once(':') {
        Some((c, f)) => (c, Some(f)),
        None => (s, None),
    };
    let correct = parse_count(correct, MAX_RELAY_CORRECT, "relay correct answers")?;
    let under_time = match flag.map(|f| f.trim().to_ascii_lowercase()) {
        None => false,
        Some(f) if f == "fast" => true,
        Some(f) if f == "slow" => false,
        Some(f) => return Err(format!("relay flag must be 'fast' or 'slow', got '{}'", f)),
    };
    Ok(RelayAttempt::new(correct, under_time))
}

/// Assemble a team from the repeated `--contestant` and `--relay` flags.
/// Missing entries count as zero.
fn build_team_input(
    contestants: &[ContestantInput],
    guts: u32,
    relay: &[RelayAttempt],
) -> Result<TeamInput, String> {
    if contestants.len() > 3 {
        return Err(format!("at most 3 contestants, got {}", contestants.len()));
    }
    if relay.len() > 4 {
        return Err(format!("at most 4 relay legs, got {}", relay.len()));
    }

    let mut input = TeamInput {
        guts_correct: guts,
        ..TeamInput::default()
    };
    input.contestants[..contestants.len()].copy_from_slice(contestants);
    input.relay[..relay.len()].copy_from_slice(relay);
    Ok(input)
}

fn exit_code_for(failure: &LoadFailure) -> i32 {
    match &failure.error {
        LoadError::Fetch(FetchError::Unauthorized(_)) => EXIT_AUTH,
        LoadError::Parse(_) => EXIT_INVALID_DATA,
        LoadError::Fetch(_) => EXIT_NETWORK,
    }
}

fn exit_with_errors(heading: &str, errors: &[String], code: i32) -> ! {
    eprintln!("{}", heading);
    for error in errors {
        eprintln!("  - {}", error);
    }
    std::process::exit(code);
}

/// Pick the data source: a snapshot file, or the Sheets API with credentials
/// and spreadsheet id from the environment/config.
fn build_source(cli: &Cli, config: &Config) -> (Source, String) {
    if let Some(path) = &cli.snapshot {
        match SnapshotSource::load(path) {
            Ok(snapshot) => return (Source::Snapshot(snapshot), "snapshot".to_string()),
            Err(e) => {
                eprintln!("Snapshot error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
    }

    let Some(sheet_id) = config::resolve_spreadsheet_id(config) else {
        eprintln!("No spreadsheet configured.");
        eprintln!(
            "Set {} or add to ~/.config/cmwmc-calc/config.yaml:",
            config::ENV_SPREADSHEET_VAR
        );
        eprintln!("  spreadsheet_id: \"<id from the sheet URL>\"");
        std::process::exit(EXIT_CONFIG);
    };

    let Some(auth) = credentials::get_auth_from_env() else {
        eprintln!(
            "No Sheets credentials. Set {} (API key) or {} (OAuth token).",
            credentials::ENV_API_KEY_VAR,
            credentials::ENV_TOKEN_VAR
        );
        std::process::exit(EXIT_AUTH);
    };

    match SheetsClient::new(auth) {
        Ok(client) => (Source::Sheets(client), sheet_id),
        Err(e) => {
            eprintln!("Failed to create Sheets client: {:#}", e);
            std::process::exit(EXIT_NETWORK);
        }
    }
}

/// Load history for the one-shot commands. Partial failures are warnings;
/// nothing loaded at all is fatal.
async fn load_or_exit(
    source: &Source,
    cache: &RangeCache,
    sheet_id: &str,
    config: &Config,
) -> HistoryLoad {
    let start = Instant::now();
    let load = fetch::load_history(source, cache, sheet_id, &config.ranges).await;
    tracing::debug!("Loaded history in {:?}", start.elapsed());

    if !load.failures.is_empty() {
        eprintln!("{}", output::format_failures(&load.failures, false));
    }
    if load.all_failed() {
        eprintln!("No historical scores could be loaded.");
        std::process::exit(exit_code_for(&load.failures[0]));
    }
    load
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut cli = Cli::parse();
    cmwmc_calc::logging::init(cli.verbose);

    let command = cli.command.take().unwrap_or(Commands::Tui);

    if let Commands::ClearCache = command {
        match sheets::clear_cache() {
            Ok(()) => println!("Cache cleared: {}", sheets::get_cache_path().display()),
            Err(e) => {
                eprintln!("Failed to clear cache: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
        std::process::exit(EXIT_SUCCESS);
    }

    let config_path = cli.config.as_ref().map(PathBuf::from);
    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = scoring::validate_scoring(&config.scoring) {
        exit_with_errors("Scoring config errors:", &errors, EXIT_CONFIG);
    }
    // The shipped defaults share a column; only user-set ranges warn
    let user_ranges = !config.ranges.is_default();
    for warning in config::validate_ranges(&config.ranges) {
        if user_ranges {
            tracing::warn!("{}", warning);
        } else {
            tracing::debug!("{}", warning);
        }
    }

    let ttl = match config.cache_ttl() {
        Ok(ttl) => ttl,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate calc input before touching the network
    let calc_input = match &command {
        Commands::Calc {
            contestants,
            guts,
            relay,
            ..
        } => {
            let input = build_team_input(contestants, *guts, relay)
                .unwrap_or_else(|e| exit_with_errors("Invalid input:", &[e], EXIT_CONFIG));
            if let Err(errors) = scoring::validate_input(&input) {
                exit_with_errors("Invalid input:", &errors, EXIT_CONFIG);
            }
            Some(input)
        }
        _ => None,
    };

    let (source, sheet_id) = build_source(&cli, &config);
    let cache = if cli.no_cache || !source.is_remote() {
        RangeCache::disabled()
    } else {
        RangeCache::new(sheets::get_cache_path(), ttl)
    };
    tracing::debug!(?source, cache = cache.is_enabled(), "data source ready");

    let use_colors = output::should_use_colors();

    match command {
        Commands::Tui => {
            let theme = tui::resolve_theme(config.theme);
            let app = tui::App::new_loading(
                config.scoring.clone(),
                sheet_id,
                config.ranges.clone(),
                cache,
                theme,
            );
            if let Err(e) = tui::run_tui(app, source).await {
                eprintln!("TUI error: {:#}", e);
                std::process::exit(EXIT_NETWORK);
            }
        }
        Commands::Calc { json, .. } => {
            let Some(input) = calc_input else {
                std::process::exit(EXIT_CONFIG);
            };
            let load = load_or_exit(&source, &cache, &sheet_id, &config).await;
            let report = scoring::evaluate(&input, &load.history, &config.scoring);

            if json {
                match output::format_report_json(&report) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Failed to encode report: {}", e);
                        std::process::exit(EXIT_INVALID_DATA);
                    }
                }
            } else {
                println!("{}", output::format_report(&report, use_colors));
            }
        }
        Commands::History => {
            let load = load_or_exit(&source, &cache, &sheet_id, &config).await;
            println!("{}", output::format_history(&load.history, use_colors));
        }
        Commands::Snapshot { out } => {
            let snapshot =
                match fetch::fetch_snapshot(&source, &cache, &sheet_id, &config.ranges).await {
                    Ok(s) => s,
                    Err(failure) => {
                        eprintln!("Snapshot failed: {}", failure);
                        std::process::exit(exit_code_for(&failure));
                    }
                };
            if let Err(e) = sheets::save_snapshot(&out, &snapshot) {
                eprintln!("Failed to write snapshot: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
            println!(
                "Saved {} ranges to {}",
                snapshot.ranges.len(),
                out.display()
            );
        }
        Commands::ClearCache => {}
    }

    std::process::exit(EXIT_SUCCESS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_contestant() {
        assert_eq!(
            parse_contestant("14:338350").unwrap(),
            ContestantInput {
                correct: 14,
                estimathon_guess: 338350.0
            }
        );
        assert_eq!(parse_contestant("9").unwrap().estimathon_guess, 0.0);
        assert!(parse_contestant("21").is_err());
        assert!(parse_contestant("5:lots").is_err());
        assert!(parse_contestant("5:inf").is_err());
    }

    #[test]
    fn test_parse_relay() {
        assert_eq!(parse_relay("3:fast").unwrap(), RelayAttempt::new(3, true));
        assert_eq!(parse_relay("2").unwrap(), RelayAttempt::new(2, false));
        assert_eq!(parse_relay("3:slow").unwrap(), RelayAttempt::new(3, false));
        assert!(parse_relay("4").is_err());
        assert!(parse_relay("3:quick").is_err());
    }

    #[test]
    fn test_build_team_input_fills_missing_with_zero() {
        let input = build_team_input(
            &[parse_contestant("10").unwrap()],
            7,
            &[parse_relay("3:fast").unwrap(), parse_relay("1").unwrap()],
        )
        .unwrap();

        assert_eq!(input.contestants[0].correct, 10);
        assert_eq!(input.contestants[2], ContestantInput::default());
        assert_eq!(input.guts_correct, 7);
        assert_eq!(input.relay[0], RelayAttempt::new(3, true));
        assert_eq!(input.relay[3], RelayAttempt::default());
    }

    #[test]
    fn test_build_team_input_rejects_extras() {
        let legs = vec![RelayAttempt::default(); 5];
        assert!(build_team_input(&[], 0, &legs).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let failure = |error| LoadFailure {
            category: cmwmc_calc::history::Category::Guts,
            range: "A1".to_string(),
            error,
        };
        assert_eq!(
            exit_code_for(&failure(LoadError::Fetch(FetchError::Unauthorized("x".into())))),
            EXIT_AUTH
        );
        assert_eq!(
            exit_code_for(&failure(LoadError::Fetch(FetchError::RateLimited))),
            EXIT_NETWORK
        );
        assert_eq!(
            exit_code_for(&failure(LoadError::Parse(
                scoring::ScoreError::InvalidScoreFormat {
                    row: 0,
                    value: "x".into()
                }
            ))),
            EXIT_INVALID_DATA
        );
    }

    #[test]
    fn test_cli_parses_calc() {
        let cli = Cli::try_parse_from([
            "cmwmc-calc",
            "calc",
            "--contestant",
            "12:300000",
            "--contestant",
            "8",
            "--guts",
            "14",
            "--relay",
            "3:fast",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Calc {
                contestants,
                guts,
                relay,
                json,
            }) => {
                assert_eq!(contestants.len(), 2);
                assert_eq!(guts, 14);
                assert_eq!(relay, vec![RelayAttempt::new(3, true)]);
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["cmwmc-calc", "calc", "--guts", "22"]).is_err());
    }
}
