mod schema;

pub use schema::{Config, RangeConfig, ThemeSetting};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::history::Category;

/// Environment variable that overrides `spreadsheet_id`
pub const ENV_SPREADSHEET_VAR: &str = "CMWMC_SPREADSHEET_ID";

/// Get the config directory path (~/.config/cmwmc-calc/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("cmwmc-calc"))
}

/// Get the default config file path (~/.config/cmwmc-calc/config.yaml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path
///   and falls back to built-in defaults when that file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found at {}", p.display());
            }
            p
        }
        None => match get_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!("Failed to parse config: invalid YAML in {}", config_path.display())
    })?;

    Ok(config)
}

/// Spreadsheet id from the environment, falling back to the config file
pub fn resolve_spreadsheet_id(config: &Config) -> Option<String> {
    std::env::var(ENV_SPREADSHEET_VAR)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| config.spreadsheet_id.clone())
}

/// Warn about categories that read the same range
pub fn validate_ranges(ranges: &RangeConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    for (i, a) in Category::ALL.iter().enumerate() {
        for b in &Category::ALL[i + 1..] {
            if ranges.get(*a) == ranges.get(*b) {
                warnings.push(format!(
                    "ranges: {} and {} both read '{}'",
                    a,
                    b,
                    ranges.get(*a)
                ));
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cache_ttl().unwrap(), Duration::from_secs(600));
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
spreadsheet_id: "1AbC"
cache_ttl: "1h"
theme: light
ranges:
  guts: "Team Overall!E2:E22"
scoring:
  relay_time_bonus: 3
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.spreadsheet_id.as_deref(), Some("1AbC"));
        assert_eq!(config.cache_ttl().unwrap(), Duration::from_secs(3600));
        assert_eq!(config.theme, ThemeSetting::Light);
        assert_eq!(config.ranges.guts, "Team Overall!E2:E22");
        assert_eq!(config.ranges.relay, "Team Overall!D2:D22");
        assert_eq!(config.scoring.relay_time_bonus, 3);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(serde_saphyr::from_str::<Config>("sheet: abc\n").is_err());
    }

    #[test]
    fn test_bad_ttl() {
        let config = Config {
            cache_ttl: "soon".to_string(),
            ..Config::default()
        };
        let err = config.cache_ttl().unwrap_err();
        assert!(err.to_string().contains("cache_ttl"));
    }

    #[test]
    fn test_default_ranges_warn_on_shared_column() {
        let warnings = validate_ranges(&RangeConfig::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Team Individual and Guts"));
    }

    #[test]
    fn test_is_default_ranges() {
        assert!(RangeConfig::default().is_default());
        let config: Config = serde_saphyr::from_str("ranges:\n  relay: \"Relay!A1:A9\"\n").unwrap();
        assert!(!config.ranges.is_default());

        // Spelling out the defaults still counts as default
        let config: Config =
            serde_saphyr::from_str("ranges:\n  guts: \"Team Overall!C2:C22\"\n").unwrap();
        assert!(config.ranges.is_default());
    }

    #[test]
    fn test_distinct_ranges_no_warning() {
        let ranges = RangeConfig {
            guts: "Team Overall!E2:E22".to_string(),
            ..RangeConfig::default()
        };
        assert!(validate_ranges(&ranges).is_empty());
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let path = env::temp_dir().join("cmwmc_calc_test_no_such_config.yaml");
        let _ = std::fs::remove_file(&path);
        assert!(load_config(Some(path)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = env::temp_dir().join("cmwmc_calc_test_config.yaml");
        std::fs::write(&path, "spreadsheet_id: xyz\ncache_ttl: 30s\n").unwrap();

        let config = load_config(Some(path.clone())).unwrap();
        assert_eq!(config.spreadsheet_id.as_deref(), Some("xyz"));
        assert_eq!(config.cache_ttl().unwrap(), Duration::from_secs(30));

        let _ = std::fs::remove_file(&path);
    }
}
