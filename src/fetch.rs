use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::RangeConfig;
use crate::history::{Category, History, ScoreList};
use crate::scoring::{clean, ScoreError};
use crate::sheets::{cache_key, DataSource, FetchError, RangeCache, Rows, Snapshot};

/// Why one category could not be loaded
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ScoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub category: Category,
    pub range: String,
    pub error: LoadError,
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.category, self.range, self.error)
    }
}

/// Result of loading every category. Failed categories keep an empty list.
#[derive(Debug, Clone)]
pub struct HistoryLoad {
    pub history: History,
    pub failures: Vec<LoadFailure>,
    pub loaded_at: DateTime<Utc>,
}

impl HistoryLoad {
    pub fn all_failed(&self) -> bool {
        self.failures.len() == Category::ALL.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Categories grouped by the range they read, in category order
fn group_by_range(ranges: &RangeConfig) -> Vec<(String, Vec<Category>)> {
    let mut by_range: Vec<(String, Vec<Category>)> = Vec::new();
    for category in Category::ALL {
        let range = ranges.get(category);
        match by_range.iter_mut().find(|(r, _)| r == range) {
            Some((_, categories)) => categories.push(category),
            None => by_range.push((range.to_string(), vec![category])),
        }
    }
    by_range
}

/// Fetch each configured range through the cache, clean it and sort it.
///
/// Ranges shared by several categories are fetched once. Ranges are fetched
/// concurrently; a failure only affects the categories reading that range.
pub async fn load_history<S: DataSource>(
    source: &S,
    cache: &RangeCache,
    sheet_id: &str,
    ranges: &RangeConfig,
) -> HistoryLoad {
    let by_range = group_by_range(ranges);

    let mut futures = FuturesUnordered::new();
    for (range, _) in &by_range {
        let key = cache_key(sheet_id, range);
        futures.push(async move {
            let result = cache
                .get_or_fetch(&key, || source.fetch_column(sheet_id, range))
                .await;
            (range.as_str(), result)
        });
    }

    let mut results: HashMap<&str, Result<Rows, FetchError>> = HashMap::new();
    while let Some((range, result)) = futures.next().await {
        match &result {
            Ok(rows) => tracing::debug!("Fetched {} rows from {}", rows.len(), range),
            Err(e) => tracing::warn!("Fetch failed for {}: {}", range, e),
        }
        results.insert(range, result);
    }
    drop(futures);

    let mut history = History::default();
    let mut failures = Vec::new();

    for (range, categories) in &by_range {
        let outcome: Result<ScoreList, LoadError> = match results.remove(range.as_str()) {
            Some(Ok(rows)) => clean(&rows)
                .map(ScoreList::from_unsorted)
                .map_err(LoadError::from),
            Some(Err(e)) => Err(LoadError::from(e)),
            None => Err(LoadError::from(FetchError::MissingRange(range.clone()))),
        };

        match outcome {
            Ok(list) => {
                for category in categories {
                    history.set(*category, list.clone());
                }
            }
            Err(error) => {
                for category in categories {
                    failures.push(LoadFailure {
                        category: *category,
                        range: range.clone(),
                        error: error.clone(),
                    });
                }
            }
        }
    }

    // Stable order for display
    failures.sort_by_key(|f| Category::ALL.iter().position(|c| *c == f.category));

    HistoryLoad {
        history,
        failures,
        loaded_at: Utc::now(),
    }
}

/// Read every configured range, raw, for writing an offline snapshot.
///
/// Unlike [`load_history`] this stops at the first failed range.
pub async fn fetch_snapshot<S: DataSource>(
    source: &S,
    cache: &RangeCache,
    sheet_id: &str,
    ranges: &RangeConfig,
) -> Result<Snapshot, LoadFailure> {
    let mut snapshot = Snapshot::new();
    for (range, categories) in group_by_range(ranges) {
        let key = cache_key(sheet_id, &range);
        match cache
            .get_or_fetch(&key, || source.fetch_column(sheet_id, &range))
            .await
        {
            Ok(rows) => {
                snapshot.ranges.insert(range, rows);
            }
            Err(e) => {
                return Err(LoadFailure {
                    category: categories[0],
                    range,
                    error: LoadError::Fetch(e),
                });
            }
        }
    }
    Ok(snapshot)
}
