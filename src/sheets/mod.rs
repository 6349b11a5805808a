pub mod cache;
pub mod client;
pub mod snapshot;
pub mod types;

pub use cache::{cache_key, clear_cache, get_cache_path, RangeCache};
pub use client::SheetsClient;
pub use snapshot::{load_snapshot, save_snapshot, Snapshot, SnapshotSource};
pub use types::{DataSource, FetchError, Rows};

/// The data source picked at startup: live API or offline snapshot
#[derive(Debug, Clone)]
pub enum Source {
    Sheets(SheetsClient),
    Snapshot(SnapshotSource),
}

impl Source {
    /// Whether reads from this source are worth caching
    pub fn is_remote(&self) -> bool {
        matches!(self, Source::Sheets(_))
    }
}

impl DataSource for Source {
    async fn fetch_column(&self, sheet_id: &str, range: &str) -> Result<Rows, FetchError> {
        match self {
            Source::Sheets(client) => client.fetch_column(sheet_id, range).await,
            Source::Snapshot(snapshot) => snapshot.fetch_column(sheet_id, range).await,
        }
    }
}
