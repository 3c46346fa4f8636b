pub mod business_db;

use async_trait::async_trait;

use crate::domain::business::BusinessRecord;

pub use business_db::PgBusinessStore;

/// Persistent population of acquired businesses.
#[async_trait]
pub trait BusinessStore: Send + Sync {
    /// Current number of stored businesses.
    async fn count(&self) -> anyhow::Result<i64>;

    /// Websites containing `pattern` as a literal substring, at most `limit`.
    async fn find_website_matches(&self, pattern: &str, limit: i64)
        -> anyhow::Result<Vec<String>>;

    async fn add(&self, records: &[BusinessRecord]) -> anyhow::Result<()>;
}
