pub mod sqlite;

use crate::app::Result;

pub use sqlite::SqliteChannelStore;

/// Persisted, ordered list of followed channel handles.
///
/// Handles are normalized on the way in and unique case-insensitively.
pub trait ChannelRepository {
    fn list(&self) -> Result<Vec<String>>;

    /// Append a channel. Returns `false` if it was already followed.
    fn add(&self, handle: &str) -> Result<bool>;

    /// Returns `false` if the channel was not followed.
    fn remove(&self, handle: &str) -> Result<bool>;

    fn clear(&self) -> Result<()>;
}
