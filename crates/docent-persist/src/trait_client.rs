use async_trait::async_trait;
use docent_types::ChatTurn;

use crate::error::Result;
use crate::models::Project;

/// Trait for database persistence operations
///
/// Implementations provide the narrow surface the chat pipeline needs:
/// an ownership lookup, a multi-row turn insert and a bounded history read.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Get a project by id
    async fn get_project(&self, project_id: &str) -> Result<Option<Project>>;

    /// Insert several turns in one write. Turns are never updated by the
    /// chat pipeline, so there is no read-modify-write here.
    async fn create_turns(&self, project_id: &str, turns: Vec<ChatTurn>) -> Result<()>;

    /// Most recent non-deleted turns, newest first, at most `limit`
    async fn find_recent_turns(&self, project_id: &str, limit: usize) -> Result<Vec<ChatTurn>>;
}
