use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use docent_types::ChatTurn;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::Project;
use crate::trait_client::PersistenceClient;

/// Process-local backend for development and tests
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    projects: RwLock<HashMap<String, Project>>,
    turns: RwLock<HashMap<String, Vec<ChatTurn>>>,
    fail_writes: AtomicBool,
    write_calls: AtomicUsize,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_project(&self, project: Project) {
        self.projects.write().await.insert(project.id.clone(), project);
    }

    /// Make every subsequent `create_turns` fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `create_turns` calls, successful or not
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// All stored turns of a project in insertion order, deleted ones included
    pub async fn turns(&self, project_id: &str) -> Vec<ChatTurn> {
        self.turns
            .read()
            .await
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
        Ok(self.projects.read().await.get(project_id).cloned())
    }

    async fn create_turns(&self, project_id: &str, turns: Vec<ChatTurn>) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistError::Connection("write rejected".to_string()));
        }

        let mut all = self.turns.write().await;
        let stored = all.entry(project_id.to_string()).or_default();
        if let Some(dup) = turns.iter().find(|t| stored.iter().any(|s| s.id == t.id)) {
            return Err(PersistError::DuplicateTurn(dup.id.clone()));
        }
        stored.extend(turns);
        Ok(())
    }

    async fn find_recent_turns(&self, project_id: &str, limit: usize) -> Result<Vec<ChatTurn>> {
        let all = self.turns.read().await;
        let Some(stored) = all.get(project_id) else {
            return Ok(Vec::new());
        };

        let mut visible: Vec<ChatTurn> = stored.iter().filter(|t| !t.is_deleted()).cloned().collect();
        // Stable sort keeps insertion order for equal timestamps
        visible.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        visible.reverse();
        visible.truncate(limit);
        Ok(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn turns_at(n: usize) -> Vec<ChatTurn> {
        let base = Utc::now();
        (0..n)
            .map(|i| {
                ChatTurn::user(format!("t{}", i), format!("message {}", i))
                    .with_created_at(base + Duration::seconds(i as i64))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_recent_turns_are_newest_first_and_bounded() {
        let client = InMemoryPersistenceClient::new();
        client.create_turns("p", turns_at(5)).await.unwrap();

        let recent = client.find_recent_turns("p", 3).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t4", "t3", "t2"]);
    }

    #[tokio::test]
    async fn test_deleted_turns_are_excluded() {
        let client = InMemoryPersistenceClient::new();
        let mut turns = turns_at(3);
        turns[2].soft_delete(Utc::now());
        client.create_turns("p", turns).await.unwrap();

        let recent = client.find_recent_turns("p", 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "t1");
        assert_eq!(client.turns("p").await.len(), 3);
    }

    #[tokio::test]
    async fn test_projects_are_isolated() {
        let client = InMemoryPersistenceClient::new();
        client.create_turns("a", turns_at(2)).await.unwrap();
        assert!(client.find_recent_turns("b", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let client = InMemoryPersistenceClient::new();
        client.fail_writes(true);
        assert!(client.create_turns("p", turns_at(1)).await.is_err());
        assert_eq!(client.write_calls(), 1);
        assert!(client.turns("p").await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let client = InMemoryPersistenceClient::new();
        client.create_turns("p", turns_at(1)).await.unwrap();
        let err = client.create_turns("p", turns_at(1)).await.unwrap_err();
        assert!(matches!(err, PersistError::DuplicateTurn(id) if id == "t0"));
    }

    #[tokio::test]
    async fn test_get_project() {
        let client = InMemoryPersistenceClient::new();
        client.insert_project(Project::new("p", "alice", "Docs")).await;
        assert_eq!(client.get_project("p").await.unwrap().unwrap().owner_id, "alice");
        assert!(client.get_project("missing").await.unwrap().is_none());
    }
}
