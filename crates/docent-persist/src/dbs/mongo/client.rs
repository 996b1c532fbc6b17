use async_trait::async_trait;
use docent_types::ChatTurn;
use mongodb::Client;

use crate::dbs::mongo::models::MongoTurn;
use crate::dbs::mongo::repositories::{MongoProjectRepository, MongoTurnRepository};
use crate::error::{PersistError, Result};
use crate::models::Project;
use crate::trait_client::PersistenceClient;

pub struct MongoPersistenceClient {
    project_repo: MongoProjectRepository,
    turn_repo: MongoTurnRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        tracing::info!(database = %database, "Connected to MongoDB");

        Ok(Self {
            project_repo: MongoProjectRepository::new(&client, database),
            turn_repo: MongoTurnRepository::new(&client, database),
        })
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
        let project = self.project_repo.get_project(project_id).await?;
        Ok(project.map(Into::into))
    }

    async fn create_turns(&self, project_id: &str, turns: Vec<ChatTurn>) -> Result<()> {
        let docs = turns
            .into_iter()
            .map(|t| MongoTurn::from_turn(project_id, t))
            .collect();
        self.turn_repo.insert_turns(docs).await
    }

    async fn find_recent_turns(&self, project_id: &str, limit: usize) -> Result<Vec<ChatTurn>> {
        let limit = i64::try_from(limit).map_err(|e| PersistError::Internal(e.to_string()))?;
        let turns = self.turn_repo.find_recent(project_id, limit).await?;
        Ok(turns.into_iter().map(Into::into).collect())
    }
}
