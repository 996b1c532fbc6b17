use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::MongoTurn;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoTurnRepository {
    collection: Collection<MongoTurn>,
}

impl MongoTurnRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("chat_turns");
        Self { collection }
    }

    /// Insert all turns in one round trip
    pub async fn insert_turns(&self, turns: Vec<MongoTurn>) -> Result<()> {
        if turns.is_empty() {
            return Ok(());
        }
        self.collection.insert_many(turns).await?;
        Ok(())
    }

    /// Newest first, soft-deleted turns skipped
    pub async fn find_recent(&self, project_id: &str, limit: i64) -> Result<Vec<MongoTurn>> {
        let filter = doc! {
            "project_id": project_id,
            "deleted": { "$ne": true },
            "deleted_at": null,
        };
        let turns = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(turns)
    }
}
