use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::MongoProject;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoProjectRepository {
    collection: Collection<MongoProject>,
}

impl MongoProjectRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("projects");
        Self { collection }
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Option<MongoProject>> {
        let project = self.collection.find_one(doc! { "_id": project_id }).await?;
        Ok(project)
    }
}
