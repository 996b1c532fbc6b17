mod client;
mod models;
mod repositories;

pub use client::MongoPersistenceClient;
pub use models::{MongoProject, MongoTurn};
