use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use docent_types::{ChatTurn, EditRecord, Role, TurnMetadata};
use serde::{Deserialize, Serialize};

use crate::models::Project;

/// MongoDB-specific turn document. Ids are the caller-derived turn ids,
/// not ObjectIds, so the pair written per exchange is addressable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTurn {
    #[serde(rename = "_id")]
    pub id: String,
    pub project_id: String,
    pub role: Role,
    pub content: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub edit_history: Vec<EditRecord>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TurnMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoProject {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl MongoTurn {
    pub fn from_turn(project_id: &str, turn: ChatTurn) -> Self {
        Self {
            id: turn.id,
            project_id: project_id.to_string(),
            role: turn.role,
            content: turn.content,
            created_at: turn.created_at,
            edit_history: turn.edit_history,
            deleted: turn.deleted,
            deleted_at: turn.deleted_at,
            metadata: turn.metadata,
        }
    }
}

impl From<MongoTurn> for ChatTurn {
    fn from(doc: MongoTurn) -> Self {
        Self {
            id: doc.id,
            role: doc.role,
            content: doc.content,
            created_at: doc.created_at,
            edit_history: doc.edit_history,
            deleted: doc.deleted,
            deleted_at: doc.deleted_at,
            metadata: doc.metadata,
        }
    }
}

impl From<MongoProject> for Project {
    fn from(doc: MongoProject) -> Self {
        Self {
            id: doc.id,
            owner_id: doc.owner_id,
            name: doc.name,
            namespace: doc.namespace,
        }
    }
}
