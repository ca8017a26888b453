use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::events::Loggable;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastMessage {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    pub urgent: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub recipient_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbBroadcastMessage {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    pub urgent: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub recipient_count: i64,
}

impl From<DbBroadcastMessage> for BroadcastMessage {
    fn from(value: DbBroadcastMessage) -> Self {
        BroadcastMessage {
            id: value.id,
            subject: value.subject,
            body: value.body,
            urgent: value.urgent,
            created_by: value.created_by,
            created_at: value.created_at,
            recipient_count: value.recipient_count,
        }
    }
}

impl Loggable for BroadcastMessage {
    fn entity_type() -> &'static str {
        "broadcast"
    }

    fn subject_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BroadcastRequest {
    #[schema(example = "Office closed Friday")]
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub urgent: bool,
}
