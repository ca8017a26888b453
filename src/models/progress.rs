use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::events::Loggable;
use crate::models::task::TaskStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProgressUpdate {
    pub message: String,
    #[schema(format = DateTime, example = "2025-10-01T09:00:00Z")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressCreateRequest {
    #[schema(example = "Drafted the first two sections")]
    pub message: String,
    pub status: Option<TaskStatus>,
}

/// One appended entry, logged against its task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub task_id: Uuid,
    pub seq: i64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: Option<TaskStatus>,
}

impl Loggable for ProgressEntry {
    fn entity_type() -> &'static str {
        "progress"
    }

    fn subject_id(&self) -> Uuid {
        self.task_id
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbFeedRow {
    pub task_id: Uuid,
    pub task_title: String,
    pub assigned_to: Uuid,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressFeedEntry {
    pub task_id: Uuid,
    pub task_title: String,
    pub assigned_to: Uuid,
    pub employee_name: String,
    pub message: String,
    #[schema(format = DateTime, example = "2025-10-01T09:00:00Z")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProgressFeedQuery {
    /// Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    /// Inclusive lower bound.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub until: Option<DateTime<Utc>>,
}
