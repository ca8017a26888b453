use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::Loggable;
use crate::models::progress::ProgressUpdate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(AppError::internal(format!("unknown task priority `{other}` in storage"))),
        }
    }
}

/// Transitions are unrestricted: any caller allowed to set a status may set any value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(AppError::internal(format!("unknown task status `{other}` in storage"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Employee id of the assigner, or `admin:<username>`.
    pub assigned_by: String,
    pub assigned_to: Uuid,
    /// Role of the assignee when the task was created or last reassigned.
    pub role: Option<Uuid>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[schema(format = DateTime, example = "2025-10-10T10:00:00Z")]
    pub due_date: DateTime<Utc>,
    pub progress_updates: Vec<ProgressUpdate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbTask {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub assigned_by: String,
    pub assigned_to: Uuid,
    pub role_id: Option<Uuid>,
    pub priority: String,
    pub status: String,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbTask> for Task {
    type Error = AppError;

    fn try_from(value: DbTask) -> Result<Self, Self::Error> {
        Ok(Task {
            id: value.id,
            title: value.title,
            description: value.description,
            assigned_by: value.assigned_by,
            assigned_to: value.assigned_to,
            role: value.role_id,
            priority: TaskPriority::parse(&value.priority)?,
            status: TaskStatus::parse(&value.status)?,
            due_date: value.due_date,
            progress_updates: Vec::new(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl Loggable for Task {
    fn entity_type() -> &'static str {
        "task"
    }

    fn subject_id(&self) -> Uuid {
        self.id
    }
}

pub const TASK_COLUMNS: &str =
    "id, title, description, assigned_by, assigned_to, role_id, priority, status, due_date, created_at, updated_at";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateRequest {
    #[schema(example = "Prepare quarterly report")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub assigned_to: Uuid,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// RFC 3339 instant or a plain `YYYY-MM-DD` date (midnight UTC).
    #[serde(deserialize_with = "deserialize_due_date")]
    #[schema(value_type = String, example = "2025-10-10")]
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_due_date")]
    #[schema(value_type = Option<String>, example = "2025-11-01")]
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
}

impl TaskUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
            && self.assigned_to.is_none()
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub assigned_to: Option<Uuid>,
}

pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("malformed date `{raw}`")))
}

fn deserialize_optional_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_due_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("malformed date `{raw}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_accepts_plain_dates_and_instants() {
        let plain = parse_due_date("2025-03-04").unwrap();
        assert_eq!(plain.to_rfc3339(), "2025-03-04T00:00:00+00:00");

        let instant = parse_due_date("2025-03-04T10:30:00+02:00").unwrap();
        assert_eq!(instant.to_rfc3339(), "2025-03-04T08:30:00+00:00");

        assert!(parse_due_date("04/03/2025").is_none());
    }

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        let status: TaskStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, TaskStatus::InProgress);
        assert!(serde_json::from_str::<TaskStatus>("\"done\"").is_err());
    }
}
