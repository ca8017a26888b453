use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    AdminMessage,
    WorkCheck,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::AdminMessage => "admin_message",
            NotificationKind::WorkCheck => "work_check",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "admin_message" => Ok(NotificationKind::AdminMessage),
            "work_check" => Ok(NotificationKind::WorkCheck),
            other => Err(AppError::internal(format!("unknown notification type `{other}` in storage"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub to_employee_id: Uuid,
    pub from: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbNotification {
    pub id: Uuid,
    pub to_employee_id: Uuid,
    pub sender: String,
    pub message: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbNotification> for Notification {
    type Error = AppError;

    fn try_from(value: DbNotification) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: value.id,
            to_employee_id: value.to_employee_id,
            from: value.sender,
            message: value.message,
            kind: NotificationKind::parse(&value.kind)?,
            read: value.read,
            created_at: value.created_at,
        })
    }
}

pub const NOTIFICATION_COLUMNS: &str = "id, to_employee_id, sender, message, type, read, created_at";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationCreateRequest {
    pub to_employee_id: Uuid,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub employee_id: Option<Uuid>,
}
