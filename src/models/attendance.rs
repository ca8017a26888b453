use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceKind {
    Checkin,
    Checkout,
}

impl AttendanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceKind::Checkin => "checkin",
            AttendanceKind::Checkout => "checkout",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "checkin" => Ok(AttendanceKind::Checkin),
            "checkout" => Ok(AttendanceKind::Checkout),
            other => Err(AppError::internal(format!("unknown attendance type `{other}` in storage"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    #[serde(rename = "type")]
    pub kind: AttendanceKind,
    pub timestamp: DateTime<Utc>,
    /// Opaque client-supplied reference, stored verbatim.
    pub image_data: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAttendance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub image_data: Option<String>,
}

impl TryFrom<DbAttendance> for Attendance {
    type Error = AppError;

    fn try_from(value: DbAttendance) -> Result<Self, Self::Error> {
        Ok(Attendance {
            id: value.id,
            employee_id: value.employee_id,
            employee_name: value.employee_name,
            kind: AttendanceKind::parse(&value.kind)?,
            timestamp: value.timestamp,
            image_data: value.image_data,
        })
    }
}

pub const ATTENDANCE_COLUMNS: &str = "id, employee_id, employee_name, type, timestamp, image_data";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceCreateRequest {
    #[serde(rename = "type")]
    pub kind: AttendanceKind,
    pub image_data: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePage {
    pub attendance: Vec<Attendance>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}
