use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::Loggable;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Holiday {
    pub id: Uuid,
    #[schema(value_type = String, example = "2025-12-25")]
    pub date: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct HolidayCreateRequest {
    #[schema(value_type = String, example = "2025-12-25")]
    pub date: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HolidayRequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl HolidayRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidayRequestStatus::Pending => "pending",
            HolidayRequestStatus::Approved => "approved",
            HolidayRequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "pending" => Ok(HolidayRequestStatus::Pending),
            "approved" => Ok(HolidayRequestStatus::Approved),
            "rejected" => Ok(HolidayRequestStatus::Rejected),
            other => Err(AppError::internal(format!("unknown request status `{other}` in storage"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HolidayRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    #[schema(value_type = String, example = "2025-08-15")]
    pub date: NaiveDate,
    pub message: String,
    pub status: HolidayRequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbHolidayRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub date: NaiveDate,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbHolidayRequest> for HolidayRequest {
    type Error = AppError;

    fn try_from(value: DbHolidayRequest) -> Result<Self, Self::Error> {
        Ok(HolidayRequest {
            id: value.id,
            employee_id: value.employee_id,
            employee_name: value.employee_name,
            date: value.date,
            message: value.message,
            status: HolidayRequestStatus::parse(&value.status)?,
            created_at: value.created_at,
        })
    }
}

impl Loggable for HolidayRequest {
    fn entity_type() -> &'static str {
        "holiday_request"
    }

    fn subject_id(&self) -> Uuid {
        self.id
    }
}

pub const HOLIDAY_REQUEST_COLUMNS: &str = "id, employee_id, employee_name, date, message, status, created_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct HolidayRequestCreate {
    #[schema(value_type = String, example = "2025-08-15")]
    pub date: NaiveDate,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct HolidayRequestDecision {
    pub status: HolidayRequestStatus,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct HolidayRequestQuery {
    pub employee_id: Option<Uuid>,
}
