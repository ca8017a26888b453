use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::events::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl Loggable for Ping {
    fn entity_type() -> &'static str {
        "ping"
    }

    fn subject_id(&self) -> Uuid {
        self.employee_id
    }

    fn severity(&self) -> Severity {
        Severity::Noise
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PingRequest {
    /// Client clock reading; the server time is used when absent.
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct PingQuery {
    pub employee_id: Option<Uuid>,
    pub limit: Option<i64>,
}
