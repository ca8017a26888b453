use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LunchEvent {
    LunchStart,
    LunchEnd,
}

impl LunchEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LunchEvent::LunchStart => "lunch-start",
            LunchEvent::LunchEnd => "lunch-end",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "lunch-start" => Ok(LunchEvent::LunchStart),
            "lunch-end" => Ok(LunchEvent::LunchEnd),
            other => Err(AppError::internal(format!("unknown lunch event `{other}` in storage"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LunchLog {
    pub id: Uuid,
    pub employee_id: Uuid,
    #[serde(rename = "type")]
    pub kind: LunchEvent,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbLunchLog {
    pub id: Uuid,
    pub employee_id: Uuid,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<DbLunchLog> for LunchLog {
    type Error = AppError;

    fn try_from(value: DbLunchLog) -> Result<Self, Self::Error> {
        Ok(LunchLog {
            id: value.id,
            employee_id: value.employee_id,
            kind: LunchEvent::parse(&value.kind)?,
            timestamp: value.timestamp,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LunchLogRequest {
    #[serde(rename = "type")]
    pub kind: LunchEvent,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct LunchQuery {
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LunchSummary {
    pub employee_id: Uuid,
    pub total_minutes: f64,
    pub breaks: usize,
}

/// Sum the minutes between each `lunch-start` immediately followed by a `lunch-end`.
/// Logs must be in ascending timestamp order; unpaired events are skipped.
pub fn summarize(employee_id: Uuid, logs: &[LunchLog]) -> LunchSummary {
    let mut total_seconds = 0i64;
    let mut breaks = 0usize;
    let mut idx = 0;

    while idx < logs.len() {
        let pair = (logs.get(idx), logs.get(idx + 1));
        if let (Some(start), Some(end)) = pair {
            if start.kind == LunchEvent::LunchStart && end.kind == LunchEvent::LunchEnd {
                total_seconds += (end.timestamp - start.timestamp).num_seconds();
                breaks += 1;
                idx += 2;
                continue;
            }
        }
        idx += 1;
    }

    LunchSummary {
        employee_id,
        total_minutes: total_seconds as f64 / 60.0,
        breaks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn log(kind: LunchEvent, minute: i64) -> LunchLog {
        let base = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        LunchLog {
            id: Uuid::new_v4(),
            employee_id: Uuid::nil(),
            kind,
            timestamp: base + Duration::minutes(minute),
        }
    }

    #[test]
    fn sums_consecutive_pairs_and_skips_strays() {
        let logs = vec![
            log(LunchEvent::LunchEnd, 0),
            log(LunchEvent::LunchStart, 10),
            log(LunchEvent::LunchEnd, 40),
            log(LunchEvent::LunchStart, 60),
            log(LunchEvent::LunchStart, 70),
            log(LunchEvent::LunchEnd, 85),
        ];

        let summary = summarize(Uuid::nil(), &logs);
        assert_eq!(summary.breaks, 2);
        assert_eq!(summary.total_minutes, 45.0);
    }
}
