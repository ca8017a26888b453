use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Access, Permission};
use crate::errors::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::lunch::{summarize, DbLunchLog, LunchLog, LunchLogRequest, LunchQuery, LunchSummary};
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/api/lunch",
    tag = "Lunch",
    request_body = LunchLogRequest,
    responses(
        (status = 201, description = "Lunch event recorded", body = LunchLog),
        (status = 403, description = "Employee identity required")
    )
)]
pub async fn log_lunch(
    State(state): State<AppState>,
    access: Access,
    JsonBody(payload): JsonBody<LunchLogRequest>,
) -> AppResult<(StatusCode, Json<LunchLog>)> {
    let employee_id = access.require_employee()?;

    let log = LunchLog {
        id: Uuid::new_v4(),
        employee_id,
        kind: payload.kind,
        timestamp: utc_now(),
    };

    sqlx::query("INSERT INTO lunch_logs (id, employee_id, type, timestamp) VALUES (?, ?, ?, ?)")
        .bind(log.id)
        .bind(log.employee_id)
        .bind(log.kind.as_str())
        .bind(log.timestamp)
        .execute(&state.pool)
        .await?;

    Ok((StatusCode::CREATED, Json(log)))
}

#[utoipa::path(
    get,
    path = "/api/lunch",
    tag = "Lunch",
    params(LunchQuery),
    responses(
        (status = 200, description = "Lunch events, oldest first", body = [LunchLog]),
        (status = 400, description = "employeeId required for the admin"),
        (status = 403, description = "canViewReports required for other employees")
    )
)]
pub async fn list_lunch(
    State(state): State<AppState>,
    access: Access,
    Query(query): Query<LunchQuery>,
) -> AppResult<Json<Vec<LunchLog>>> {
    let employee_id = target_employee(&access, query.employee_id)?;
    Ok(Json(load_logs(&state.pool, employee_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/lunch/summary",
    tag = "Lunch",
    params(LunchQuery),
    responses(
        (status = 200, description = "Minutes spent across consecutive start/end pairs", body = LunchSummary),
        (status = 403, description = "canViewReports required for other employees")
    )
)]
pub async fn lunch_summary(
    State(state): State<AppState>,
    access: Access,
    Query(query): Query<LunchQuery>,
) -> AppResult<Json<LunchSummary>> {
    let employee_id = target_employee(&access, query.employee_id)?;
    let logs = load_logs(&state.pool, employee_id).await?;
    Ok(Json(summarize(employee_id, &logs)))
}

/// Own logs by default; someone else's need `canViewReports`.
fn target_employee(access: &Access, requested: Option<Uuid>) -> AppResult<Uuid> {
    match (requested, access.employee_id()) {
        (Some(id), Some(own)) if id == own => Ok(own),
        (Some(id), _) => {
            access.require(Permission::ViewReports)?;
            Ok(id)
        }
        (None, Some(own)) => Ok(own),
        (None, None) => Err(AppError::bad_request("employeeId is required")),
    }
}

async fn load_logs(pool: &SqlitePool, employee_id: Uuid) -> AppResult<Vec<LunchLog>> {
    let rows = sqlx::query_as::<_, DbLunchLog>(
        "SELECT id, employee_id, type, timestamp FROM lunch_logs WHERE employee_id = ? ORDER BY timestamp ASC",
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(LunchLog::try_from).collect()
}
