use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Access, Permission};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::extract::{required_text, JsonBody};
use crate::models::holiday::{
    DbHolidayRequest, HolidayRequest, HolidayRequestCreate, HolidayRequestDecision, HolidayRequestQuery,
    HolidayRequestStatus, HOLIDAY_REQUEST_COLUMNS,
};
use crate::routes::employees::fetch_employee;
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/api/holiday-requests",
    tag = "Holidays",
    request_body = HolidayRequestCreate,
    responses(
        (status = 201, description = "Request filed as pending", body = HolidayRequest),
        (status = 403, description = "Employee identity required")
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    access: Access,
    JsonBody(payload): JsonBody<HolidayRequestCreate>,
) -> AppResult<(StatusCode, Json<HolidayRequest>)> {
    let employee_id = access.require_employee()?;
    let employee = fetch_employee(&state.pool, employee_id).await?;

    let request = HolidayRequest {
        id: Uuid::new_v4(),
        employee_id,
        employee_name: employee.name,
        date: payload.date,
        message: required_text("message", &payload.message)?,
        status: HolidayRequestStatus::Pending,
        created_at: utc_now(),
    };

    sqlx::query(
        "INSERT INTO holiday_requests (id, employee_id, employee_name, date, message, status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(request.id)
    .bind(request.employee_id)
    .bind(&request.employee_name)
    .bind(request.date)
    .bind(&request.message)
    .bind(request.status.as_str())
    .bind(request.created_at)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/holiday-requests",
    tag = "Holidays",
    params(HolidayRequestQuery),
    responses((status = 200, description = "Holiday requests, newest first", body = [HolidayRequest]))
)]
pub async fn list_requests(
    State(state): State<AppState>,
    access: Access,
    Query(query): Query<HolidayRequestQuery>,
) -> AppResult<Json<Vec<HolidayRequest>>> {
    // reviewers may filter; everyone else only ever sees their own
    let employee_filter = if access.can(Permission::ManageEmployees) {
        query.employee_id
    } else {
        Some(access.require_employee()?)
    };

    let predicate = if employee_filter.is_some() {
        "employee_id = ?"
    } else {
        "1 = 1"
    };
    let sql = format!("SELECT {HOLIDAY_REQUEST_COLUMNS} FROM holiday_requests WHERE {predicate} ORDER BY created_at DESC");
    let mut statement = sqlx::query_as::<_, DbHolidayRequest>(&sql);
    if let Some(employee_id) = employee_filter {
        statement = statement.bind(employee_id);
    }
    let rows = statement.fetch_all(&state.pool).await?;

    let requests = rows.into_iter().map(HolidayRequest::try_from).collect::<AppResult<Vec<_>>>()?;
    Ok(Json(requests))
}

#[utoipa::path(
    put,
    path = "/api/holiday-requests/{id}",
    tag = "Holidays",
    params(("id" = Uuid, Path, description = "Holiday request id")),
    request_body = HolidayRequestDecision,
    responses(
        (status = 200, description = "Request decided", body = HolidayRequest),
        (status = 403, description = "canManageEmployees required"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn decide_request(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<HolidayRequestDecision>,
) -> AppResult<Json<HolidayRequest>> {
    let existing = fetch_request(&state.pool, id).await?;
    access.require(Permission::ManageEmployees)?;

    sqlx::query("UPDATE holiday_requests SET status = ? WHERE id = ?")
        .bind(payload.status.as_str())
        .bind(id)
        .execute(&state.pool)
        .await?;

    let updated = HolidayRequest {
        status: payload.status,
        ..existing.clone()
    };
    log_activity_with_context(
        &state.event_bus,
        "decided",
        Some(access.caller.actor()),
        &updated,
        Some(&existing),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(updated))
}

async fn fetch_request(pool: &SqlitePool, id: Uuid) -> AppResult<HolidayRequest> {
    let sql = format!("SELECT {HOLIDAY_REQUEST_COLUMNS} FROM holiday_requests WHERE id = ?");
    let row = sqlx::query_as::<_, DbHolidayRequest>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("holiday request not found"))?;

    row.try_into()
}
