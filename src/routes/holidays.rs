use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Access, Caller};
use crate::errors::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::holiday::{Holiday, HolidayCreateRequest};
use crate::routes::MessageResponse;

#[utoipa::path(
    get,
    path = "/api/holidays",
    tag = "Holidays",
    responses((status = 200, description = "Company holidays by date", body = [Holiday]))
)]
pub async fn list_holidays(State(state): State<AppState>, _caller: Caller) -> AppResult<Json<Vec<Holiday>>> {
    let holidays = sqlx::query_as::<_, Holiday>("SELECT id, date, description FROM holidays ORDER BY date ASC")
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/holidays",
    tag = "Holidays",
    request_body = HolidayCreateRequest,
    responses(
        (status = 201, description = "Holiday added", body = Holiday),
        (status = 403, description = "Admin only"),
        (status = 409, description = "A holiday already exists on that date")
    )
)]
pub async fn create_holiday(
    State(state): State<AppState>,
    access: Access,
    JsonBody(payload): JsonBody<HolidayCreateRequest>,
) -> AppResult<(StatusCode, Json<Holiday>)> {
    access.require_admin()?;

    let holiday = Holiday {
        id: Uuid::new_v4(),
        date: payload.date,
        description: payload
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
    };

    sqlx::query("INSERT INTO holidays (id, date, description) VALUES (?, ?, ?)")
        .bind(holiday.id)
        .bind(holiday.date)
        .bind(&holiday.description)
        .execute(&state.pool)
        .await
        .map_err(|err| match AppError::from(err) {
            AppError::Conflict(_) => AppError::conflict("a holiday already exists on that date"),
            other => other,
        })?;

    Ok((StatusCode::CREATED, Json(holiday)))
}

#[utoipa::path(
    delete,
    path = "/api/holidays/{id}",
    tag = "Holidays",
    params(("id" = Uuid, Path, description = "Holiday id")),
    responses(
        (status = 200, description = "Holiday removed", body = MessageResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Holiday not found")
    )
)]
pub async fn delete_holiday(
    State(state): State<AppState>,
    access: Access,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    access.require_admin()?;

    let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("holiday not found"));
    }

    Ok(Json(MessageResponse::new("Holiday deleted")))
}
