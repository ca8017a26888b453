use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Access, Permission};
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::extract::JsonBody;
use crate::models::ping::{Ping, PingQuery, PingRequest};
use crate::utils::{clamp_limit, utc_now};

#[utoipa::path(
    post,
    path = "/api/pings",
    tag = "Presence",
    request_body = PingRequest,
    responses(
        (status = 201, description = "Presence ping stored", body = Ping),
        (status = 403, description = "Employee identity required")
    )
)]
pub async fn record_ping(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<PingRequest>,
) -> AppResult<(StatusCode, Json<Ping>)> {
    let employee_id = access.require_employee()?;

    let ping = Ping {
        id: Uuid::new_v4(),
        employee_id,
        timestamp: payload.timestamp.unwrap_or_else(utc_now),
    };

    sqlx::query("INSERT INTO pings (id, employee_id, timestamp) VALUES (?, ?, ?)")
        .bind(ping.id)
        .bind(ping.employee_id)
        .bind(ping.timestamp)
        .execute(&state.pool)
        .await?;

    tracing::debug!(%employee_id, "presence ping");
    log_activity_with_context(
        &state.event_bus,
        "recorded",
        Some(access.caller.actor()),
        &ping,
        None,
        Some(RequestContext::from_headers(&headers)),
    );
    Ok((StatusCode::CREATED, Json(ping)))
}

#[utoipa::path(
    get,
    path = "/api/admin/pings",
    tag = "Presence",
    params(PingQuery),
    responses(
        (status = 200, description = "Pings, newest first", body = [Ping]),
        (status = 403, description = "canViewReports required")
    )
)]
pub async fn list_pings(
    State(state): State<AppState>,
    access: Access,
    Query(query): Query<PingQuery>,
) -> AppResult<Json<Vec<Ping>>> {
    access.require(Permission::ViewReports)?;

    let limit = clamp_limit(query.limit, 100, 500);
    let predicate = if query.employee_id.is_some() {
        "employee_id = ?"
    } else {
        "1 = 1"
    };
    let sql = format!("SELECT id, employee_id, timestamp FROM pings WHERE {predicate} ORDER BY timestamp DESC LIMIT ?");

    let mut statement = sqlx::query_as::<_, Ping>(&sql);
    if let Some(employee_id) = query.employee_id {
        statement = statement.bind(employee_id);
    }
    let pings = statement.bind(limit).fetch_all(&state.pool).await?;

    Ok(Json(pings))
}
