use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Access, Caller, Permission};
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::extract::{required_text, JsonBody};
use crate::models::message::{BroadcastMessage, BroadcastRequest, DbBroadcastMessage};
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/api/messages/broadcast",
    tag = "Messages",
    request_body = BroadcastRequest,
    responses(
        (status = 201, description = "Message sent to every employee", body = BroadcastMessage),
        (status = 403, description = "canManageEmployees required")
    )
)]
pub async fn broadcast(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<BroadcastRequest>,
) -> AppResult<(StatusCode, Json<BroadcastMessage>)> {
    access.require(Permission::ManageEmployees)?;

    let subject = required_text("subject", &payload.subject)?;
    let body = required_text("body", &payload.body)?;
    let id = Uuid::new_v4();
    let created_at = utc_now();
    let created_by = access.caller.actor();

    let mut tx = state.pool.begin().await?;
    sqlx::query(
        "INSERT INTO broadcast_messages (id, subject, body, urgent, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&subject)
    .bind(&body)
    .bind(payload.urgent)
    .bind(&created_by)
    .bind(created_at)
    .execute(&mut *tx)
    .await?;

    let recipients = sqlx::query(
        "INSERT INTO broadcast_recipients (message_id, employee_id) SELECT ?, id FROM employees",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    tx.commit().await?;

    let message = BroadcastMessage {
        id,
        subject,
        body,
        urgent: payload.urgent,
        created_by,
        created_at,
        recipient_count: recipients as i64,
    };

    tracing::info!(message_id = %id, recipients, urgent = message.urgent, "broadcast sent");
    log_activity_with_context(
        &state.event_bus,
        "sent",
        Some(access.caller.actor()),
        &message,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    get,
    path = "/api/messages",
    tag = "Messages",
    responses((status = 200, description = "Broadcasts, newest first", body = [BroadcastMessage]))
)]
pub async fn list_messages(State(state): State<AppState>, _caller: Caller) -> AppResult<Json<Vec<BroadcastMessage>>> {
    let rows = sqlx::query_as::<_, DbBroadcastMessage>(
        "SELECT m.id, m.subject, m.body, m.urgent, m.created_by, m.created_at, \
         (SELECT COUNT(*) FROM broadcast_recipients r WHERE r.message_id = m.id) AS recipient_count \
         FROM broadcast_messages m ORDER BY m.created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows.into_iter().map(BroadcastMessage::from).collect()))
}
