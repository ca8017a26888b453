use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Access, Permission};
use crate::errors::{AppError, AppResult};
use crate::extract::{required_text, JsonBody};
use crate::models::notification::{
    DbNotification, Notification, NotificationCreateRequest, NotificationQuery, NOTIFICATION_COLUMNS,
};
use crate::routes::employees::fetch_employee;
use crate::routes::MessageResponse;
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/api/notifications",
    tag = "Notifications",
    request_body = NotificationCreateRequest,
    responses(
        (status = 201, description = "Notification queued for the employee", body = Notification),
        (status = 403, description = "canManageEmployees required"),
        (status = 404, description = "Recipient not found")
    )
)]
pub async fn create_notification(
    State(state): State<AppState>,
    access: Access,
    JsonBody(payload): JsonBody<NotificationCreateRequest>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    access.require(Permission::ManageEmployees)?;
    let message = required_text("message", &payload.message)?;
    fetch_employee(&state.pool, payload.to_employee_id).await?;

    let notification = Notification {
        id: Uuid::new_v4(),
        to_employee_id: payload.to_employee_id,
        from: access.caller.actor(),
        message,
        kind: payload.kind,
        read: false,
        created_at: utc_now(),
    };

    sqlx::query(
        "INSERT INTO notifications (id, to_employee_id, sender, message, type, read, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(notification.id)
    .bind(notification.to_employee_id)
    .bind(&notification.from)
    .bind(&notification.message)
    .bind(notification.kind.as_str())
    .bind(notification.read)
    .bind(notification.created_at)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(notification)))
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = [Notification]),
        (status = 400, description = "The admin must name an employeeId")
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    access: Access,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let recipient = match access.employee_id() {
        Some(own) => own,
        None => query
            .employee_id
            .ok_or_else(|| AppError::bad_request("employeeId is required"))?,
    };

    let sql = format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE to_employee_id = ? ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, DbNotification>(&sql)
        .bind(recipient)
        .fetch_all(&state.pool)
        .await?;

    let notifications = rows.into_iter().map(Notification::try_from).collect::<AppResult<Vec<_>>>()?;
    Ok(Json(notifications))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 403, description = "Only the recipient or the admin"),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    access: Access,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    let existing = fetch_notification(&state.pool, id).await?;
    ensure_recipient(&access, &existing)?;

    sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(Notification {
        read: true,
        ..existing
    }))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification removed", body = MessageResponse),
        (status = 403, description = "Only the recipient or the admin"),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    access: Access,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let existing = fetch_notification(&state.pool, id).await?;
    ensure_recipient(&access, &existing)?;

    sqlx::query("DELETE FROM notifications WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(MessageResponse::new("Notification deleted")))
}

fn ensure_recipient(access: &Access, notification: &Notification) -> AppResult<()> {
    if access.is_admin() || access.is_employee(notification.to_employee_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("only the recipient may change this notification"))
    }
}

async fn fetch_notification(pool: &SqlitePool, id: Uuid) -> AppResult<Notification> {
    let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?");
    let row = sqlx::query_as::<_, DbNotification>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("notification not found"))?;

    row.try_into()
}
