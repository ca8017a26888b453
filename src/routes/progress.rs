//! Append-only task progress and the cross-task progress feed.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{ensure_progress_author, ensure_visible, Access, Permission};
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::extract::{required_text, JsonBody};
use crate::models::progress::{
    DbFeedRow, ProgressCreateRequest, ProgressEntry, ProgressFeedEntry, ProgressFeedQuery, ProgressUpdate,
};
use crate::models::task::Task;
use crate::routes::tasks::fetch_task;
use crate::utils::{clamp_limit, utc_now};

const UNKNOWN_EMPLOYEE: &str = "Unknown";

#[utoipa::path(
    get,
    path = "/api/tasks/{id}/progress",
    tag = "Progress",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Progress entries, oldest first", body = [ProgressUpdate]),
        (status = 403, description = "Task not visible to the caller"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn list_progress(
    State(state): State<AppState>,
    access: Access,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<ProgressUpdate>>> {
    let task = fetch_task(&state.pool, id).await?;
    ensure_visible(&access, &task)?;
    Ok(Json(task.progress_updates))
}

#[utoipa::path(
    post,
    path = "/api/tasks/{id}/progress",
    tag = "Progress",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = ProgressCreateRequest,
    responses(
        (status = 201, description = "Entry appended; returns the task", body = Task),
        (status = 400, description = "Empty message"),
        (status = 403, description = "Only the assignee may post progress"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn append_progress(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<ProgressCreateRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let task = fetch_task(&state.pool, id).await?;
    ensure_progress_author(&access, &task)?;
    let message = required_text("message", &payload.message)?;

    // timestamp is always the server clock
    let now = utc_now();
    let mut tx = state.pool.begin().await?;

    // seq is read under the write lock this first statement takes
    let seq: i64 = sqlx::query_scalar(
        "INSERT INTO task_progress_updates (id, task_id, seq, message, timestamp) \
         SELECT ?, ?, COALESCE(MAX(seq), 0) + 1, ?, ? FROM task_progress_updates WHERE task_id = ? \
         RETURNING seq",
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(&message)
    .bind(now)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    match payload.status {
        Some(status) => {
            sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        None => {
            sqlx::query("UPDATE tasks SET updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    let entry = ProgressEntry {
        task_id: id,
        seq,
        message,
        timestamp: now,
        status: payload.status,
    };
    log_activity_with_context(
        &state.event_bus,
        "appended",
        Some(access.caller.actor()),
        &entry,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    let task = fetch_task(&state.pool, id).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/api/tasks/progress",
    tag = "Progress",
    params(ProgressFeedQuery),
    responses(
        (status = 200, description = "Recent progress across all tasks, newest first", body = [ProgressFeedEntry]),
        (status = 403, description = "canViewReports required")
    )
)]
pub async fn progress_feed(
    State(state): State<AppState>,
    access: Access,
    Query(query): Query<ProgressFeedQuery>,
) -> AppResult<Json<Vec<ProgressFeedEntry>>> {
    access.require(Permission::ViewReports)?;

    let limit = clamp_limit(query.limit, 50, 200);
    let mut clauses = Vec::new();
    if query.since.is_some() {
        clauses.push("p.timestamp >= ?");
    }
    if query.until.is_some() {
        clauses.push("p.timestamp < ?");
    }
    let predicate = if clauses.is_empty() {
        "1 = 1".to_string()
    } else {
        clauses.join(" AND ")
    };

    let sql = format!(
        "SELECT p.task_id AS task_id, t.title AS task_title, t.assigned_to AS assigned_to, p.message AS message, p.timestamp AS timestamp \
         FROM task_progress_updates p INNER JOIN tasks t ON t.id = p.task_id \
         WHERE {predicate} ORDER BY p.timestamp DESC, p.seq DESC LIMIT ?"
    );
    let mut statement = sqlx::query_as::<_, DbFeedRow>(&sql);
    if let Some(since) = query.since {
        statement = statement.bind(since);
    }
    if let Some(until) = query.until {
        statement = statement.bind(until);
    }
    let rows = statement.bind(limit).fetch_all(&state.pool).await?;

    let names = employee_names(&state.pool, &rows).await;
    let feed = rows
        .into_iter()
        .map(|row| ProgressFeedEntry {
            employee_name: names
                .get(&row.assigned_to)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_EMPLOYEE.to_string()),
            task_id: row.task_id,
            task_title: row.task_title,
            assigned_to: row.assigned_to,
            message: row.message,
            timestamp: row.timestamp,
        })
        .collect();

    Ok(Json(feed))
}

// Enrichment only; a failed lookup leaves every name unknown instead of failing the feed.
async fn employee_names(pool: &SqlitePool, rows: &[DbFeedRow]) -> HashMap<Uuid, String> {
    let mut ids: Vec<Uuid> = rows.iter().map(|row| row.assigned_to).collect();
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return HashMap::new();
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT id, name FROM employees WHERE id IN ({placeholders})");
    let mut statement = sqlx::query_as::<_, (Uuid, String)>(&sql);
    for id in &ids {
        statement = statement.bind(*id);
    }

    match statement.fetch_all(pool).await {
        Ok(found) => found.into_iter().collect(),
        Err(err) => {
            tracing::warn!(error = %err, "progress feed name lookup failed");
            HashMap::new()
        }
    }
}
