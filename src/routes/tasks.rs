use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{ensure_visible, mutation_rights, resolve_role, task_filter, Access, Permission};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::extract::{required_text, JsonBody};
use crate::models::progress::ProgressUpdate;
use crate::models::task::{DbTask, Task, TaskCreateRequest, TaskListQuery, TaskUpdateRequest, TASK_COLUMNS};
use crate::routes::employees::fetch_employee;
use crate::routes::MessageResponse;
use crate::utils::utc_now;

/// Due date first, then `high > medium > low`.
const TASK_ORDER: &str =
    "due_date ASC, CASE priority WHEN 'high' THEN 3 WHEN 'medium' THEN 2 ELSE 1 END DESC, created_at ASC";

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    params(TaskListQuery),
    responses(
        (status = 200, description = "Tasks visible to the caller", body = [Task]),
        (status = 401, description = "No valid identity")
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    access: Access,
    Query(query): Query<TaskListQuery>,
) -> AppResult<Json<Vec<Task>>> {
    let filter = task_filter(&access, query.assigned_to);
    let (predicate, binds) = filter.sql_predicate();

    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE {predicate} ORDER BY {TASK_ORDER}");
    let mut statement = sqlx::query_as::<_, DbTask>(&sql);
    for value in binds {
        statement = statement.bind(value);
    }
    let rows = statement.fetch_all(&state.pool).await?;

    let mut tasks = rows.into_iter().map(Task::try_from).collect::<AppResult<Vec<_>>>()?;
    attach_progress(&state.pool, &mut tasks).await?;

    Ok(Json(tasks))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    request_body = TaskCreateRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "canAssignTasks required"),
        (status = 404, description = "Assignee not found")
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<TaskCreateRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    access.require(Permission::AssignTasks)?;

    let title = required_text("title", &payload.title)?;
    fetch_employee(&state.pool, payload.assigned_to)
        .await
        .map_err(|err| match err {
            AppError::NotFound(_) => AppError::not_found("assignee not found"),
            other => other,
        })?;
    let snapshot = resolve_role(&state.pool, payload.assigned_to).await?.role_id();

    let now = utc_now();
    let task = Task {
        id: Uuid::new_v4(),
        title,
        description: payload.description.unwrap_or_default().trim().to_string(),
        assigned_by: access.caller.actor(),
        assigned_to: payload.assigned_to,
        role: snapshot,
        priority: payload.priority.unwrap_or_default(),
        status: payload.status.unwrap_or_default(),
        due_date: payload.due_date,
        progress_updates: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO tasks (id, title, description, assigned_by, assigned_to, role_id, priority, status, due_date, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.assigned_by)
    .bind(task.assigned_to)
    .bind(task.role)
    .bind(task.priority.as_str())
    .bind(task.status.as_str())
    .bind(task.due_date)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(&state.pool)
    .await?;

    tracing::info!(task_id = %task.id, assigned_to = %task.assigned_to, role = ?task.role, "task created");
    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(access.caller.actor()),
        &task,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task detail", body = Task),
        (status = 403, description = "Task not visible to the caller"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    access: Access,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Task>> {
    let task = fetch_task(&state.pool, id).await?;
    ensure_visible(&access, &task)?;
    Ok(Json(task))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = TaskUpdateRequest,
    responses(
        (status = 200, description = "Task updated; fields the caller may not change are ignored", body = Task),
        (status = 403, description = "Caller is neither the assignee nor a task manager"),
        (status = 404, description = "Task or new assignee not found")
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<TaskUpdateRequest>,
) -> AppResult<Json<Task>> {
    let existing = fetch_task(&state.pool, id).await?;
    let rights = mutation_rights(&access, &existing)?;
    let changes = rights.scope_update(payload);
    if changes.is_empty() {
        return Ok(Json(existing));
    }

    let title = match changes.title.as_deref() {
        Some(title) => required_text("title", title)?,
        None => existing.title.clone(),
    };

    // reassignment re-snapshots the new assignee's role, or clears it
    let (assigned_to, role) = match changes.assigned_to {
        Some(new_assignee) if new_assignee != existing.assigned_to => {
            fetch_employee(&state.pool, new_assignee)
                .await
                .map_err(|err| match err {
                    AppError::NotFound(_) => AppError::not_found("assignee not found"),
                    other => other,
                })?;
            let snapshot = resolve_role(&state.pool, new_assignee).await?.role_id();
            tracing::info!(task_id = %id, from = %existing.assigned_to, to = %new_assignee, role = ?snapshot, "task reassigned");
            (new_assignee, snapshot)
        }
        _ => (existing.assigned_to, existing.role),
    };

    let updated = Task {
        title,
        description: changes.description.unwrap_or_else(|| existing.description.clone()),
        assigned_to,
        role,
        priority: changes.priority.unwrap_or(existing.priority),
        status: changes.status.unwrap_or(existing.status),
        due_date: changes.due_date.unwrap_or(existing.due_date),
        updated_at: utc_now(),
        ..existing.clone()
    };

    sqlx::query(
        "UPDATE tasks SET title = ?, description = ?, assigned_to = ?, role_id = ?, priority = ?, status = ?, \
         due_date = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&updated.title)
    .bind(&updated.description)
    .bind(updated.assigned_to)
    .bind(updated.role)
    .bind(updated.priority.as_str())
    .bind(updated.status.as_str())
    .bind(updated.due_date)
    .bind(updated.updated_at)
    .bind(id)
    .execute(&state.pool)
    .await?;

    log_activity_with_context(
        &state.event_bus,
        "updated",
        Some(access.caller.actor()),
        &updated,
        Some(&existing),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 403, description = "Caller is neither the assignee nor a task manager"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let existing = fetch_task(&state.pool, id).await?;
    mutation_rights(&access, &existing)?;

    let mut tx = state.pool.begin().await?;
    sqlx::query("DELETE FROM task_progress_updates WHERE task_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    log_activity_with_context(
        &state.event_bus,
        "deleted",
        Some(access.caller.actor()),
        &existing,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(MessageResponse::new("Task deleted")))
}

/// Load one task with its progress entries in append order.
pub(crate) async fn fetch_task(pool: &SqlitePool, id: Uuid) -> AppResult<Task> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?");
    let row = sqlx::query_as::<_, DbTask>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("task not found"))?;

    let mut task = Task::try_from(row)?;
    task.progress_updates = sqlx::query_as::<_, ProgressUpdate>(
        "SELECT message, timestamp FROM task_progress_updates WHERE task_id = ? ORDER BY seq ASC",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(task)
}

async fn attach_progress(pool: &SqlitePool, tasks: &mut [Task]) -> AppResult<()> {
    if tasks.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; tasks.len()].join(", ");
    let sql = format!(
        "SELECT task_id, message, timestamp FROM task_progress_updates WHERE task_id IN ({placeholders}) ORDER BY task_id, seq ASC"
    );
    let mut statement = sqlx::query_as::<_, (Uuid, String, chrono::DateTime<chrono::Utc>)>(&sql);
    for task in tasks.iter() {
        statement = statement.bind(task.id);
    }

    let mut by_task: HashMap<Uuid, Vec<ProgressUpdate>> = HashMap::new();
    for (task_id, message, timestamp) in statement.fetch_all(pool).await? {
        by_task
            .entry(task_id)
            .or_default()
            .push(ProgressUpdate { message, timestamp });
    }

    for task in tasks.iter_mut() {
        task.progress_updates = by_task.remove(&task.id).unwrap_or_default();
    }

    Ok(())
}
