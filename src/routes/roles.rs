//! Role administration.
//!
//! Any identified caller may read roles (clients use the list to gate their UI);
//! writes need `canManageRoles`. Role changes are logged as critical activity.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Access, Caller, Permission};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::extract::{required_text, JsonBody};
use crate::models::role::{DbRole, Role, RoleCreateRequest, RoleUpdateRequest, ROLE_COLUMNS};
use crate::routes::departments::ensure_department_exists;
use crate::routes::MessageResponse;
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Roles",
    responses(
        (status = 200, description = "Every role with its permission set", body = [Role]),
        (status = 401, description = "No valid identity")
    )
)]
pub async fn list_roles(State(state): State<AppState>, _caller: Caller) -> AppResult<Json<Vec<Role>>> {
    let sql = format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY name ASC, created_at ASC");
    let rows = sqlx::query_as::<_, DbRole>(&sql).fetch_all(&state.pool).await?;

    let roles = rows.into_iter().map(Role::try_from).collect::<AppResult<Vec<_>>>()?;
    Ok(Json(roles))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "Roles",
    request_body = RoleCreateRequest,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 403, description = "canManageRoles required"),
        (status = 409, description = "Role name already used in this department")
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<RoleCreateRequest>,
) -> AppResult<(StatusCode, Json<Role>)> {
    access.require(Permission::ManageRoles)?;

    let name = required_text("name", &payload.name)?;
    if let Some(department_id) = payload.department_id {
        ensure_department_exists(&state.pool, department_id).await?;
    }

    let now = utc_now();
    let role = Role {
        id: Uuid::new_v4(),
        name,
        department_id: payload.department_id,
        permissions: payload.permissions,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO roles (id, name, department_id, permissions, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(role.id)
    .bind(&role.name)
    .bind(role.department_id)
    .bind(role.permissions.to_stored())
    .bind(role.created_at)
    .bind(role.updated_at)
    .execute(&state.pool)
    .await?;

    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(access.caller.actor()),
        &role,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role detail", body = Role),
        (status = 404, description = "Role not found")
    )
)]
pub async fn get_role(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Role>> {
    Ok(Json(fetch_role(&state.pool, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "Role id")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 403, description = "canManageRoles required"),
        (status = 404, description = "Role not found")
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<RoleUpdateRequest>,
) -> AppResult<Json<Role>> {
    let existing = fetch_role(&state.pool, id).await?;
    access.require(Permission::ManageRoles)?;

    let name = match payload.name.as_deref() {
        Some(name) => required_text("name", name)?,
        None => existing.name.clone(),
    };
    if let Some(department_id) = payload.department_id {
        ensure_department_exists(&state.pool, department_id).await?;
    }

    let updated = Role {
        name,
        department_id: payload.department_id.or(existing.department_id),
        permissions: payload.permissions.unwrap_or(existing.permissions),
        updated_at: utc_now(),
        ..existing.clone()
    };

    sqlx::query("UPDATE roles SET name = ?, department_id = ?, permissions = ?, updated_at = ? WHERE id = ?")
        .bind(&updated.name)
        .bind(updated.department_id)
        .bind(updated.permissions.to_stored())
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
    path = "/api/roles/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role deleted", body = MessageResponse),
        (status = 403, description = "canManageRoles required"),
        (status = 404, description = "Role not found")
    )
)]
pub async fn delete_role(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let existing = fetch_role(&state.pool, id).await?;
    access.require(Permission::ManageRoles)?;

    // employees and task snapshots pointing here stop resolving and fall back to defaults
    sqlx::query("DELETE FROM roles WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    log_activity_with_context(
        &state.event_bus,
        "deleted",
        Some(access.caller.actor()),
        &existing,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(MessageResponse::new("Role deleted")))
}

pub(crate) async fn fetch_role(pool: &SqlitePool, id: Uuid) -> AppResult<Role> {
    let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?");
    let row = sqlx::query_as::<_, DbRole>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("role not found"))?;

    row.try_into()
}
