use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Access, Caller, Permission};
use crate::errors::{AppError, AppResult};
use crate::extract::{required_text, JsonBody};
use crate::models::department::{Department, DepartmentCreateRequest};
use crate::routes::MessageResponse;
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/api/departments",
    tag = "Departments",
    responses((status = 200, description = "List departments", body = [Department]))
)]
pub async fn list_departments(
    State(state): State<AppState>,
    _caller: Caller,
) -> AppResult<Json<Vec<Department>>> {
    let departments = sqlx::query_as::<_, Department>(
        "SELECT id, name, created_at, updated_at FROM departments ORDER BY name ASC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(departments))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    tag = "Departments",
    request_body = DepartmentCreateRequest,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 403, description = "canManageDepartments required"),
        (status = 409, description = "Department name already exists")
    )
)]
pub async fn create_department(
    State(state): State<AppState>,
    access: Access,
    JsonBody(payload): JsonBody<DepartmentCreateRequest>,
) -> AppResult<(StatusCode, Json<Department>)> {
    access.require(Permission::ManageDepartments)?;

    let now = utc_now();
    let department = Department {
        id: Uuid::new_v4(),
        name: required_text("name", &payload.name)?,
        created_at: now,
        updated_at: now,
    };

    sqlx::query("INSERT INTO departments (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(department.id)
        .bind(&department.name)
        .bind(department.created_at)
        .bind(department.updated_at)
        .execute(&state.pool)
        .await?;

    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    tag = "Departments",
    params(("id" = Uuid, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department deleted", body = MessageResponse),
        (status = 404, description = "Department not found")
    )
)]
pub async fn delete_department(
    State(state): State<AppState>,
    access: Access,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    ensure_department_exists(&state.pool, id).await?;
    access.require(Permission::ManageDepartments)?;

    // roles and employees keep existing with no department
    sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(MessageResponse::new("Department deleted")))
}

pub(crate) async fn ensure_department_exists(pool: &SqlitePool, id: Uuid) -> AppResult<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM departments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    found
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("department not found"))
}
