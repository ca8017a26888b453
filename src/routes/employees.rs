use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Access, Permission, RoleRef};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::extract::{required_text, JsonBody};
use crate::models::employee::{
    requested_role, DbEmployee, Employee, EmployeeCreateRequest, EmployeeUpdateRequest, EMPLOYEE_COLUMNS,
};
use crate::routes::departments::ensure_department_exists;
use crate::routes::roles::fetch_role;
use crate::routes::MessageResponse;
use crate::utils::{hash_password, utc_now};

const DIRECTORY_READERS: [Permission; 2] = [Permission::ManageEmployees, Permission::AssignTasks];

#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Employees",
    responses(
        (status = 200, description = "List employees", body = [Employee]),
        (status = 403, description = "canManageEmployees or canAssignTasks required")
    )
)]
pub async fn list_employees(State(state): State<AppState>, access: Access) -> AppResult<Json<Vec<Employee>>> {
    access.require_any(&DIRECTORY_READERS)?;

    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY name ASC");
    let rows = sqlx::query_as::<_, DbEmployee>(&sql).fetch_all(&state.pool).await?;

    let employees = rows.into_iter().map(Employee::try_from).collect::<AppResult<Vec<_>>>()?;
    Ok(Json(employees))
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee detail", body = Employee),
        (status = 404, description = "Employee not found")
    )
)]
pub async fn get_employee(
    State(state): State<AppState>,
    access: Access,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Employee>> {
    let employee: Employee = fetch_employee(&state.pool, id).await?.try_into()?;

    if !access.is_employee(id) {
        access.require_any(&DIRECTORY_READERS)?;
    }

    Ok(Json(employee))
}

#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "Employees",
    request_body = EmployeeCreateRequest,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 403, description = "canManageEmployees required"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn create_employee(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<EmployeeCreateRequest>,
) -> AppResult<(StatusCode, Json<Employee>)> {
    access.require(Permission::ManageEmployees)?;

    let name = required_text("name", &payload.name)?;
    let email = normalize_email(&payload.email)?;
    let role = requested_role(payload.role_id, payload.role_name.as_deref())?;
    validate_references(&state.pool, payload.department_id, role.as_ref()).await?;
    let password_hash = hash_password(&payload.password)?;

    let id = Uuid::new_v4();
    let now = utc_now();
    let (role_kind, role_value) = stored_role(role.as_ref());

    sqlx::query(
        "INSERT INTO employees (id, name, email, position, department_id, password_hash, role_kind, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&name)
    .bind(&email)
    .bind(&payload.position)
    .bind(payload.department_id)
    .bind(password_hash)
    .bind(role_kind)
    .bind(role_value)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let employee: Employee = fetch_employee(&state.pool, id).await?.try_into()?;

    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(access.caller.actor()),
        &employee,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(employee)))
}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "Employee id")),
    request_body = EmployeeUpdateRequest,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 403, description = "canManageEmployees required"),
        (status = 404, description = "Employee not found")
    )
)]
pub async fn update_employee(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<EmployeeUpdateRequest>,
) -> AppResult<Json<Employee>> {
    let existing_row = fetch_employee(&state.pool, id).await?;
    access.require(Permission::ManageEmployees)?;

    let name = match payload.name.as_deref() {
        Some(name) => required_text("name", name)?,
        None => existing_row.name.clone(),
    };
    let email = match payload.email.as_deref() {
        Some(email) => normalize_email(email)?,
        None => existing_row.email.clone(),
    };
    // only a newly requested role is checked; an existing dangling id stays as it is
    let requested = requested_role(payload.role_id, payload.role_name.as_deref())?;
    validate_references(&state.pool, payload.department_id, requested.as_ref()).await?;
    let role = requested.or_else(|| existing_row.role_ref());
    let password_hash = match payload.password.as_deref() {
        Some(password) => hash_password(password)?,
        None => existing_row.password_hash.clone(),
    };

    let (role_kind, role_value) = stored_role(role.as_ref());
    sqlx::query(
        "UPDATE employees SET name = ?, email = ?, position = ?, department_id = ?, password_hash = ?, \
         role_kind = ?, role = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&name)
    .bind(&email)
    .bind(payload.position.as_ref().or(existing_row.position.as_ref()))
    .bind(payload.department_id.or(existing_row.department_id))
    .bind(password_hash)
    .bind(role_kind)
    .bind(role_value)
    .bind(utc_now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    let existing: Employee = existing_row.try_into()?;
    let updated: Employee = fetch_employee(&state.pool, id).await?.try_into()?;

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
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee deleted", body = MessageResponse),
        (status = 403, description = "canManageEmployees required"),
        (status = 404, description = "Employee not found")
    )
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    access: Access,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let existing: Employee = fetch_employee(&state.pool, id).await?.try_into()?;
    access.require(Permission::ManageEmployees)?;

    sqlx::query("DELETE FROM employees WHERE id = ?")
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

    Ok(Json(MessageResponse::new("Employee deleted")))
}

pub(crate) async fn fetch_employee(pool: &SqlitePool, id: Uuid) -> AppResult<DbEmployee> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
    sqlx::query_as::<_, DbEmployee>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("employee not found"))
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = required_text("email", raw)?.to_lowercase();
    if !email.contains('@') {
        return Err(AppError::bad_request("email is not valid"));
    }
    Ok(email)
}

// Role names may legitimately point at nothing yet; ids must exist.
async fn validate_references(pool: &SqlitePool, department_id: Option<Uuid>, role: Option<&RoleRef>) -> AppResult<()> {
    if let Some(department_id) = department_id {
        ensure_department_exists(pool, department_id).await?;
    }
    if let Some(RoleRef::Id(role_id)) = role {
        fetch_role(pool, *role_id).await?;
    }
    Ok(())
}

fn stored_role(role: Option<&RoleRef>) -> (Option<&'static str>, Option<String>) {
    match role.map(RoleRef::to_stored) {
        Some((kind, value)) => (Some(kind), Some(value)),
        None => (None, None),
    }
}
