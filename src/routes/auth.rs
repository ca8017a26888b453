use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::{resolve_role, Caller, PermissionSet, ADMIN_COOKIE, EMPLOYEE_COOKIE};
use crate::errors::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::employee::{DbEmployee, Employee, EMPLOYEE_COLUMNS};
use crate::models::role::Role;
use crate::routes::employees::fetch_employee;
use crate::routes::MessageResponse;
use crate::utils::{removal_cookie, session_cookie, verify_password};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    #[schema(example = "admin")]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminLoginResponse {
    pub username: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub employee: Employee,
    pub role: Option<String>,
    pub permissions: PermissionSet,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CallerKind {
    Admin,
    Employee,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub kind: CallerKind,
    pub username: Option<String>,
    pub employee: Option<Employee>,
    pub role: Option<Role>,
    pub permissions: PermissionSet,
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "Auth",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Admin session cookie issued", body = AdminLoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(payload): JsonBody<AdminLoginRequest>,
) -> AppResult<impl IntoResponse> {
    if !state.config.admin.matches(&payload.username, &payload.password) {
        tracing::info!(username = %payload.username, "admin login rejected");
        return Err(AppError::unauthorized("invalid credentials"));
    }

    let token = state.config.jwt.encode_admin(&payload.username)?;
    let cookie = session_cookie(
        ADMIN_COOKIE,
        token,
        state.config.jwt.ttl_seconds(),
        state.config.identity.secure_cookies,
    );

    tracing::info!(username = %payload.username, "admin logged in");
    Ok((
        jar.add(cookie),
        Json(AdminLoginResponse {
            username: payload.username,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/logout",
    tag = "Auth",
    responses((status = 200, description = "Admin session cookie cleared", body = MessageResponse))
)]
pub async fn admin_logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(removal_cookie(ADMIN_COOKIE)),
        Json(MessageResponse::new("Logged out")),
    )
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Employee session cookie issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let email = payload.email.trim().to_lowercase();
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?");
    let db_employee = sqlx::query_as::<_, DbEmployee>(&sql)
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    if !verify_password(&payload.password, &db_employee.password_hash)? {
        tracing::info!(%email, "employee login rejected");
        return Err(AppError::unauthorized("invalid credentials"));
    }

    let resolved = resolve_role(&state.pool, db_employee.id).await?;
    let role_name = resolved.role_name().map(str::to_string);
    let token = state.config.jwt.encode_employee(
        db_employee.id,
        &db_employee.email,
        role_name.as_deref(),
        resolved.permissions,
    )?;

    let cookie = session_cookie(
        EMPLOYEE_COOKIE,
        token.clone(),
        state.config.jwt.ttl_seconds(),
        state.config.identity.secure_cookies,
    );
    let employee: Employee = db_employee.try_into()?;

    tracing::info!(employee_id = %employee.id, "employee logged in");
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            employee,
            role: role_name,
            permissions: resolved.permissions,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Employee session cookie cleared", body = MessageResponse))
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(removal_cookie(EMPLOYEE_COOKIE)),
        Json(MessageResponse::new("Logged out")),
    )
}

#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current caller with resolved permissions", body = MeResponse),
        (status = 401, description = "No valid identity")
    )
)]
pub async fn me(State(state): State<AppState>, caller: Caller) -> AppResult<Json<MeResponse>> {
    match caller {
        Caller::Admin { username } => Ok(Json(MeResponse {
            kind: CallerKind::Admin,
            username: Some(username),
            employee: None,
            role: None,
            permissions: PermissionSet::all(),
        })),
        Caller::Employee { id } => {
            // a header-declared id may not exist; that is a 404, not an empty profile
            let employee: Employee = fetch_employee(&state.pool, id).await?.try_into()?;
            let resolved = resolve_role(&state.pool, id).await?;

            Ok(Json(MeResponse {
                kind: CallerKind::Employee,
                username: None,
                employee: Some(employee),
                permissions: resolved.permissions,
                role: resolved.role,
            }))
        }
    }
}
