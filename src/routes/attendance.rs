use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Access, Permission};
use crate::errors::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::attendance::{
    Attendance, AttendanceCreateRequest, AttendancePage, AttendancePageQuery, DbAttendance, ATTENDANCE_COLUMNS,
};
use crate::routes::employees::fetch_employee;
use crate::utils::{clamp_limit, utc_now};

const OWN_HISTORY_LIMIT: i64 = 100;

#[utoipa::path(
    post,
    path = "/api/attendance",
    tag = "Attendance",
    request_body = AttendanceCreateRequest,
    responses(
        (status = 201, description = "Check-in or check-out recorded", body = Attendance),
        (status = 403, description = "Employee identity with canCheckIn required")
    )
)]
pub async fn record_attendance(
    State(state): State<AppState>,
    access: Access,
    JsonBody(payload): JsonBody<AttendanceCreateRequest>,
) -> AppResult<(StatusCode, Json<Attendance>)> {
    let employee_id = access.require_employee()?;
    access.require(Permission::CheckIn)?;
    let employee = fetch_employee(&state.pool, employee_id).await?;

    let record = Attendance {
        id: Uuid::new_v4(),
        employee_id,
        employee_name: employee.name,
        kind: payload.kind,
        timestamp: utc_now(),
        image_data: payload.image_data,
    };

    sqlx::query(
        "INSERT INTO attendance (id, employee_id, employee_name, type, timestamp, image_data) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(record.id)
    .bind(record.employee_id)
    .bind(&record.employee_name)
    .bind(record.kind.as_str())
    .bind(record.timestamp)
    .bind(&record.image_data)
    .execute(&state.pool)
    .await?;

    tracing::info!(%employee_id, kind = record.kind.as_str(), "attendance recorded");
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    tag = "Attendance",
    responses(
        (status = 200, description = "Caller's own attendance, newest first", body = [Attendance]),
        (status = 403, description = "Employee identity required")
    )
)]
pub async fn list_own_attendance(
    State(state): State<AppState>,
    access: Access,
) -> AppResult<Json<Vec<Attendance>>> {
    let employee_id = access.require_employee()?;

    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? ORDER BY timestamp DESC LIMIT ?"
    );
    let rows = sqlx::query_as::<_, DbAttendance>(&sql)
        .bind(employee_id)
        .bind(OWN_HISTORY_LIMIT)
        .fetch_all(&state.pool)
        .await?;

    let records = rows.into_iter().map(Attendance::try_from).collect::<AppResult<Vec<_>>>()?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/admin/attendance",
    tag = "Attendance",
    params(AttendancePageQuery),
    responses(
        (status = 200, description = "One page of attendance across employees", body = AttendancePage),
        (status = 403, description = "canViewReports required")
    )
)]
pub async fn list_all_attendance(
    State(state): State<AppState>,
    access: Access,
    Query(query): Query<AttendancePageQuery>,
) -> AppResult<Json<AttendancePage>> {
    access.require(Permission::ViewReports)?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = clamp_limit(query.limit, 10, 100);
    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::bad_request("page is out of range"))?;

    let predicate = if query.employee_id.is_some() {
        "employee_id = ?"
    } else {
        "1 = 1"
    };

    let count_sql = format!("SELECT COUNT(*) FROM attendance WHERE {predicate}");
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(employee_id) = query.employee_id {
        count = count.bind(employee_id);
    }
    let total = count.fetch_one(&state.pool).await?;

    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE {predicate} ORDER BY timestamp DESC LIMIT ? OFFSET ?"
    );
    let mut statement = sqlx::query_as::<_, DbAttendance>(&sql);
    if let Some(employee_id) = query.employee_id {
        statement = statement.bind(employee_id);
    }
    let rows = statement.bind(limit).bind(offset).fetch_all(&state.pool).await?;

    let attendance = rows.into_iter().map(Attendance::try_from).collect::<AppResult<Vec<_>>>()?;
    Ok(Json(AttendancePage {
        attendance,
        total_pages: (total + limit - 1) / limit,
        current_page: page,
        total,
    }))
}
