use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::{ADMIN_COOKIE, EMPLOYEE_COOKIE, USER_ID_HEADER};
use crate::{authz, models, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::admin_login,
		routes::auth::admin_logout,
		routes::auth::login,
		routes::auth::logout,
		routes::auth::me,
		routes::roles::list_roles,
		routes::roles::create_role,
		routes::roles::get_role,
		routes::roles::update_role,
		routes::roles::delete_role,
		routes::departments::list_departments,
		routes::departments::create_department,
		routes::departments::delete_department,
		routes::employees::list_employees,
		routes::employees::get_employee,
		routes::employees::create_employee,
		routes::employees::update_employee,
		routes::employees::delete_employee,
		routes::tasks::list_tasks,
		routes::tasks::create_task,
		routes::tasks::get_task,
		routes::tasks::update_task,
		routes::tasks::delete_task,
		routes::progress::list_progress,
		routes::progress::append_progress,
		routes::progress::progress_feed,
		routes::attendance::record_attendance,
		routes::attendance::list_own_attendance,
		routes::attendance::list_all_attendance,
		routes::lunch::log_lunch,
		routes::lunch::list_lunch,
		routes::lunch::lunch_summary,
		routes::holidays::list_holidays,
		routes::holidays::create_holiday,
		routes::holidays::delete_holiday,
		routes::holiday_requests::create_request,
		routes::holiday_requests::list_requests,
		routes::holiday_requests::decide_request,
		routes::messages::broadcast,
		routes::messages::list_messages,
		routes::notifications::create_notification,
		routes::notifications::list_notifications,
		routes::notifications::mark_read,
		routes::notifications::delete_notification,
		routes::pings::record_ping,
		routes::pings::list_pings
	),
	components(
		schemas(
			authz::PermissionSet,
			routes::MessageResponse,
			routes::health::HealthResponse,
			routes::auth::AdminLoginRequest,
			routes::auth::AdminLoginResponse,
			routes::auth::LoginRequest,
			routes::auth::LoginResponse,
			routes::auth::CallerKind,
			routes::auth::MeResponse,
			models::role::Role,
			models::role::RoleCreateRequest,
			models::role::RoleUpdateRequest,
			models::department::Department,
			models::department::DepartmentCreateRequest,
			models::employee::Employee,
			models::employee::EmployeeCreateRequest,
			models::employee::EmployeeUpdateRequest,
			models::task::Task,
			models::task::TaskPriority,
			models::task::TaskStatus,
			models::task::TaskCreateRequest,
			models::task::TaskUpdateRequest,
			models::progress::ProgressUpdate,
			models::progress::ProgressCreateRequest,
			models::progress::ProgressFeedEntry,
			models::attendance::Attendance,
			models::attendance::AttendanceKind,
			models::attendance::AttendanceCreateRequest,
			models::attendance::AttendancePage,
			models::lunch::LunchLog,
			models::lunch::LunchEvent,
			models::lunch::LunchLogRequest,
			models::lunch::LunchSummary,
			models::holiday::Holiday,
			models::holiday::HolidayCreateRequest,
			models::holiday::HolidayRequest,
			models::holiday::HolidayRequestStatus,
			models::holiday::HolidayRequestCreate,
			models::holiday::HolidayRequestDecision,
			models::message::BroadcastMessage,
			models::message::BroadcastRequest,
			models::notification::Notification,
			models::notification::NotificationKind,
			models::notification::NotificationCreateRequest,
			models::ping::Ping,
			models::ping::PingRequest
		)
	),
	tags(
		(name = "Health", description = "Liveness"),
		(name = "Auth", description = "Admin and employee sessions"),
		(name = "Roles", description = "Roles and their permission sets"),
		(name = "Departments", description = "Departments"),
		(name = "Employees", description = "Employee directory"),
		(name = "Tasks", description = "Task assignment and visibility"),
		(name = "Progress", description = "Append-only task progress"),
		(name = "Attendance", description = "Check-in and check-out"),
		(name = "Lunch", description = "Lunch breaks"),
		(name = "Holidays", description = "Company holidays and holiday requests"),
		(name = "Messages", description = "Broadcast messages"),
		(name = "Notifications", description = "Direct notifications"),
		(name = "Presence", description = "Presence pings")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	normalize_path_operations(&mut doc);
	ensure_security_components(&mut doc)?;
	ensure_global_security(&mut doc)?;
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);
	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

// Method keys must be lowercase for Swagger UI to pick them up.
fn normalize_path_operations(doc: &mut Value) {
	if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
		let snapshot = paths.clone();
		for (path, item) in snapshot {
			if let Some(ops) = item.as_object() {
				let mut normalized = Map::new();
				for (method, val) in ops {
					let key = method.to_lowercase();
					if let Some(existing) = normalized.get_mut(&key) {
						merge_values(existing, val);
					} else {
						normalized.insert(key, val.clone());
					}
				}
				paths.insert(path, Value::Object(normalized));
			}
		}
	}
}

fn object_entry<'a>(value: &'a mut Value, key: &str) -> anyhow::Result<&'a mut Map<String, Value>> {
	value
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI node holding `{key}` is not an object"))?
		.entry(key)
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI `{key}` is not an object"))
}

/// Every way a caller can identify itself: bearer JWT, either session cookie, or the
/// trusted-client id header.
fn ensure_security_components(doc: &mut Value) -> anyhow::Result<()> {
	let components = object_entry(doc, "components")?;
	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("securitySchemes is not an object"))?;

	schemes.insert(
		"bearerAuth".to_string(),
		json!({ "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }),
	);
	schemes.insert(
		"adminCookie".to_string(),
		json!({ "type": "apiKey", "in": "cookie", "name": ADMIN_COOKIE }),
	);
	schemes.insert(
		"employeeCookie".to_string(),
		json!({ "type": "apiKey", "in": "cookie", "name": EMPLOYEE_COOKIE }),
	);
	schemes.insert(
		"userIdHeader".to_string(),
		json!({ "type": "apiKey", "in": "header", "name": USER_ID_HEADER }),
	);

	Ok(())
}

fn ensure_global_security(doc: &mut Value) -> anyhow::Result<()> {
	doc.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI root is not an object"))?
		.entry("security")
		.or_insert_with(|| {
			json!([
				{ "bearerAuth": [] },
				{ "adminCookie": [] },
				{ "employeeCookie": [] },
				{ "userIdHeader": [] }
			])
		});
	Ok(())
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{port}");

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr
				.iter()
				.any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}

fn merge_values(target: &mut Value, addition: &Value) {
	match (target, addition) {
		(Value::Object(dest), Value::Object(src)) => {
			for (key, value) in src {
				if let Some(existing) = dest.get_mut(key) {
					merge_values(existing, value);
				} else {
					dest.insert(key.clone(), value.clone());
				}
			}
		}
		(Value::Array(dest), Value::Array(src)) => {
			for item in src {
				if !dest.contains(item) {
					dest.push(item.clone());
				}
			}
		}
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn document_lists_task_routes_and_identity_schemes() {
		let doc = serde_json::to_value(build_openapi(8000).unwrap()).unwrap();

		assert!(doc.pointer("/paths/~1api~1tasks/get").is_some());
		assert!(doc.pointer("/paths/~1api~1tasks~1{id}~1progress/post").is_some());
		assert!(doc.pointer("/components/securitySchemes/userIdHeader").is_some());
		assert!(doc.pointer("/components/schemas/PermissionSet").is_some());
		assert_eq!(doc.pointer("/servers/0/url").and_then(Value::as_str), Some("http://localhost:8000"));
	}
}
