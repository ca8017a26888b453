use std::sync::Arc;

use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::events::{init_event_bus, start_activity_listener, EventBus};
use crate::routes::{
    attendance, auth, departments, employees, health, holiday_requests, holidays, lunch, messages, notifications,
    pings, progress, roles, tasks,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig, event_bus: EventBus) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            event_bus,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let config = AppConfig::from_env()?;
    create_app_with_config(pool, config).await
}

/// Build the router with explicit configuration and start the activity listener.
pub async fn create_app_with_config(pool: SqlitePool, config: AppConfig) -> Result<Router, AppError> {
    let (event_bus, rx) = init_event_bus();
    tokio::spawn(start_activity_listener(rx, pool.clone()));

    let state = AppState::new(pool, config, event_bus);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let admin_routes = Router::new()
        .route("/login", post(auth::admin_login))
        .route("/logout", post(auth::admin_logout))
        .route("/attendance", get(attendance::list_all_attendance))
        .route("/pings", get(pings::list_pings));

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    let role_routes = Router::new()
        .route("/", get(roles::list_roles).post(roles::create_role))
        .route("/:id", get(roles::get_role).put(roles::update_role).delete(roles::delete_role));

    let department_routes = Router::new()
        .route("/", get(departments::list_departments).post(departments::create_department))
        .route("/:id", delete(departments::delete_department));

    let employee_routes = Router::new()
        .route("/", get(employees::list_employees).post(employees::create_employee))
        .route(
            "/:id",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        );

    // the static `/progress` segment takes precedence over `/:id`
    let task_routes = Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/progress", get(progress::progress_feed))
        .route("/:id", get(tasks::get_task).put(tasks::update_task).delete(tasks::delete_task))
        .route("/:id/progress", get(progress::list_progress).post(progress::append_progress));

    let holiday_routes = Router::new()
        .route("/", get(holidays::list_holidays).post(holidays::create_holiday))
        .route("/:id", delete(holidays::delete_holiday));

    let holiday_request_routes = Router::new()
        .route("/", get(holiday_requests::list_requests).post(holiday_requests::create_request))
        .route("/:id", put(holiday_requests::decide_request));

    let message_routes = Router::new()
        .route("/", get(messages::list_messages))
        .route("/broadcast", post(messages::broadcast));

    let notification_routes = Router::new()
        .route("/", get(notifications::list_notifications).post(notifications::create_notification))
        .route("/:id", delete(notifications::delete_notification))
        .route("/:id/read", put(notifications::mark_read));

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/me", get(auth::me))
        .route("/attendance", get(attendance::list_own_attendance).post(attendance::record_attendance))
        .route("/lunch", get(lunch::list_lunch).post(lunch::log_lunch))
        .route("/lunch/summary", get(lunch::lunch_summary))
        .route("/pings", post(pings::record_ping))
        .nest("/admin", admin_routes)
        .nest("/auth", auth_routes)
        .nest("/roles", role_routes)
        .nest("/departments", department_routes)
        .nest("/employees", employee_routes)
        .nest("/tasks", task_routes)
        .nest("/holidays", holiday_routes)
        .nest("/holiday-requests", holiday_request_routes)
        .nest("/messages", message_routes)
        .nest("/notifications", notification_routes);

    let router = Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
