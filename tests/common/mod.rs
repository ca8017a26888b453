#![allow(dead_code)]

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use workforce_desk::authz::{PermissionSet, RoleRef};
use workforce_desk::config::{AdminCredentials, AppConfig, IdentityPolicy};
use workforce_desk::create_app_with_config;
use workforce_desk::jwt::JwtConfig;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-pass";

/// How a test request identifies itself.
#[derive(Debug, Clone, Copy)]
pub enum As {
    Anonymous,
    Admin,
    /// Declared through the `x-user-id` header.
    Employee(Uuid),
}

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub config: AppConfig,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_policy(IdentityPolicy::default()).await
    }

    pub async fn with_policy(identity: IdentityPolicy) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let db_path = dir.path().join("test.db");

        let opts = SqliteConnectOptions::new()
            .filename(db_path.as_path())
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePool::connect_with(opts).await?;

        let migrator =
            sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
        migrator.run(&pool).await?;

        let config = AppConfig {
            jwt: JwtConfig::new("test-secret", 24),
            admin: AdminCredentials::new(ADMIN_USER, ADMIN_PASSWORD),
            identity,
        };
        let app = create_app_with_config(pool.clone(), config.clone()).await?;

        Ok(Self {
            app,
            pool,
            config,
            _dir: dir,
        })
    }

    pub async fn role(&self, name: &str, permissions: PermissionSet) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO roles (id, name, department_id, permissions, created_at, updated_at) VALUES (?, ?, NULL, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(permissions.to_stored())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    /// Insert an employee directly. The stored hash is a placeholder; use
    /// [`TestApp::employee_with_password`] for login flows.
    pub async fn employee(&self, name: &str, role: Option<RoleRef>) -> Result<Uuid> {
        self.insert_employee(name, role, "not-a-real-hash".to_string()).await
    }

    pub async fn employee_with_password(&self, name: &str, role: Option<RoleRef>, password: &str) -> Result<Uuid> {
        let hash = workforce_desk::utils::hash_password(password)?;
        self.insert_employee(name, role, hash).await
    }

    async fn insert_employee(&self, name: &str, role: Option<RoleRef>, password_hash: String) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let (kind, value) = match role.as_ref().map(RoleRef::to_stored) {
            Some((kind, value)) => (Some(kind), Some(value)),
            None => (None, None),
        };

        sqlx::query(
            "INSERT INTO employees (id, name, email, position, department_id, password_hash, role_kind, role, created_at, updated_at) \
             VALUES (?, ?, ?, NULL, NULL, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(format!("{}@example.com", name.to_lowercase().replace(' ', ".")))
        .bind(password_hash)
        .bind(kind)
        .bind(value)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn set_role(&self, employee_id: Uuid, role: Option<RoleRef>) -> Result<()> {
        let (kind, value) = match role.as_ref().map(RoleRef::to_stored) {
            Some((kind, value)) => (Some(kind), Some(value)),
            None => (None, None),
        };
        sqlx::query("UPDATE employees SET role_kind = ?, role = ? WHERE id = ?")
            .bind(kind)
            .bind(value)
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn request(&self, method: &str, uri: &str, who: As, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        builder = match who {
            As::Anonymous => builder,
            As::Admin => {
                let token = self.config.jwt.encode_admin(ADMIN_USER)?;
                builder.header("cookie", format!("admin_token={token}"))
            }
            As::Employee(id) => builder.header("x-user-id", id.to_string()),
        };

        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, who: As) -> Result<(StatusCode, Value)> {
        self.request("GET", uri, who, None).await
    }

    pub async fn post(&self, uri: &str, who: As, body: Value) -> Result<(StatusCode, Value)> {
        self.request("POST", uri, who, Some(body)).await
    }

    pub async fn put(&self, uri: &str, who: As, body: Value) -> Result<(StatusCode, Value)> {
        self.request("PUT", uri, who, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, who: As) -> Result<(StatusCode, Value)> {
        self.request("DELETE", uri, who, None).await
    }

    /// Create a task as the admin and return its id.
    pub async fn task(&self, title: &str, assigned_to: Uuid) -> Result<Uuid> {
        let (status, body) = self
            .post(
                "/api/tasks",
                As::Admin,
                serde_json::json!({ "title": title, "assignedTo": assigned_to, "dueDate": "2030-01-15" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "task create failed: {status} {body}");
        id_of(&body)
    }
}

pub fn id_of(body: &Value) -> Result<Uuid> {
    let raw = body
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing id in {body}"))?;
    Ok(Uuid::parse_str(raw)?)
}

pub fn ids(body: &Value) -> Vec<String> {
    body.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn viewer() -> PermissionSet {
    PermissionSet {
        can_view_tasks: true,
        ..PermissionSet::none()
    }
}

pub fn manager() -> PermissionSet {
    PermissionSet {
        can_assign_tasks: true,
        can_view_all_tasks: true,
        ..PermissionSet::none()
    }
}
