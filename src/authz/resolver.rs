use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::permissions::PermissionSet;
use crate::errors::AppResult;
use crate::models::role::{DbRole, Role, ROLE_COLUMNS};

/// How an employee row points at its role.
///
/// Both forms exist in stored data: some write paths store the role id, others
/// the role's name. Nothing outside this module branches on the difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRef {
    Id(Uuid),
    Name(String),
}

impl RoleRef {
    /// Build from the `role_kind` / `role` column pair.
    ///
    /// A value tagged as an id that does not parse is treated as a name, which is
    /// what older rows that stored names without a tag look like.
    pub fn from_stored(kind: Option<&str>, value: Option<&str>) -> Option<Self> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;

        match kind {
            Some("id") => Some(
                Uuid::parse_str(value)
                    .map(RoleRef::Id)
                    .unwrap_or_else(|_| RoleRef::Name(value.to_string())),
            ),
            _ => Some(RoleRef::Name(value.to_string())),
        }
    }

    /// The `(role_kind, role)` column pair for this reference.
    pub fn to_stored(&self) -> (&'static str, String) {
        match self {
            RoleRef::Id(id) => ("id", id.to_string()),
            RoleRef::Name(name) => ("name", name.clone()),
        }
    }
}

/// Read access to the employee/role data the resolver needs.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// `None` when the employee does not exist or has no role.
    async fn employee_role_ref(&self, employee_id: Uuid) -> AppResult<Option<RoleRef>>;

    async fn role_by_id(&self, role_id: Uuid) -> AppResult<Option<Role>>;

    /// The oldest role with this name, when names repeat across departments.
    async fn role_by_name(&self, name: &str) -> AppResult<Option<Role>>;
}

#[async_trait]
impl RoleDirectory for SqlitePool {
    async fn employee_role_ref(&self, employee_id: Uuid) -> AppResult<Option<RoleRef>> {
        let row: Option<(Option<String>, Option<String>)> =
            sqlx::query_as("SELECT role_kind, role FROM employees WHERE id = ?")
                .bind(employee_id)
                .fetch_optional(self)
                .await?;

        Ok(row.and_then(|(kind, value)| RoleRef::from_stored(kind.as_deref(), value.as_deref())))
    }

    async fn role_by_id(&self, role_id: Uuid) -> AppResult<Option<Role>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?");
        let row = sqlx::query_as::<_, DbRole>(&sql)
            .bind(role_id)
            .fetch_optional(self)
            .await?;

        row.map(Role::try_from).transpose()
    }

    async fn role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = ? ORDER BY created_at ASC LIMIT 1");
        let row = sqlx::query_as::<_, DbRole>(&sql)
            .bind(name)
            .fetch_optional(self)
            .await?;

        row.map(Role::try_from).transpose()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRole {
    pub role: Option<Role>,
    pub permissions: PermissionSet,
}

impl ResolvedRole {
    pub fn unresolved() -> Self {
        Self {
            role: None,
            permissions: PermissionSet::none(),
        }
    }

    pub fn role_id(&self) -> Option<Uuid> {
        self.role.as_ref().map(|role| role.id)
    }

    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|role| role.name.as_str())
    }
}

/// Resolve an employee's effective role and permission set.
///
/// Missing employees, employees without a role, dangling role ids and names
/// matching no role all resolve to the empty set. Only storage failures error.
pub async fn resolve_role<D>(directory: &D, employee_id: Uuid) -> AppResult<ResolvedRole>
where
    D: RoleDirectory + ?Sized,
{
    let Some(role_ref) = directory.employee_role_ref(employee_id).await? else {
        tracing::debug!(%employee_id, "no role on record, using default permissions");
        return Ok(ResolvedRole::unresolved());
    };

    let role = match &role_ref {
        RoleRef::Id(role_id) => directory.role_by_id(*role_id).await?,
        RoleRef::Name(name) => directory.role_by_name(name).await?,
    };

    match role {
        Some(role) => Ok(ResolvedRole {
            permissions: role.permissions,
            role: Some(role),
        }),
        None => {
            tracing::debug!(%employee_id, role = ?role_ref, "role reference did not resolve");
            Ok(ResolvedRole::unresolved())
        }
    }
}
