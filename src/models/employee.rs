use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::RoleRef;
use crate::errors::AppError;
use crate::events::Loggable;

/// Employee record as exposed over HTTP. The password hash never leaves the row type.
///
/// Exactly one of `roleId` / `roleName` is set when the employee has a role,
/// mirroring how the role was written.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub position: Option<String>,
    pub department_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub role_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbEmployee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub position: Option<String>,
    pub department_id: Option<Uuid>,
    pub password_hash: String,
    pub role_kind: Option<String>,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbEmployee {
    pub fn role_ref(&self) -> Option<RoleRef> {
        RoleRef::from_stored(self.role_kind.as_deref(), self.role.as_deref())
    }
}

impl TryFrom<DbEmployee> for Employee {
    type Error = AppError;

    fn try_from(value: DbEmployee) -> Result<Self, Self::Error> {
        let (role_id, role_name) = match value.role_ref() {
            Some(RoleRef::Id(id)) => (Some(id), None),
            Some(RoleRef::Name(name)) => (None, Some(name)),
            None => (None, None),
        };

        Ok(Employee {
            id: value.id,
            name: value.name,
            email: value.email,
            position: value.position,
            department_id: value.department_id,
            role_id,
            role_name,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl Loggable for Employee {
    fn entity_type() -> &'static str {
        "employee"
    }

    fn subject_id(&self) -> Uuid {
        self.id
    }
}

pub const EMPLOYEE_COLUMNS: &str =
    "id, name, email, position, department_id, password_hash, role_kind, role, created_at, updated_at";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCreateRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
    pub position: Option<String>,
    pub department_id: Option<Uuid>,
    /// Store the role as a reference.
    pub role_id: Option<Uuid>,
    /// Store the role as a plain name.
    pub role_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub position: Option<String>,
    pub department_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub role_name: Option<String>,
}

/// Pick the stored role form from a request that may carry either field.
pub fn requested_role(role_id: Option<Uuid>, role_name: Option<&str>) -> Result<Option<RoleRef>, AppError> {
    match (role_id, role_name.map(str::trim)) {
        (Some(_), Some(_)) => Err(AppError::bad_request("give either roleId or roleName, not both")),
        (Some(id), None) => Ok(Some(RoleRef::Id(id))),
        (None, Some("")) => Err(AppError::bad_request("roleName must not be empty")),
        (None, Some(name)) => Ok(Some(RoleRef::Name(name.to_string()))),
        (None, None) => Ok(None),
    }
}
