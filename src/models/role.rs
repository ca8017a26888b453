use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::PermissionSet;
use crate::errors::AppError;
use crate::events::{Loggable, Severity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub department_id: Option<Uuid>,
    pub permissions: PermissionSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRole {
    pub id: Uuid,
    pub name: String,
    pub department_id: Option<Uuid>,
    pub permissions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbRole> for Role {
    type Error = AppError;

    fn try_from(value: DbRole) -> Result<Self, Self::Error> {
        Ok(Role {
            id: value.id,
            name: value.name,
            department_id: value.department_id,
            permissions: PermissionSet::from_stored(&value.permissions),
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl Loggable for Role {
    fn entity_type() -> &'static str {
        "role"
    }

    fn subject_id(&self) -> Uuid {
        self.id
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }
}

pub const ROLE_COLUMNS: &str = "id, name, department_id, permissions, created_at, updated_at";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleCreateRequest {
    #[schema(example = "Team Lead")]
    pub name: String,
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub permissions: PermissionSet,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdateRequest {
    pub name: Option<String>,
    pub department_id: Option<Uuid>,
    pub permissions: Option<PermissionSet>,
}
