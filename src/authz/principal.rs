use uuid::Uuid;

use super::evaluator::{DefaultPolicyEvaluator, PolicyEvaluator};
use super::permissions::{Permission, PermissionSet};
use super::resolver::{resolve_role, ResolvedRole, RoleDirectory};
use crate::errors::{AppError, AppResult};

/// Who is making the request.
///
/// The admin principal is never an employee row; it only exists as a verified
/// assertion carrying its username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Admin { username: String },
    Employee { id: Uuid },
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin { .. })
    }

    pub fn employee_id(&self) -> Option<Uuid> {
        match self {
            Caller::Employee { id } => Some(*id),
            Caller::Admin { .. } => None,
        }
    }

    /// Value recorded in `assignedBy`, `createdBy` and activity log actor columns.
    pub fn actor(&self) -> String {
        match self {
            Caller::Admin { username } => format!("admin:{username}"),
            Caller::Employee { id } => id.to_string(),
        }
    }
}

/// A caller together with the permissions resolved for this request.
#[derive(Debug, Clone)]
pub struct Access {
    pub caller: Caller,
    pub permissions: PermissionSet,
    /// The caller's current role, used to match task role snapshots.
    pub role_id: Option<Uuid>,
}

impl Access {
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            caller: Caller::Admin {
                username: username.into(),
            },
            permissions: PermissionSet::all(),
            role_id: None,
        }
    }

    pub fn employee(id: Uuid, resolved: &ResolvedRole) -> Self {
        Self {
            caller: Caller::Employee { id },
            permissions: resolved.permissions,
            role_id: resolved.role_id(),
        }
    }

    /// Resolve permissions for an identified caller. Runs once per request.
    pub async fn load<D>(directory: &D, caller: Caller) -> AppResult<Self>
    where
        D: RoleDirectory + ?Sized,
    {
        match caller {
            Caller::Admin { username } => Ok(Self::admin(username)),
            Caller::Employee { id } => {
                let resolved = resolve_role(directory, id).await?;
                Ok(Self::employee(id, &resolved))
            }
        }
    }

    pub fn is_admin(&self) -> bool {
        self.caller.is_admin()
    }

    pub fn employee_id(&self) -> Option<Uuid> {
        self.caller.employee_id()
    }

    pub fn is_employee(&self, id: Uuid) -> bool {
        self.employee_id() == Some(id)
    }

    pub fn can(&self, permission: Permission) -> bool {
        DefaultPolicyEvaluator.can(self, permission)
    }

    pub fn can_any(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.can(*p))
    }

    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("{permission} required")))
        }
    }

    pub fn require_any(&self, permissions: &[Permission]) -> AppResult<()> {
        if self.can_any(permissions) {
            return Ok(());
        }

        let names: Vec<&str> = permissions.iter().map(Permission::as_str).collect();
        Err(AppError::forbidden(format!("one of {} required", names.join(", "))))
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("admin only"))
        }
    }

    /// For endpoints that act on the caller's own employee record.
    pub fn require_employee(&self) -> AppResult<Uuid> {
        self.employee_id()
            .ok_or_else(|| AppError::forbidden("this action needs an employee identity"))
    }
}
