use super::permissions::Permission;
use super::principal::{Access, Caller};

/// Decides whether an access grant covers a permission.
pub trait PolicyEvaluator: Send + Sync {
    fn can(&self, access: &Access, permission: Permission) -> bool;
}

/// Evaluation order:
/// 1. admin principal -> allow
/// 2. flag set on the resolved permission set -> allow
/// 3. deny
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicyEvaluator;

impl PolicyEvaluator for DefaultPolicyEvaluator {
    fn can(&self, access: &Access, permission: Permission) -> bool {
        let employee_id = match &access.caller {
            Caller::Admin { username } => {
                tracing::debug!(%username, %permission, "admin bypass");
                return true;
            }
            Caller::Employee { id } => *id,
        };

        let allowed = access.permissions.allows(permission);
        tracing::debug!(%employee_id, %permission, allowed, "permission check");
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::PermissionSet;
    use uuid::Uuid;

    const EVERY_PERMISSION: [Permission; 8] = [
        Permission::CheckIn,
        Permission::ManageEmployees,
        Permission::ManageDepartments,
        Permission::ManageRoles,
        Permission::AssignTasks,
        Permission::ViewAllTasks,
        Permission::ViewTasks,
        Permission::ViewReports,
    ];

    #[test]
    fn admin_passes_every_check_even_with_an_empty_set() {
        let access = Access {
            caller: Caller::Admin { username: "root".into() },
            permissions: PermissionSet::none(),
            role_id: None,
        };

        for permission in EVERY_PERMISSION {
            assert!(DefaultPolicyEvaluator.can(&access, permission), "{permission}");
        }
    }

    #[test]
    fn employee_gets_exactly_the_flags_on_their_set() {
        let access = Access {
            caller: Caller::Employee { id: Uuid::new_v4() },
            permissions: PermissionSet {
                can_check_in: true,
                can_view_tasks: true,
                ..PermissionSet::none()
            },
            role_id: None,
        };

        for permission in EVERY_PERMISSION {
            let expected = matches!(permission, Permission::CheckIn | Permission::ViewTasks);
            assert_eq!(DefaultPolicyEvaluator.can(&access, permission), expected, "{permission}");
        }
    }
}
