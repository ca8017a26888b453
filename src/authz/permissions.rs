use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Named capability flags attached to a role.
///
/// Stored as a JSON object on the role row. Keys absent from stored data read as
/// `false`, so older rows that predate a flag never grant it by accident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionSet {
    pub can_check_in: bool,
    pub can_manage_employees: bool,
    pub can_manage_departments: bool,
    pub can_manage_roles: bool,
    pub can_assign_tasks: bool,
    pub can_view_all_tasks: bool,
    pub can_view_tasks: bool,
    pub can_view_reports: bool,
}

impl PermissionSet {
    /// The set used when an employee has no resolvable role. Every flag is off,
    /// `canViewTasks` included.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every flag on. Reported for the admin principal.
    pub fn all() -> Self {
        Self {
            can_check_in: true,
            can_manage_employees: true,
            can_manage_departments: true,
            can_manage_roles: true,
            can_assign_tasks: true,
            can_view_all_tasks: true,
            can_view_tasks: true,
            can_view_reports: true,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::CheckIn => self.can_check_in,
            Permission::ManageEmployees => self.can_manage_employees,
            Permission::ManageDepartments => self.can_manage_departments,
            Permission::ManageRoles => self.can_manage_roles,
            Permission::AssignTasks => self.can_assign_tasks,
            Permission::ViewAllTasks => self.can_view_all_tasks,
            Permission::ViewTasks => self.can_view_tasks,
            Permission::ViewReports => self.can_view_reports,
        }
    }

    /// Parse the stored JSON column. Malformed documents degrade to [`PermissionSet::none`].
    pub fn from_stored(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(set) => set,
            Err(err) => {
                tracing::warn!(error = %err, "unreadable permission document, treating as empty");
                Self::none()
            }
        }
    }

    pub fn to_stored(&self) -> String {
        // a struct of bools always serializes
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    CheckIn,
    ManageEmployees,
    ManageDepartments,
    ManageRoles,
    AssignTasks,
    ViewAllTasks,
    ViewTasks,
    ViewReports,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CheckIn => "canCheckIn",
            Permission::ManageEmployees => "canManageEmployees",
            Permission::ManageDepartments => "canManageDepartments",
            Permission::ManageRoles => "canManageRoles",
            Permission::AssignTasks => "canAssignTasks",
            Permission::ViewAllTasks => "canViewAllTasks",
            Permission::ViewTasks => "canViewTasks",
            Permission::ViewReports => "canViewReports",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_read_as_false() {
        let set = PermissionSet::from_stored(r#"{"canAssignTasks": true}"#);
        assert!(set.can_assign_tasks);
        assert!(!set.can_view_tasks);
        assert!(!set.can_view_all_tasks);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let set = PermissionSet::from_stored(r#"{"canFly": true, "canCheckIn": true}"#);
        assert_eq!(
            set,
            PermissionSet {
                can_check_in: true,
                ..PermissionSet::none()
            }
        );
    }

    #[test]
    fn garbage_degrades_to_empty_set() {
        assert_eq!(PermissionSet::from_stored("not json"), PermissionSet::none());
    }

    #[test]
    fn default_set_denies_task_viewing() {
        assert!(!PermissionSet::none().allows(Permission::ViewTasks));
    }

    #[test]
    fn stored_form_uses_wire_names() {
        let stored = PermissionSet::all().to_stored();
        assert!(stored.contains("\"canViewAllTasks\":true"));
        assert_eq!(PermissionSet::from_stored(&stored), PermissionSet::all());
    }
}
