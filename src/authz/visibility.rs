use uuid::Uuid;

use super::permissions::Permission;
use super::principal::Access;
use crate::errors::{AppError, AppResult};
use crate::models::task::{Task, TaskUpdateRequest};

/// Which tasks a caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskScope {
    /// Admin or `canViewAllTasks`.
    Everything,
    /// `canViewTasks`: own tasks plus tasks whose role snapshot is the caller's
    /// current role. The role branch drops out when the caller has no role.
    AssignedOrRole { employee_id: Uuid, role_id: Option<Uuid> },
    /// Own tasks only.
    AssignedOnly { employee_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub scope: TaskScope,
    /// Narrowing requested by the caller. Never set for [`TaskScope::AssignedOnly`].
    pub assigned_to: Option<Uuid>,
}

pub fn task_filter(access: &Access, requested_assigned_to: Option<Uuid>) -> TaskFilter {
    let scope = match access.employee_id() {
        None => TaskScope::Everything,
        Some(_) if access.can(Permission::ViewAllTasks) => TaskScope::Everything,
        Some(employee_id) if access.can(Permission::ViewTasks) => TaskScope::AssignedOrRole {
            employee_id,
            role_id: access.role_id,
        },
        Some(employee_id) => TaskScope::AssignedOnly { employee_id },
    };

    let assigned_to = match scope {
        TaskScope::AssignedOnly { .. } => None,
        _ => requested_assigned_to,
    };

    tracing::debug!(actor = %access.caller.actor(), ?scope, ?assigned_to, "task filter");
    TaskFilter { scope, assigned_to }
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let in_scope = match &self.scope {
            TaskScope::Everything => true,
            TaskScope::AssignedOrRole { employee_id, role_id } => {
                task.assigned_to == *employee_id || (role_id.is_some() && task.role == *role_id)
            }
            TaskScope::AssignedOnly { employee_id } => task.assigned_to == *employee_id,
        };

        in_scope && self.assigned_to.map_or(true, |wanted| task.assigned_to == wanted)
    }

    /// SQL predicate over the `tasks` table plus its positional binds, in order.
    pub fn sql_predicate(&self) -> (String, Vec<Uuid>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        match &self.scope {
            TaskScope::Everything => {}
            TaskScope::AssignedOrRole {
                employee_id,
                role_id: Some(role_id),
            } => {
                clauses.push("(assigned_to = ? OR role_id = ?)".to_string());
                binds.push(*employee_id);
                binds.push(*role_id);
            }
            TaskScope::AssignedOrRole {
                employee_id,
                role_id: None,
            }
            | TaskScope::AssignedOnly { employee_id } => {
                clauses.push("assigned_to = ?".to_string());
                binds.push(*employee_id);
            }
        }

        if let Some(wanted) = self.assigned_to {
            clauses.push("assigned_to = ?".to_string());
            binds.push(wanted);
        }

        if clauses.is_empty() {
            ("1 = 1".to_string(), binds)
        } else {
            (clauses.join(" AND "), binds)
        }
    }
}

pub fn ensure_visible(access: &Access, task: &Task) -> AppResult<()> {
    if task_filter(access, None).matches(task) {
        Ok(())
    } else {
        Err(AppError::forbidden("task is not visible to this caller"))
    }
}

/// What a caller may do to an existing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationRights {
    /// `canAssignTasks` (admin included): every field, reassignment included.
    Manager,
    /// The assignee without manager rights: `description` and `status` only.
    Assignee,
}

pub fn mutation_rights(access: &Access, task: &Task) -> AppResult<MutationRights> {
    if access.can(Permission::AssignTasks) {
        return Ok(MutationRights::Manager);
    }

    if access.is_employee(task.assigned_to) {
        return Ok(MutationRights::Assignee);
    }

    tracing::debug!(actor = %access.caller.actor(), task_id = %task.id, "task mutation denied");
    Err(AppError::forbidden("only the assignee or a task manager may change this task"))
}

impl MutationRights {
    /// Drop the fields this caller class may not change. Dropped fields are
    /// ignored, not rejected.
    pub fn scope_update(self, update: TaskUpdateRequest) -> TaskUpdateRequest {
        match self {
            MutationRights::Manager => update,
            MutationRights::Assignee => TaskUpdateRequest {
                description: update.description,
                status: update.status,
                ..TaskUpdateRequest::default()
            },
        }
    }
}

/// Progress may only be written by the task's own assignee. Managers and the
/// admin reassign instead.
pub fn ensure_progress_author(access: &Access, task: &Task) -> AppResult<()> {
    if access.is_employee(task.assigned_to) {
        Ok(())
    } else {
        tracing::debug!(actor = %access.caller.actor(), task_id = %task.id, "progress append denied");
        Err(AppError::forbidden("only the assignee may post progress"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{Caller, PermissionSet};
    use crate::models::task::{TaskPriority, TaskStatus};
    use chrono::Utc;

    fn task(assigned_to: Uuid, role: Option<Uuid>) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "Quarterly numbers".into(),
            description: String::new(),
            assigned_by: "admin:root".into(),
            assigned_to,
            role,
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            due_date: now,
            progress_updates: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn employee(id: Uuid, role_id: Option<Uuid>, permissions: PermissionSet) -> Access {
        Access {
            caller: Caller::Employee { id },
            permissions,
            role_id,
        }
    }

    fn viewer() -> PermissionSet {
        PermissionSet {
            can_view_tasks: true,
            ..PermissionSet::none()
        }
    }

    #[test]
    fn role_cohort_sees_snapshot_matches_only() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (r1, r2) = (Uuid::new_v4(), Uuid::new_v4());
        let t1 = task(a, Some(r1));
        let t2 = task(b, Some(r2));

        let as_r1 = task_filter(&employee(a, Some(r1), viewer()), None);
        assert!(as_r1.matches(&t1));
        assert!(!as_r1.matches(&t2));

        // the caller side is live: moving A to R2 exposes T2's cohort, T1 stays visible as A's own
        let as_r2 = task_filter(&employee(a, Some(r2), viewer()), None);
        assert!(as_r2.matches(&t1));
        assert!(as_r2.matches(&t2));

        let c = Uuid::new_v4();
        let peer = task_filter(&employee(c, Some(r1), viewer()), None);
        assert!(peer.matches(&t1));
        assert!(!peer.matches(&t2));
    }

    #[test]
    fn viewer_without_role_sees_only_own_tasks() {
        let me = Uuid::new_v4();
        let filter = task_filter(&employee(me, None, viewer()), None);

        assert!(filter.matches(&task(me, None)));
        // a null snapshot never matches a missing role
        assert!(!filter.matches(&task(Uuid::new_v4(), None)));
        assert_eq!(filter.sql_predicate(), ("assigned_to = ?".to_string(), vec![me]));
    }

    #[test]
    fn requested_assignee_is_ignored_without_view_flags() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let filter = task_filter(&employee(me, None, PermissionSet::none()), Some(other));

        assert_eq!(filter.assigned_to, None);
        assert!(filter.matches(&task(me, None)));
        assert!(!filter.matches(&task(other, None)));
    }

    #[test]
    fn admin_and_view_all_are_unrestricted_but_can_narrow() {
        let other = Uuid::new_v4();
        let admin = task_filter(&Access::admin("root"), None);
        assert_eq!(admin.scope, TaskScope::Everything);
        assert_eq!(admin.sql_predicate(), ("1 = 1".to_string(), vec![]));

        let all = PermissionSet {
            can_view_all_tasks: true,
            ..PermissionSet::none()
        };
        let narrowed = task_filter(&employee(Uuid::new_v4(), None, all), Some(other));
        assert!(narrowed.matches(&task(other, None)));
        assert!(!narrowed.matches(&task(Uuid::new_v4(), None)));
    }

    #[test]
    fn predicate_binds_follow_clause_order() {
        let (me, role, wanted) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let filter = task_filter(&employee(me, Some(role), viewer()), Some(wanted));
        let (sql, binds) = filter.sql_predicate();

        assert_eq!(sql, "(assigned_to = ? OR role_id = ?) AND assigned_to = ?");
        assert_eq!(binds, vec![me, role, wanted]);
    }

    #[test]
    fn assignee_updates_are_scoped_to_description_and_status() {
        let me = Uuid::new_v4();
        let t = task(me, None);
        let rights = mutation_rights(&employee(me, None, PermissionSet::none()), &t).unwrap();
        assert_eq!(rights, MutationRights::Assignee);

        let scoped = rights.scope_update(TaskUpdateRequest {
            title: Some("renamed".into()),
            description: Some("notes".into()),
            status: Some(TaskStatus::Completed),
            assigned_to: Some(Uuid::new_v4()),
            ..TaskUpdateRequest::default()
        });

        assert_eq!(scoped.title, None);
        assert_eq!(scoped.assigned_to, None);
        assert_eq!(scoped.description.as_deref(), Some("notes"));
        assert_eq!(scoped.status, Some(TaskStatus::Completed));
    }

    #[test]
    fn strangers_cannot_mutate_and_managers_cannot_post_progress() {
        let t = task(Uuid::new_v4(), None);
        let stranger = employee(Uuid::new_v4(), None, viewer());
        assert!(mutation_rights(&stranger, &t).is_err());

        let manager = employee(
            Uuid::new_v4(),
            None,
            PermissionSet {
                can_assign_tasks: true,
                ..PermissionSet::none()
            },
        );
        assert_eq!(mutation_rights(&manager, &t).unwrap(), MutationRights::Manager);
        assert!(ensure_progress_author(&manager, &t).is_err());
        assert!(ensure_progress_author(&Access::admin("root"), &t).is_err());

        let assignee = employee(t.assigned_to, None, PermissionSet::none());
        assert!(ensure_progress_author(&assignee, &t).is_ok());
    }
}
