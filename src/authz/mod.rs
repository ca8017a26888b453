//! Authorization core.
//!
//! A request is identified from its headers ([`identify`]), the employee's role is
//! resolved into a [`PermissionSet`] ([`resolve_role`]), and the resulting
//! [`Access`] gates handlers. Task reads go through [`task_filter`]; task writes
//! through [`mutation_rights`] and [`ensure_progress_author`].
//!
//! Nothing is cached between requests: roles may change at any time.

mod caller;
mod evaluator;
mod permissions;
mod principal;
mod resolver;
mod visibility;

pub use caller::{identify, ADMIN_COOKIE, EMPLOYEE_COOKIE, USER_ID_HEADER};
pub use evaluator::{DefaultPolicyEvaluator, PolicyEvaluator};
pub use permissions::{Permission, PermissionSet};
pub use principal::{Access, Caller};
pub use resolver::{resolve_role, ResolvedRole, RoleDirectory, RoleRef};
pub use visibility::{
    ensure_progress_author, ensure_visible, mutation_rights, task_filter, MutationRights, TaskFilter, TaskScope,
};
