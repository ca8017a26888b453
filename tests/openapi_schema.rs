use serde_json::Value;

#[test]
fn openapi_exposes_task_and_permission_fields() -> anyhow::Result<()> {
    // Build the OpenAPI document the same way the server does
    let doc = workforce_desk::docs::build_openapi(8000)?;
    let v = serde_json::to_value(&doc)?;

    let props = |schema: &str| {
        v.pointer(&format!("/components/schemas/{schema}/properties"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    };

    let task = props("Task");
    for k in ["assignedBy", "assignedTo", "role", "dueDate", "progressUpdates"] {
        assert!(task.contains_key(k), "OpenAPI Task schema missing '{k}'");
    }

    let permissions = props("PermissionSet");
    for k in [
        "canCheckIn",
        "canManageEmployees",
        "canManageDepartments",
        "canManageRoles",
        "canAssignTasks",
        "canViewAllTasks",
        "canViewTasks",
        "canViewReports",
    ] {
        assert!(permissions.contains_key(k), "OpenAPI PermissionSet schema missing '{k}'");
    }

    assert!(v.pointer("/paths/~1api~1tasks~1progress/get").is_some());
    Ok(())
}
