mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{manager, viewer, As, TestApp};
use workforce_desk::authz::{PermissionSet, RoleRef};

#[tokio::test]
async fn forbidden_update_leaves_the_task_untouched() -> Result<()> {
    let t = TestApp::new().await?;
    let cohort = t.role("Cohort", viewer()).await?;
    let owner = t.employee("Lou", Some(RoleRef::Id(cohort))).await?;
    let peer = t.employee("Max", Some(RoleRef::Id(cohort))).await?;
    let task = t.task("Shared visibility", owner).await?;

    let (_, before) = t.get(&format!("/api/tasks/{task}"), As::Admin).await?;

    // the peer can see the task through the role snapshot but may not change it
    let (status, _) = t
        .put(
            &format!("/api/tasks/{task}"),
            As::Employee(peer),
            json!({ "title": "hijacked", "status": "completed" }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.delete(&format!("/api/tasks/{task}"), As::Employee(peer)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, after) = t.get(&format!("/api/tasks/{task}"), As::Admin).await?;
    assert_eq!(before, after);

    Ok(())
}

#[tokio::test]
async fn assignee_changes_only_description_and_status() -> Result<()> {
    let t = TestApp::new().await?;
    let owner = t.employee("Ned", None).await?;
    let other = t.employee("Oli", None).await?;
    let task = t.task("Write report", owner).await?;

    let (status, body) = t
        .put(
            &format!("/api/tasks/{task}"),
            As::Employee(owner),
            json!({
                "title": "Renamed",
                "priority": "high",
                "assignedTo": other,
                "description": "first draft done",
                "status": "in-progress"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["title"], json!("Write report"));
    assert_eq!(body["priority"], json!("medium"));
    assert_eq!(body["assignedTo"], json!(owner.to_string()));
    assert_eq!(body["description"], json!("first draft done"));
    assert_eq!(body["status"], json!("in-progress"));

    Ok(())
}

#[tokio::test]
async fn reassignment_recomputes_the_role_snapshot() -> Result<()> {
    let t = TestApp::new().await?;
    let lead_role = t.role("Lead", manager()).await?;
    let r1 = t.role("Design", viewer()).await?;
    let r2 = t.role("Build", viewer()).await?;

    let lead = t.employee("Pat", Some(RoleRef::Id(lead_role))).await?;
    let first = t.employee("Quin", Some(RoleRef::Id(r1))).await?;
    let second = t.employee("Rae", Some(RoleRef::Name("Build".into()))).await?;
    let roleless = t.employee("Sol", None).await?;

    let (status, body) = t
        .post(
            "/api/tasks",
            As::Employee(lead),
            json!({ "title": "Mockups", "assignedTo": first, "dueDate": "2030-02-01" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["role"], json!(r1.to_string()));
    assert_eq!(body["assignedBy"], json!(lead.to_string()));
    let task = common::id_of(&body)?;

    // a role stored by name resolves to the same snapshot as one stored by id
    let (status, body) = t
        .put(&format!("/api/tasks/{task}"), As::Employee(lead), json!({ "assignedTo": second }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], json!(r2.to_string()));

    let (_, body) = t
        .put(&format!("/api/tasks/{task}"), As::Admin, json!({ "assignedTo": roleless }))
        .await?;
    assert_eq!(body["role"], Value::Null);
    assert_eq!(body["assignedTo"], json!(roleless.to_string()));

    let missing = uuid::Uuid::new_v4();
    let (status, _) = t
        .put(&format!("/api/tasks/{task}"), As::Admin, json!({ "assignedTo": missing }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn managers_and_assignees_may_delete() -> Result<()> {
    let t = TestApp::new().await?;
    let owner = t.employee("Tam", None).await?;
    let first = t.task("Disposable", owner).await?;
    let second = t.task("Also disposable", owner).await?;

    let (status, _) = t.delete(&format!("/api/tasks/{first}"), As::Employee(owner)).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.delete(&format!("/api/tasks/{second}"), As::Admin).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t.get(&format!("/api/tasks/{first}"), As::Admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn admin_bypasses_every_permission_check() -> Result<()> {
    let t = TestApp::new().await?;
    let (status, body) = t
        .post(
            "/api/roles",
            As::Admin,
            json!({ "name": "Empty", "permissions": PermissionSet::none() }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = t.get("/api/me", As::Admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], json!("admin"));
    assert_eq!(body["permissions"], serde_json::to_value(PermissionSet::all())?);

    let who = t.employee("Uma", None).await?;
    let task = t.task("Admin made", who).await?;
    let (status, body) = t.get(&format!("/api/tasks/{task}"), As::Admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignedBy"], json!("admin:admin"));

    Ok(())
}
