mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};

use common::{id_of, As, TestApp};
use workforce_desk::authz::{PermissionSet, RoleRef};

fn with(flags: impl FnOnce(&mut PermissionSet)) -> PermissionSet {
    let mut set = PermissionSet::none();
    flags(&mut set);
    set
}

#[tokio::test]
async fn attendance_uses_the_callers_identity() -> Result<()> {
    let t = TestApp::new().await?;
    let staff = t.role("Staff", with(|p| p.can_check_in = true)).await?;
    let worker = t.employee("Mia", Some(RoleRef::Id(staff))).await?;
    let outsider = t.employee("Noa", None).await?;

    let (status, body) = t
        .post(
            "/api/attendance",
            As::Employee(worker),
            json!({ "type": "checkin", "imageData": "selfie-ref", "employeeId": outsider }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["employeeId"], json!(worker.to_string()));
    assert_eq!(body["employeeName"], json!("Mia"));
    assert_eq!(body["type"], json!("checkin"));

    let (status, _) = t
        .post("/api/attendance", As::Employee(outsider), json!({ "type": "checkin" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.post("/api/attendance", As::Admin, json!({ "type": "checkout" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    t.post("/api/attendance", As::Employee(worker), json!({ "type": "checkout" })).await?;

    let (status, body) = t.get("/api/attendance", As::Employee(worker)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["type"], json!("checkout"));
    assert_eq!(body[1]["type"], json!("checkin"));

    let (status, _) = t.get("/api/admin/attendance", As::Employee(worker)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, page) = t.get("/api/admin/attendance?page=2&limit=1", As::Admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], json!(2));
    assert_eq!(page["totalPages"], json!(2));
    assert_eq!(page["currentPage"], json!(2));
    assert_eq!(page["attendance"][0]["type"], json!("checkin"));

    let (_, page) = t
        .get(&format!("/api/admin/attendance?employeeId={outsider}"), As::Admin)
        .await?;
    assert_eq!(page["total"], json!(0));

    let (status, body) = t
        .get(&format!("/api/admin/attendance?page={}&limit=100", i64::MAX), As::Admin)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("bad_request"));

    Ok(())
}

#[tokio::test]
async fn lunch_summary_pairs_start_and_end() -> Result<()> {
    let t = TestApp::new().await?;
    let eater = t.employee("Oz", None).await?;
    let other = t.employee("Pia", None).await?;

    let (status, body) = t.post("/api/lunch", As::Employee(eater), json!({ "type": "lunch-start" })).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    sqlx::query("DELETE FROM lunch_logs").execute(&t.pool).await?;

    let base = Utc.with_ymd_and_hms(2025, 3, 3, 12, 0, 0).unwrap();
    for (kind, minute) in [("lunch-start", 0), ("lunch-end", 30), ("lunch-start", 120), ("lunch-end", 135)] {
        sqlx::query("INSERT INTO lunch_logs (id, employee_id, type, timestamp) VALUES (?, ?, ?, ?)")
            .bind(uuid::Uuid::new_v4())
            .bind(eater)
            .bind(kind)
            .bind(base + Duration::minutes(minute))
            .execute(&t.pool)
            .await?;
    }

    let (status, body) = t.get("/api/lunch/summary", As::Employee(eater)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalMinutes"], json!(45.0));
    assert_eq!(body["breaks"], json!(2));

    let (status, _) = t.get(&format!("/api/lunch?employeeId={eater}"), As::Employee(other)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t.get(&format!("/api/lunch?employeeId={eater}"), As::Admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(4));

    let (status, _) = t.get("/api/lunch", As::Admin).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn holidays_and_requests() -> Result<()> {
    let t = TestApp::new().await?;
    let hr_role = t.role("HR", with(|p| p.can_manage_employees = true)).await?;
    let hr = t.employee("Quinn", Some(RoleRef::Id(hr_role))).await?;
    let worker = t.employee("Rex", None).await?;
    let peer = t.employee("Sia", None).await?;

    let (status, _) = t
        .post("/api/holidays", As::Employee(hr), json!({ "date": "2025-12-25" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t
        .post("/api/holidays", As::Admin, json!({ "date": "2025-12-25", "description": "Christmas" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let holiday = id_of(&body)?;

    let (status, _) = t.post("/api/holidays", As::Admin, json!({ "date": "2025-12-25" })).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = t.get("/api/holidays", As::Employee(worker)).await?;
    assert_eq!(body[0]["date"], json!("2025-12-25"));

    let (status, body) = t
        .post(
            "/api/holiday-requests",
            As::Employee(worker),
            json!({ "date": "2025-08-15", "message": "family trip" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], json!("pending"));
    assert_eq!(body["employeeName"], json!("Rex"));
    let request = id_of(&body)?;

    t.post(
        "/api/holiday-requests",
        As::Employee(peer),
        json!({ "date": "2025-08-16", "message": "wedding" }),
    )
    .await?;

    let (_, body) = t.get("/api/holiday-requests", As::Employee(worker)).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    let (_, body) = t.get("/api/holiday-requests", As::Employee(hr)).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let (status, _) = t
        .put(
            &format!("/api/holiday-requests/{request}"),
            As::Employee(worker),
            json!({ "status": "approved" }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t
        .put(
            &format!("/api/holiday-requests/{request}"),
            As::Employee(hr),
            json!({ "status": "approved" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("approved"));

    let (status, _) = t.delete(&format!("/api/holidays/{holiday}"), As::Admin).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.delete(&format!("/api/holidays/{holiday}"), As::Admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn broadcasts_reach_every_employee() -> Result<()> {
    let t = TestApp::new().await?;
    let reader = t.employee("Tia", None).await?;
    t.employee("Udo", None).await?;

    let (status, _) = t
        .post(
            "/api/messages/broadcast",
            As::Employee(reader),
            json!({ "subject": "hi", "body": "there" }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .post("/api/messages/broadcast", As::Admin, json!({ "subject": " ", "body": "x" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = t
        .post(
            "/api/messages/broadcast",
            As::Admin,
            json!({ "subject": "Office closed", "body": "Friday", "urgent": true }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["recipientCount"], json!(2));
    assert_eq!(body["createdBy"], json!("admin:admin"));

    let (status, body) = t.get("/api/messages", As::Employee(reader)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["subject"], json!("Office closed"));
    assert_eq!(body[0]["urgent"], json!(true));
    assert_eq!(body[0]["recipientCount"], json!(2));

    Ok(())
}

#[tokio::test]
async fn notifications_belong_to_their_recipient() -> Result<()> {
    let t = TestApp::new().await?;
    let to = t.employee("Val", None).await?;
    let other = t.employee("Wyn", None).await?;

    let (status, body) = t
        .post(
            "/api/notifications",
            As::Admin,
            json!({ "toEmployeeId": to, "message": "Please update your task", "type": "work_check" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["read"], json!(false));
    assert_eq!(body["from"], json!("admin:admin"));
    let id = id_of(&body)?;

    let (status, _) = t
        .post(
            "/api/notifications",
            As::Admin,
            json!({ "toEmployeeId": uuid::Uuid::new_v4(), "message": "nobody" }),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = t.get("/api/notifications", As::Employee(other)).await?;
    assert_eq!(body, Value::Array(vec![]));
    let (status, _) = t.get("/api/notifications", As::Admin).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = t.get(&format!("/api/notifications?employeeId={to}"), As::Admin).await?;
    assert_eq!(body[0]["type"], json!("work_check"));

    let uri = format!("/api/notifications/{id}/read");
    let (status, _) = t.put(&uri, As::Employee(other), json!({})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = t.put(&uri, As::Employee(to), json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["read"], json!(true));

    let (status, _) = t.delete(&format!("/api/notifications/{id}"), As::Employee(to)).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = t.get("/api/notifications", As::Employee(to)).await?;
    assert_eq!(body, Value::Array(vec![]));

    Ok(())
}

#[tokio::test]
async fn pings_are_listed_newest_first_for_reporters() -> Result<()> {
    let t = TestApp::new().await?;
    let who = t.employee("Xan", None).await?;

    let (status, body) = t
        .post("/api/pings", As::Employee(who), json!({ "timestamp": "2025-05-01T09:00:00Z" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let (status, _) = t.post("/api/pings", As::Employee(who), json!({})).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = t.get("/api/admin/pings", As::Employee(who)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t.get(&format!("/api/admin/pings?employeeId={who}"), As::Admin).await?;
    assert_eq!(status, StatusCode::OK);
    let pings = body.as_array().cloned().unwrap_or_default();
    assert_eq!(pings.len(), 2);
    assert_eq!(pings[1]["timestamp"], json!("2025-05-01T09:00:00Z"));

    Ok(())
}
