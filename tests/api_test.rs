mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, HeaderValue, Request, StatusCode},
};
use schooldesk::api::router;
use schooldesk::db::repository;
use schooldesk::identity::{HeaderIdentityProvider, IdentityProvider, StaticIdentityProvider};
use schooldesk::models::{Principal, Role};
use schooldesk::state::AppState;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower::ServiceExt;

fn app(pool: SqlitePool, principal: Option<Principal>) -> Router {
    router(AppState {
        db: pool,
        identity: Arc::new(StaticIdentityProvider(principal)),
    })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn health_is_ok() {
    let pool = common::setup().await;
    let (status, _) = send(app(pool, None), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn forms_require_a_principal() {
    let pool = common::setup_seeded().await;
    let (status, body) = send(app(pool, None), get("/forms/result/create")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Sign in required");
}

#[tokio::test]
async fn form_container_scopes_teacher_lookups() {
    let pool = common::setup_seeded().await;
    let teacher = common::principal("t1", None, Some(Role::Teacher));

    let (status, body) = send(app(pool, Some(teacher)), get("/forms/exam/create")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table"], "exam");
    assert_eq!(body["type"], "create");
    assert_eq!(
        body["relatedData"]["lessons"],
        json!([{ "id": 1, "name": "Math 1A", "classId": 1 }])
    );
    assert_eq!(body["relatedData"]["classes"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn form_container_delete_is_empty() {
    let pool = common::setup_seeded().await;
    let admin = common::principal("a1", None, Some(Role::Admin));

    let (status, body) = send(app(pool, Some(admin)), get("/forms/lesson/delete")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["relatedData"], json!({}));
}

#[tokio::test]
async fn unknown_table_is_rejected() {
    let pool = common::setup_seeded().await;
    let admin = common::principal("a1", None, Some(Role::Admin));

    let (status, body) = send(app(pool, Some(admin)), get("/forms/library/create")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "400 Bad Request");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn malformed_result_body_is_a_json_bad_request() {
    let pool = common::setup_seeded().await;
    let admin = common::principal("a1", None, Some(Role::Admin));

    let request = Request::builder()
        .method("POST")
        .uri("/results")
        .header("content-type", "application/json")
        .body(Body::from("{\"studentId\": \"s1\", \"score\":"))
        .expect("request");
    let (status, body) = send(app(pool.clone(), Some(admin.clone())), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "400 Bad Request");

    let (status, body) = send(
        app(pool.clone(), Some(admin.clone())),
        json_request("POST", "/results", json!({ "studentId": 7, "examId": "ten" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send(
        app(pool, Some(admin)),
        json_request("PUT", "/results/abc", json!({ "studentId": "s1", "examId": 10, "score": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "400 Bad Request");
}

#[tokio::test]
async fn schedule_without_owner_is_a_json_bad_request() {
    let pool = common::setup_seeded().await;
    let admin = common::principal("a1", None, Some(Role::Admin));

    let (status, body) = send(app(pool, Some(admin)), get("/schedule?type=classId")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn create_result_persists_one_row() {
    let pool = common::setup_seeded().await;
    let teacher = common::principal("t1", None, Some(Role::Teacher));

    let (status, body) = send(
        app(pool.clone(), Some(teacher)),
        json_request(
            "POST",
            "/results",
            json!({ "studentId": "s1", "examId": 10, "score": 95 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "error": false }));

    let row = repository::find_result_by_id(&pool, 1)
        .await
        .expect("query")
        .expect("row inserted");
    assert_eq!(row.exam_id, Some(10));
    assert_eq!(row.assignment_id, None);
    assert_eq!(row.score, 95);
    assert_eq!(row.student_id, "s1");
}

#[tokio::test]
async fn create_result_with_both_references_is_invalid() {
    let pool = common::setup_seeded().await;
    let admin = common::principal("a1", None, Some(Role::Admin));

    let (status, body) = send(
        app(pool.clone(), Some(admin)),
        json_request(
            "POST",
            "/results",
            json!({ "studentId": "s1", "examId": 10, "assignmentId": 20, "score": 95 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["examId"].is_string());
    assert!(
        repository::find_result_by_id(&pool, 1)
            .await
            .expect("query")
            .is_none()
    );
}

#[tokio::test]
async fn create_result_reports_field_errors() {
    let pool = common::setup_seeded().await;
    let admin = common::principal("a1", None, Some(Role::Admin));

    let (status, body) = send(
        app(pool, Some(admin)),
        json_request("POST", "/results", json!({ "score": "abc" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["score"], "Score must be a number!");
    assert_eq!(body["fields"]["studentId"], "Student is required!");
    assert_eq!(body["fields"]["examId"], "Exam or assignment is required!");
}

#[tokio::test]
async fn action_failure_is_a_generic_flag() {
    let pool = common::setup_seeded().await;
    let admin = common::principal("a1", None, Some(Role::Admin));

    // Unknown student trips the foreign key; the caller only sees the flag.
    let (status, body) = send(
        app(pool, Some(admin)),
        json_request(
            "POST",
            "/results",
            json!({ "studentId": "nobody", "examId": 10, "score": 1 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": false, "error": true }));
}

#[tokio::test]
async fn students_cannot_write_results() {
    let pool = common::setup_seeded().await;
    let student = common::principal("s1", Some("ann@school.test"), Some(Role::Student));

    let (status, _) = send(
        app(pool, Some(student)),
        json_request(
            "POST",
            "/results",
            json!({ "studentId": "s1", "examId": 10, "score": 100 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_result_switches_assessment() {
    let pool = common::setup_seeded().await;
    sqlx::query("INSERT INTO results (id, score, exam_id, assignment_id, student_id) VALUES (5, 40, 10, NULL, 's1')")
        .execute(&pool)
        .await
        .expect("insert result");
    let admin = common::principal("a1", None, Some(Role::Admin));

    let (status, body) = send(
        app(pool.clone(), Some(admin.clone())),
        json_request(
            "PUT",
            "/results/5",
            json!({ "studentId": "s1", "assignmentId": 20, "score": "55" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let row = repository::find_result_by_id(&pool, 5)
        .await
        .expect("query")
        .expect("row");
    assert_eq!((row.exam_id, row.assignment_id, row.score), (None, Some(20), 55));

    let (status, body) = send(
        app(pool.clone(), Some(admin.clone())),
        json_request(
            "PUT",
            "/results/404",
            json!({ "studentId": "s1", "assignmentId": 20, "score": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": false, "error": true }));

    let (status, _) = send(
        app(pool, Some(admin)),
        json_request(
            "PUT",
            "/results/5",
            json!({ "id": 6, "studentId": "s1", "assignmentId": 20, "score": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn events_follow_the_date_param() {
    let pool = common::setup_seeded().await;
    let student = common::principal("s1", None, Some(Role::Student));

    let (status, body) = send(
        app(pool.clone(), Some(student.clone())),
        get("/events?date=2026-10-20&date=2026-10-18"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2026-10-20");
    let titles: Vec<&str> = body["events"]
        .as_array()
        .expect("events")
        .iter()
        .filter_map(|e| e["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Parents evening"]);

    let (status, _) = send(app(pool, Some(student)), get("/events?date=tomorrow")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn schedule_is_placed_on_requested_week() {
    let pool = common::setup_seeded().await;
    let teacher = common::principal("t2", None, Some(Role::Teacher));

    let (status, body) = send(
        app(pool, Some(teacher)),
        get("/schedule?type=teacherId&id=t2&date=2026-11-06"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "title": "English 2B",
            "start": "2026-11-04T10:00:00",
            "end": "2026-11-04T11:30:00"
        }])
    );
}

#[tokio::test]
async fn student_page_resolves_class_by_email() {
    let pool = common::setup_seeded().await;
    let student = common::principal("s1", Some("ann@school.test"), Some(Role::Student));

    let (status, body) = send(app(pool, Some(student)), get("/student")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["class"], json!({ "id": 1, "name": "1A" }));
    assert_eq!(body["schedule"][0]["title"], "Math 1A");
    let titles: Vec<&str> = body["announcements"]
        .as_array()
        .expect("announcements")
        .iter()
        .filter_map(|a| a["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Library closed", "1A test moved", "1A trip"]);
}

#[tokio::test]
async fn student_page_tolerates_missing_email() {
    let pool = common::setup_seeded().await;
    let student = common::principal("s9", None, None);

    let (status, body) = send(app(pool, Some(student)), get("/student")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["class"], Value::Null);
    assert_eq!(body["schedule"], json!([]));
    let titles: Vec<&str> = body["announcements"]
        .as_array()
        .expect("announcements")
        .iter()
        .filter_map(|a| a["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Library closed", "Welcome back"]);
}

#[tokio::test]
async fn teacher_page_lists_own_lessons() {
    let pool = common::setup_seeded().await;
    let teacher = common::principal("t1", None, Some(Role::Teacher));

    let (status, body) = send(app(pool, Some(teacher)), get("/teacher")).await;

    assert_eq!(status, StatusCode::OK);
    let schedule = body["schedule"].as_array().expect("schedule");
    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule[0]["title"], "Math 1A");
}

#[tokio::test]
async fn header_identity_reads_optional_claims() {
    let provider = HeaderIdentityProvider;

    let mut headers = HeaderMap::new();
    assert!(provider.current_principal(&headers).await.is_err());

    headers.insert("x-user-id", HeaderValue::from_static("t1"));
    let principal = provider
        .current_principal(&headers)
        .await
        .expect("principal");
    assert_eq!(principal, Principal::new("t1", None, None));

    headers.insert("x-user-email", HeaderValue::from_static("ada@school.test"));
    headers.insert("x-user-role", HeaderValue::from_static("Teacher"));
    let principal = provider
        .current_principal(&headers)
        .await
        .expect("principal");
    assert_eq!(principal.email.as_deref(), Some("ada@school.test"));
    assert_eq!(principal.role, Some(Role::Teacher));

    headers.insert("x-user-role", HeaderValue::from_static("janitor"));
    let principal = provider
        .current_principal(&headers)
        .await
        .expect("principal");
    assert_eq!(principal.role, None);
}
