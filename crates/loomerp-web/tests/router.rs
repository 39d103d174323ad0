//! Router tests for everything decided before the database is reached:
//! authentication, role guards, input validation and health reporting.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use loomerp_common::Role;
use loomerp_test_utils::{lazy_state, request, token_for, token_for_user};
use loomerp_web::router::build_router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    build_router(lazy_state())
}

async fn send(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    app().oneshot(request(method, uri, token, body)).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let response = send(Method::GET, "/api/equipment", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let response = send(Method::GET, "/api/equipment", Some("not.a.jwt"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_operator_cannot_create_department() {
    let token = token_for(Role::Operator);
    let response = send(
        Method::POST,
        "/api/departments",
        Some(&token),
        Some(json!({"name": "Weaving", "code": "WV"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "forbidden");
}

#[tokio::test]
async fn test_user_list_restricted_to_admin_hr_manager() {
    for role in [Role::Operator, Role::Warehouse, Role::Accountant] {
        let token = token_for(role);
        let response = send(Method::GET, "/api/users", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "role {}", role);
    }
}

#[tokio::test]
async fn test_accounting_chart_requires_finance_role() {
    let token = token_for(Role::Supervisor);
    let response = send(Method::GET, "/api/dashboard/accounting?year=2024", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_operator_cannot_update_incident() {
    let token = token_for(Role::Operator);
    let response = send(
        Method::PUT,
        "/api/incidents/3",
        Some(&token),
        Some(json!({"severity": "high"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_empty_department_name_is_bad_request() {
    let token = token_for(Role::Admin);
    let response = send(
        Method::POST,
        "/api/departments",
        Some(&token),
        Some(json!({"name": "  ", "code": "DY"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["message"], "name is required");
}

#[tokio::test]
async fn test_non_positive_amount_is_bad_request() {
    let token = token_for(Role::Accountant);
    let response = send(
        Method::POST,
        "/api/accounting",
        Some(&token),
        Some(json!({
            "entry_date": "2024-03-01",
            "kind": "expense",
            "category": "dyes",
            "amount": 0
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fractional_spare_part_adjustment_is_bad_request() {
    let token = token_for(Role::Warehouse);
    let response = send(
        Method::POST,
        "/api/spare-parts/4/adjust",
        Some(&token),
        Some(json!({"delta": 1.5})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_out_before_check_in_is_bad_request() {
    let token = token_for(Role::Hr);
    let response = send(
        Method::POST,
        "/api/attendance",
        Some(&token),
        Some(json!({
            "user_id": 9,
            "work_date": "2024-02-12",
            "check_in": "2024-02-12T17:00:00",
            "check_out": "2024-02-12T08:00:00"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_incident_resolution_needs_resolve_action() {
    let token = token_for(Role::Supervisor);
    let response = send(
        Method::PUT,
        "/api/incidents/3",
        Some(&token),
        Some(json!({"status": "resolved"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let token = token_for(Role::Admin);
    let response = send(
        Method::POST,
        "/api/auth/register",
        Some(&token),
        Some(json!({
            "username": "kofi",
            "email": "kofi@mill.example",
            "full_name": "Kofi Mensah",
            "password": "short",
            "role": "operator"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["message"], "password must be at least 8 characters");
}

#[tokio::test]
async fn test_register_requires_admin() {
    let token = token_for(Role::Hr);
    let response = send(
        Method::POST,
        "/api/auth/register",
        Some(&token),
        Some(json!({
            "username": "kofi",
            "email": "kofi@mill.example",
            "full_name": "Kofi Mensah",
            "password": "long enough",
            "role": "operator"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_change_password_rejects_short_password() {
    let token = token_for(Role::Operator);
    let response = send(
        Method::PUT,
        "/api/auth/password",
        Some(&token),
        Some(json!({"current_password": "whatever1", "new_password": "abc"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_requires_credentials() {
    let response = send(
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "", "password": ""})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let token = token_for_user(7, Role::Admin);
    let response = send(Method::DELETE, "/api/users/7", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let token = token_for(Role::Admin);
    let response = send(Method::GET, "/api/equipment/loom-7", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_missing_body_field_is_json_bad_request() {
    let token = token_for(Role::Admin);
    let response = send(
        Method::POST,
        "/api/departments",
        Some(&token),
        Some(json!({"name": "Weaving"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("application/json"), "{}", content_type);
    let body = json_body(response).await;
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("code"), "{}", body);
}

#[tokio::test]
async fn test_unknown_enum_value_is_json_bad_request() {
    let token = token_for(Role::Maintenance);
    let response = send(
        Method::PUT,
        "/api/equipment/1/status",
        Some(&token),
        Some(json!({"status": "exploded"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let token = token_for(Role::Admin);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/roles")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_bad_query_string_is_bad_request() {
    let token = token_for(Role::Admin);
    let response = send(Method::GET, "/api/equipment?limit=many", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let token = token_for(Role::Admin);
    let response = send(Method::GET, "/api/looms", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let response = send(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "down");
}
