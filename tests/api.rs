//! Router-level tests: requests go through the full axum stack against an
//! in-memory SQLite database.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use fitlog::api::{build_router, AppState};
use fitlog::config::AuthConfig;
use fitlog::db::{create_test_pool, migrations};

async fn test_app() -> Router {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    build_router(AppState::from_pool(pool, &AuthConfig::default()), "*")
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("Failed to build request"))
        .await
        .expect("Request failed");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Register a user and return an access token
async fn login_as(app: &Router, username: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": username, "email": format!("{}@example.com", username), "password": "pw-123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": "pw-123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access"].as_str().expect("access token").to_string()
}

async fn create_exercise(app: &Router, token: &str, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/exercises",
        Some(token),
        Some(json!({"name": name, "category": "Chest", "type": "Strength", "unit": "reps"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().expect("exercise id")
}

async fn create_workout(app: &Router, token: &str, date: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/workouts",
        Some(token),
        Some(json!({"date": date})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().expect("workout id")
}

async fn create_entry(app: &Router, token: &str, workout: i64, exercise: i64) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/entries",
        Some(token),
        Some(json!({"workout": workout, "exercise": exercise, "sets": 3, "quantity": 10, "weight": 80})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().expect("entry id")
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn register_returns_profile_without_password() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": "alice", "email": "alice@example.com", "password": "secret"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("password").is_none());
    assert!(!body.to_string().contains("argon2"));
}

#[tokio::test]
async fn duplicate_username_is_conflict() {
    let app = test_app().await;
    let token = login_as(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": "alice", "password": "another"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    // The original account is untouched
    let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "alice@example.com");
}

#[tokio::test]
async fn register_validation_errors_are_structured() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": "", "email": "nope"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["username"].is_array());
    assert!(body["error"]["details"]["email"].is_array());
    assert_eq!(body["error"]["details"]["password"][0], "This field is required.");
}

#[tokio::test]
async fn malformed_json_is_validation_error() {
    let app = test_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn login_failures_are_generic() {
    let app = test_app().await;
    login_as(&app, "alice").await;

    let (status_wrong, wrong) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": "wrong"})),
    )
    .await;
    let (status_unknown, unknown) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "nobody", "password": "wrong"})),
    )
    .await;

    assert_eq!(status_wrong, StatusCode::UNAUTHORIZED);
    assert_eq!(status_unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn refresh_flow_and_token_kinds() {
    let app = test_app().await;
    login_as(&app, "alice").await;

    let (_, pair) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": "pw-123456"})),
    )
    .await;
    let access = pair["access"].as_str().unwrap();
    let refresh = pair["refresh"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({"refresh": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = body["access"].as_str().unwrap();

    let (status, _) = send(&app, Method::GET, "/api/workouts", Some(new_access), None).await;
    assert_eq!(status, StatusCode::OK);

    // Access token is not a refresh token
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({"refresh": access})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Refresh token is not an access token
    let (status, _) = send(&app, Method::GET, "/api/workouts", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = test_app().await;

    for (method, uri) in [
        (Method::GET, "/api/workouts"),
        (Method::GET, "/api/entries"),
        (Method::GET, "/api/estadisticas"),
        (Method::GET, "/api/auth/me"),
        (Method::POST, "/api/exercises"),
        (Method::DELETE, "/api/exercises/1"),
    ] {
        let (status, body) = send(&app, method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    let (status, _) = send(&app, Method::GET, "/api/workouts", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_account_cascades_and_invalidates_tokens() {
    let app = test_app().await;
    let token = login_as(&app, "alice").await;
    let exercise = create_exercise(&app, &token, "Bench Press").await;
    let workout = create_workout(&app, &token, "2024-01-01T10:00:00Z").await;
    create_entry(&app, &token, workout, exercise).await;

    let (status, _) = send(&app, Method::DELETE, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/api/workouts", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The catalog is shared and survives
    let (status, _) = send(&app, Method::GET, &format!("/api/exercises/{}", exercise), None, None).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Exercises
// ============================================================================

#[tokio::test]
async fn exercise_catalog_is_public_to_read() {
    let app = test_app().await;
    let token = login_as(&app, "alice").await;
    let id = create_exercise(&app, &token, "Bench Press").await;

    let (status, list) = send(&app, Method::GET, "/api/exercises", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, exercise) =
        send(&app, Method::GET, &format!("/api/exercises/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        exercise,
        json!({
            "id": id,
            "name": "Bench Press",
            "category": "Chest",
            "type": "Strength",
            "unit": "reps",
            "description": null,
            "image": null,
            "video": null
        })
    );

    let (status, _) = send(&app, Method::GET, "/api/exercises/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, "/api/exercises/abc", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn exercise_put_patch_delete() {
    let app = test_app().await;
    let token = login_as(&app, "alice").await;
    let id = create_exercise(&app, &token, "Bench Press").await;
    let uri = format!("/api/exercises/{}", id);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({"unit": "kcal"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unit"], "kcal");
    assert_eq!(body["name"], "Bench Press");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({"name": "Squat", "category": "Legs", "type": "Strength"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "Legs");
    assert_eq!(body["unit"], "reps");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({"name": "Squat", "category": "Piernas", "type": "Strength"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["category"][0], "\"Piernas\" is not a valid choice.");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_exercise_removes_exactly_its_entries() {
    let app = test_app().await;
    let token = login_as(&app, "alice").await;
    let bench = create_exercise(&app, &token, "Bench Press").await;
    let squat = create_exercise(&app, &token, "Squat").await;
    let workout = create_workout(&app, &token, "2024-01-01").await;

    for _ in 0..3 {
        create_entry(&app, &token, workout, bench).await;
    }
    let kept = create_entry(&app, &token, workout, squat).await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/exercises/{}", bench),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, entries) = send(&app, Method::GET, "/api/entries", Some(&token), None).await;
    let ids: Vec<i64> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![kept]);
}

// ============================================================================
// Workouts
// ============================================================================

#[tokio::test]
async fn other_users_workout_is_not_found() {
    let app = test_app().await;
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;

    let (status, w1) = send(
        &app,
        Method::POST,
        "/api/workouts",
        Some(&alice),
        Some(json!({"date": "2024-01-01", "location": "Gym"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/workouts/{}", w1["id"]);

    let (foreign_status, foreign) = send(&app, Method::GET, &uri, Some(&bob), None).await;
    let (missing_status, missing) =
        send(&app, Method::GET, "/api/workouts/999999", Some(&bob), None).await;
    assert_eq!(foreign_status, StatusCode::NOT_FOUND);
    assert_eq!(missing_status, StatusCode::NOT_FOUND);
    assert_eq!(foreign, missing);

    let (_, list) = send(&app, Method::GET, "/api/workouts", Some(&bob), None).await;
    assert_eq!(list, json!([]));

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn workout_owner_is_always_the_caller() {
    let app = test_app().await;
    let alice = login_as(&app, "alice").await;
    login_as(&app, "bob").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/workouts",
        Some(&alice),
        Some(json!({"date": "2024-01-01T09:30:00Z", "user": "bob", "user_id": 2})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"], "alice");
    assert_eq!(body["location"], "Gym");
    assert_eq!(body["date"], "2024-01-01T09:30:00Z");
    assert!(body["created_at"].is_string());
    assert_eq!(body["entries"], json!([]));
}

#[tokio::test]
async fn workouts_listed_newest_first() {
    let app = test_app().await;
    let token = login_as(&app, "alice").await;

    let older = create_workout(&app, &token, "2024-01-01T08:00:00Z").await;
    let newest = create_workout(&app, &token, "2024-06-01T08:00:00Z").await;
    let tied = create_workout(&app, &token, "2024-01-01T08:00:00Z").await;

    let (_, list) = send(&app, Method::GET, "/api/workouts", Some(&token), None).await;
    let ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![newest, tied, older]);
}

#[tokio::test]
async fn workout_detail_nests_entries() {
    let app = test_app().await;
    let token = login_as(&app, "alice").await;
    let bench = create_exercise(&app, &token, "Bench Press").await;
    let workout = create_workout(&app, &token, "2024-01-01").await;
    create_entry(&app, &token, workout, bench).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/workouts/{}", workout),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entry = &body["entries"][0];
    assert_eq!(entry["exercise_name"], "Bench Press");
    assert_eq!(entry["sets"], 3);
    assert_eq!(entry["weight"], 80.0);
}

#[tokio::test]
async fn workout_validation() {
    let app = test_app().await;
    let token = login_as(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/workouts",
        Some(&token),
        Some(json!({"date": "someday", "location": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["date"].is_array());
    assert_eq!(body["error"]["details"]["location"][0], "This field may not be blank.");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/workouts",
        Some(&token),
        Some(json!({"date": "2024-01-01", "location": null})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["location"][0], "This field may not be null.");
}

// ============================================================================
// Entries
// ============================================================================

#[tokio::test]
async fn entry_in_foreign_workout_rejected() {
    let app = test_app().await;
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let bench = create_exercise(&app, &alice, "Bench Press").await;
    let workout = create_workout(&app, &alice, "2024-01-01").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(&bob),
        Some(json!({"workout": workout, "exercise": bench, "quantity": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["details"]["workout"][0],
        format!("Invalid pk \"{}\" - object does not exist.", workout)
    );
}

#[tokio::test]
async fn oversized_entry_integers_rejected() {
    let app = test_app().await;
    let token = login_as(&app, "alice").await;
    let bench = create_exercise(&app, &token, "Bench Press").await;
    let workout = create_workout(&app, &token, "2024-01-01").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(&token),
        Some(json!({
            "workout": workout,
            "exercise": bench,
            "quantity": 10,
            "sets": 10_000_000_000i64,
            "rest_seconds": 9_000_000_000i64,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["details"]["sets"][0],
        "Ensure this value is less than or equal to 2147483647."
    );
    assert!(body["error"]["details"]["rest_seconds"].is_array());

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/entries?workout={}", workout),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn entries_filtered_and_scoped() {
    let app = test_app().await;
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let bench = create_exercise(&app, &alice, "Bench Press").await;
    let w1 = create_workout(&app, &alice, "2024-01-01").await;
    let w2 = create_workout(&app, &alice, "2024-01-02").await;
    let e1 = create_entry(&app, &alice, w1, bench).await;
    create_entry(&app, &alice, w2, bench).await;

    let (_, filtered) = send(
        &app,
        Method::GET,
        &format!("/api/entries?workout={}", w1),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    assert_eq!(filtered[0]["id"], e1);

    let (_, bobs) = send(&app, Method::GET, "/api/entries", Some(&bob), None).await;
    assert_eq!(bobs, json!([]));

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/entries/{}", e1),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/entries?workout=abc", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn entry_patch_and_delete() {
    let app = test_app().await;
    let token = login_as(&app, "alice").await;
    let bench = create_exercise(&app, &token, "Bench Press").await;
    let workout = create_workout(&app, &token, "2024-01-01").await;
    let entry = create_entry(&app, &token, workout, bench).await;
    let uri = format!("/api/entries/{}", entry);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({"weight": 82.5, "rest_seconds": 120})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weight"], 82.5);
    assert_eq!(body["rest_seconds"], 120);
    assert_eq!(body["sets"], 3);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({"sets": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["sets"].is_array());

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Statistics and health
// ============================================================================

#[tokio::test]
async fn statistics_for_caller() {
    let app = test_app().await;
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let bench = create_exercise(&app, &alice, "Bench Press").await;

    let today = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let workout = create_workout(&app, &alice, &today).await;
    create_entry(&app, &alice, workout, bench).await;
    create_workout(&app, &alice, "2020-01-01").await;
    create_workout(&app, &bob, &today).await;

    let (status, stats) = send(&app, Method::GET, "/api/estadisticas", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_entrenamientos"], 2);
    assert_eq!(stats["total_ejercicios_registrados"], 1);
    assert_eq!(
        stats["ejercicios_frecuentes"],
        json!([{"ejercicio": "Bench Press", "count": 1}])
    );

    let chart = stats["entrenamientos_chart"].as_array().unwrap();
    assert_eq!(chart.len(), 1);
    assert_eq!(chart[0]["count"], 1);
    assert_eq!(chart[0]["fecha"], &today[..10]);
}

#[tokio::test]
async fn health_reports_database() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "database": "ok"}));
}
