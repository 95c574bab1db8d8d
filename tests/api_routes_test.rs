use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Days, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use visitor_tracker::{
    cache::Cache,
    config::Config,
    database::Database,
    utils::SequentialIdGenerator,
    web::{AppState, WebServer},
};

async fn test_app() -> Router {
    let database = Database::in_memory().await.unwrap();
    let state = AppState::new(
        Config::default(),
        database,
        Cache::in_memory(),
        Arc::new(SequentialIdGenerator::new()),
    );
    WebServer::router(state)
}

// Helper function to send requests to the app
async fn send_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body = body.map(|b| serde_json::to_string(&b).unwrap());
    send_raw(app, method, uri, body).await
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Value) {
    let request_builder = Request::builder().method(method).uri(uri);

    let request = if let Some(body) = body {
        request_builder
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };

    (status, json)
}

async fn create_location(app: &Router, name: &str) -> String {
    let (status, response) =
        send_request(app, Method::POST, "/api/locations", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    response["data"]["id"].as_str().unwrap().to_string()
}

async fn create_sensor(app: &Router, location_id: &str, name: &str, status: &str) -> String {
    let (code, response) = send_request(
        app,
        Method::POST,
        "/api/sensors",
        Some(json!({ "name": name, "status": status, "location_id": location_id })),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED, "{}", response);
    response["data"]["id"].as_str().unwrap().to_string()
}

async fn create_visitor(app: &Router, sensor_id: &str, date: &str, count: i64) -> (StatusCode, Value) {
    send_request(
        app,
        Method::POST,
        "/api/visitors",
        Some(json!({ "sensor_id": sensor_id, "date": date, "count": count })),
    )
    .await
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;

    let (status, response) = send_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert_eq!(response["data"]["status"], "healthy");
    assert_eq!(response["data"]["database"], "connected");
    assert_eq!(response["data"]["reported_errors"], 0);
}

#[tokio::test]
async fn test_locations_index_message_switches_on_emptiness() {
    let app = test_app().await;

    let (status, response) = send_request(&app, Method::GET, "/api/locations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "No locations found");
    assert_eq!(response["data"], json!([]));

    let (status, response) =
        send_request(&app, Method::POST, "/api/locations", Some(json!({ "name": "Lobby" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response["success"], true);
    assert_eq!(response["message"], "Location created");
    assert_eq!(response["data"]["name"], "Lobby");

    let (status, response) = send_request(&app, Method::GET, "/api/locations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "Success");
    assert_eq!(response["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_location_validation_errors() {
    let app = test_app().await;
    create_location(&app, "Lobby").await;

    let (status, response) =
        send_request(&app, Method::POST, "/api/locations", Some(json!({ "name": "Lobby" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["success"], false);
    assert_eq!(response["message"], "The given data was invalid.");
    assert_eq!(response["errors"]["name"][0], "The name has already been taken.");

    let (status, response) = send_request(&app, Method::POST, "/api/locations", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["errors"]["name"][0], "The name field is required.");

    let long_name = "x".repeat(192);
    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/locations",
        Some(json!({ "name": long_name })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response["errors"]["name"][0],
        "The name field must not be greater than 191 characters."
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app().await;

    let (status, response) = send_raw(
        &app,
        Method::POST,
        "/api/locations",
        Some("{\"name\": ".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["success"], false);
    assert!(response.get("errors").is_some());
}

#[tokio::test]
async fn test_sensor_create_normalizes_status() {
    let app = test_app().await;
    let location_id = create_location(&app, "Lobby").await;

    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/sensors",
        Some(json!({ "name": "door", "status": "ACTIVE", "location_id": location_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response["message"], "Sensor created");
    assert_eq!(response["data"]["status"], "active");
    assert_eq!(response["data"]["location_id"], location_id.as_str());

    let (status, response) = send_request(&app, Method::GET, "/api/sensors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"][0]["name"], "door");
    assert_eq!(response["data"][0]["status"], "active");
}

#[tokio::test]
async fn test_sensor_validation_errors() {
    let app = test_app().await;
    let location_id = create_location(&app, "Lobby").await;
    create_sensor(&app, &location_id, "door", "active").await;

    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/sensors",
        Some(json!({ "name": "x".repeat(51), "status": "broken", "location_id": "not-a-uuid" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["errors"]["status"][0], "The selected status is invalid.");
    assert_eq!(
        response["errors"]["location_id"][0],
        "The location id field must be a valid UUID."
    );
    assert_eq!(
        response["errors"]["name"][0],
        "The name field must not be greater than 50 characters."
    );

    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/sensors",
        Some(json!({ "name": "door", "status": "inactive", "location_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response["errors"]["location_id"][0],
        "The selected location id is invalid."
    );
    assert!(response["errors"].get("name").is_none());

    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/sensors",
        Some(json!({ "name": "door", "status": "inactive", "location_id": location_id })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["errors"]["name"][0], "The name has already been taken.");
}

#[tokio::test]
async fn test_sensor_listing_filters_and_pages() {
    let app = test_app().await;

    let (status, response) = send_request(&app, Method::GET, "/api/sensors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "Success");
    assert_eq!(response["data"], json!([]));

    let location_id = create_location(&app, "Lobby").await;
    create_sensor(&app, &location_id, "door", "active").await;
    create_sensor(&app, &location_id, "window", "inactive").await;

    let (_, response) = send_request(&app, Method::GET, "/api/sensors?status=inactive", None).await;
    let sensors = response["data"].as_array().unwrap();
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0]["name"], "window");

    let (_, response) = send_request(&app, Method::GET, "/api/sensors?limit=1&page=2", None).await;
    assert_eq!(response["data"]["data"][0]["name"], "window");
    assert_eq!(response["data"]["meta"]["current_page"], 2);
    assert_eq!(response["data"]["meta"]["total"], 2);

    let (status, response) =
        send_request(&app, Method::GET, "/api/sensors?status=broken&limit=0", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["errors"]["status"][0], "The selected status is invalid.");
    assert_eq!(response["errors"]["limit"][0], "The limit field must be at least 1.");
}

#[tokio::test]
async fn test_visitor_create_and_list() {
    let app = test_app().await;
    let location_id = create_location(&app, "Lobby").await;
    let sensor_id = create_sensor(&app, &location_id, "door", "active").await;

    let (status, response) = create_visitor(&app, &sensor_id, "2024-05-01", 12).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response["message"], "Visitor created");
    assert_eq!(response["data"]["location_id"], location_id.as_str());
    assert_eq!(response["data"]["sensor_id"], sensor_id.as_str());
    assert_eq!(response["data"]["date"], "2024-05-01");
    assert_eq!(response["data"]["count"], 12);

    create_visitor(&app, &sensor_id, "2024-05-02", 3).await;

    let (status, response) =
        send_request(&app, Method::GET, "/api/visitors?date=2024-05-01", None).await;
    assert_eq!(status, StatusCode::OK);
    let visitors = response["data"].as_array().unwrap();
    assert_eq!(visitors.len(), 1);
    assert_eq!(visitors[0]["location_id"], location_id.as_str());

    let (_, response) = send_request(&app, Method::GET, "/api/visitors", None).await;
    assert_eq!(response["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_visitor_validation_errors() {
    let app = test_app().await;
    let location_id = create_location(&app, "Lobby").await;
    let sensor_id = create_sensor(&app, &location_id, "door", "active").await;
    create_visitor(&app, &sensor_id, "2024-05-01", 1).await;

    let (status, response) = create_visitor(&app, &sensor_id, "2024-05-01", 2).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["errors"]["date"][0], "The date has already been taken.");

    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/visitors",
        Some(json!({ "sensor_id": Uuid::new_v4(), "date": "01/05/2024", "count": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["errors"]["sensor_id"][0], "The selected sensor id is invalid.");
    assert_eq!(
        response["errors"]["date"][0],
        "The date field must match the format Y-m-d."
    );
    assert_eq!(response["errors"]["count"][0], "The count field must be at least 0.");

    let (status, response) =
        send_request(&app, Method::GET, "/api/visitors?date=2024-13-01", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["errors"].get("date").is_some());
}

#[tokio::test]
async fn test_summary_reflects_new_records() {
    let app = test_app().await;
    let today = Utc::now().date_naive();
    let recent = (today - Days::new(1)).format("%Y-%m-%d").to_string();
    let stale = (today - Days::new(10)).format("%Y-%m-%d").to_string();

    let (status, response) = send_request(&app, Method::GET, "/api/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["total_visitors_last_7_days"], 0);

    let location_id = create_location(&app, "Lobby").await;
    let door = create_sensor(&app, &location_id, "door", "active").await;
    let gate = create_sensor(&app, &location_id, "gate", "active").await;
    create_sensor(&app, &location_id, "window", "inactive").await;

    create_visitor(&app, &door, &recent, 5).await;
    create_visitor(&app, &gate, &recent, 10).await;
    create_visitor(&app, &door, &stale, 100).await;

    let (status, response) = send_request(&app, Method::GET, "/api/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "Success");
    assert_eq!(response["data"]["total_visitors_last_7_days"], 15);
    assert_eq!(
        response["data"]["sensor_stats"],
        json!({ "active": 2, "inactive": 1 })
    );
}
