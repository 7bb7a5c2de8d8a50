use actix_web::{test, web, App};
use huddle_server::config::{CorsConfig, DatabaseConfig, ServerConfig, Settings};
use huddle_server::{api, health_check, AppState};

fn test_settings() -> Settings {
    Settings {
        environment: "test".to_string(),
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ws_port: 8081,
            workers: 1,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        cors: CorsConfig {
            enabled: false,
            allow_any_origin: false,
            max_age: 3600,
        },
    }
}

async fn test_state() -> web::Data<AppState> {
    let state = AppState::new(test_settings())
        .await
        .expect("app state over in-memory database");
    web::Data::new(state)
}

#[actix_web::test]
async fn test_health_check() {
    let state = test_state().await;
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(health_check)),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
}

#[actix_web::test]
async fn test_room_crud_over_http() {
    let state = test_state().await;
    let app = test::init_service(
        App::new().app_data(state.clone()).configure(api::configure),
    )
    .await;

    // Create the host
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(serde_json::json!({ "username": "ada" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let host: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let host_id = host["id"].as_i64().unwrap();

    // Create a room under a fresh topic
    let req = test::TestRequest::post()
        .uri("/rooms")
        .set_json(serde_json::json!({
            "host_id": host_id,
            "topic": "math",
            "name": "proofs",
            "description": "socratic proofs"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let room: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let room_id = room["id"].as_i64().unwrap();

    // Host shows up as an implicit participant
    let req = test::TestRequest::get()
        .uri(&format!("/rooms/{}", room_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let detail: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(detail["participants"], serde_json::json!([host_id]));

    // Deleting as a stranger is forbidden
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(serde_json::json!({ "username": "grace" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let stranger: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/rooms/{}", room_id))
        .set_json(serde_json::json!({ "requester_id": stranger["id"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    // The host may delete
    let req = test::TestRequest::delete()
        .uri(&format!("/rooms/{}", room_id))
        .set_json(serde_json::json!({ "requester_id": host_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get()
        .uri(&format!("/rooms/{}", room_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_message_create_and_edit_over_http() {
    let state = test_state().await;
    let app = test::init_service(
        App::new().app_data(state.clone()).configure(api::configure),
    )
    .await;

    let host = state.users.create_user("ada", None).await.unwrap();
    let other = state.users.create_user("grace", None).await.unwrap();
    let room = state
        .registry
        .create_room(host.id, "math", "proofs", None)
        .await
        .unwrap();

    // Posting a message also records the sender as a participant
    let req = test::TestRequest::post()
        .uri(&format!("/rooms/{}/messages", room.id))
        .set_json(serde_json::json!({ "user_id": other.id, "body": "helo" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let message: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let message_id = message["id"].as_i64().unwrap();
    assert!(state
        .registry
        .participants(room.id)
        .await
        .unwrap()
        .contains(&other.id));

    // Only the author may edit
    let req = test::TestRequest::put()
        .uri(&format!("/messages/{}", message_id))
        .set_json(serde_json::json!({ "requester_id": host.id, "body": "hijacked" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::put()
        .uri(&format!("/messages/{}", message_id))
        .set_json(serde_json::json!({ "requester_id": other.id, "body": "hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let edited: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(edited["body"], "hello");
}

#[actix_web::test]
async fn test_missing_room_is_404() {
    let state = test_state().await;
    let app = test::init_service(
        App::new().app_data(state.clone()).configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/rooms/999/messages").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["status"], 404);
}
