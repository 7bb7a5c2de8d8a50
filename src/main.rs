use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use huddle_server::{api, health_check, AppError, AppState, ChatServer, Settings};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> huddle_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    // Initialize application state
    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    // Chat WebSocket listener on its own port
    let ws_addr = format!("{}:{}", config.server.host, config.server.ws_port);
    let ws_listener = tokio::net::TcpListener::bind(&ws_addr).await?;
    info!("Chat WebSocket listening at ws://{}/ws/rooms/{{room_id}}", ws_addr);

    let chat_server = Arc::new(ChatServer::new(state.chat_context()));
    tokio::spawn(chat_server.run(ws_listener));

    info!(
        "Starting HTTP server at {}:{}",
        config.server.host, config.server.port
    );

    let bind_addr = (config.server.host.clone(), config.server.port);
    let workers = config.server.workers as usize;
    HttpServer::new(move || {
        let cors = if config.cors.enabled {
            let cors_config = if config.cors.allow_any_origin {
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
            } else {
                Cors::default()
                    .allowed_origin(&format!("http://{}:{}", config.server.host, config.server.port))
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                    .allowed_headers(vec!["Authorization", "Content-Type"])
            };
            cors_config.max_age(config.cors.max_age as usize)
        } else {
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .configure(api::configure)
    })
    .bind(bind_addr)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
