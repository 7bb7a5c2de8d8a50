//! HTTP boundary for rooms, topics, users, membership, and messages.
//!
//! These handlers call into the room registry and message store directly
//! and never touch the broadcast layer; real-time delivery happens only
//! over the chat WebSocket.

pub mod handlers;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::post().to(handlers::create_user))
        .route("/users/{id}", web::get().to(handlers::get_user))
        .route("/topics", web::get().to(handlers::list_topics))
        .route("/rooms", web::get().to(handlers::list_rooms))
        .route("/rooms", web::post().to(handlers::create_room))
        .route("/rooms/{id}", web::get().to(handlers::get_room))
        .route("/rooms/{id}", web::put().to(handlers::update_room))
        .route("/rooms/{id}", web::delete().to(handlers::delete_room))
        .route("/rooms/{id}/join", web::post().to(handlers::join_room))
        .route("/rooms/{id}/leave", web::post().to(handlers::leave_room))
        .route("/rooms/{id}/messages", web::get().to(handlers::list_messages))
        .route("/rooms/{id}/messages", web::post().to(handlers::create_message))
        .route("/messages/{id}", web::put().to(handlers::update_message))
        .route("/messages/{id}", web::delete().to(handlers::delete_message));
}
