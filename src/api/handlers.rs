use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::db::models::{Message, Room, RoomUpdate};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: Option<String>,
}

pub async fn create_user(
    req: web::Json<CreateUserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .users
        .create_user(&req.username, req.email.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(user))
}

pub async fn get_user(
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state.users.get_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn list_topics(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let topics = state.registry.list_topics().await?;
    Ok(HttpResponse::Ok().json(topics))
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub host_id: i64,
    pub topic: String,
    pub name: String,
    pub description: Option<String>,
}

pub async fn create_room(
    req: web::Json<CreateRoomRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received room creation request from user {}", req.host_id);
    let room = state
        .registry
        .create_room(req.host_id, &req.topic, &req.name, req.description.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(room))
}

pub async fn list_rooms(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let rooms = state.registry.list_rooms().await?;
    Ok(HttpResponse::Ok().json(rooms))
}

#[derive(Debug, Serialize)]
pub struct RoomDetail {
    #[serde(flatten)]
    pub room: Room,
    pub participants: Vec<i64>,
    pub messages: Vec<Message>,
}

pub async fn get_room(
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let room_id = path.into_inner();
    let room = state.registry.get_room(room_id).await?;
    let participants = state.registry.participants(room_id).await?;
    let messages = state.store.list_by_room(room_id).await?;

    Ok(HttpResponse::Ok().json(RoomDetail {
        room,
        participants,
        messages,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoomRequest {
    pub requester_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub topic: Option<String>,
}

pub async fn update_room(
    path: web::Path<i64>,
    req: web::Json<UpdateRoomRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let room = state
        .registry
        .update_room(
            path.into_inner(),
            req.requester_id,
            RoomUpdate {
                name: req.name,
                description: req.description,
                topic_name: req.topic,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(room))
}

#[derive(Debug, Deserialize)]
pub struct RequesterBody {
    pub requester_id: i64,
}

pub async fn delete_room(
    path: web::Path<i64>,
    req: web::Json<RequesterBody>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state
        .registry
        .delete_room(path.into_inner(), req.requester_id)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "room deleted" })))
}

#[derive(Debug, Deserialize)]
pub struct MembershipBody {
    pub user_id: i64,
}

pub async fn join_room(
    path: web::Path<i64>,
    req: web::Json<MembershipBody>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state
        .registry
        .add_participant(path.into_inner(), req.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "joined" })))
}

pub async fn leave_room(
    path: web::Path<i64>,
    req: web::Json<MembershipBody>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state
        .registry
        .remove_participant(path.into_inner(), req.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "left" })))
}

pub async fn list_messages(
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let room_id = path.into_inner();
    state.registry.get_room(room_id).await?;
    let messages = state.store.list_by_room(room_id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub user_id: i64,
    pub body: String,
}

pub async fn create_message(
    path: web::Path<i64>,
    req: web::Json<CreateMessageRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let room_id = path.into_inner();
    let message = state
        .store
        .create_message(room_id, req.user_id, &req.body)
        .await?;
    state.registry.add_participant(room_id, req.user_id).await?;
    Ok(HttpResponse::Created().json(message))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub requester_id: i64,
    pub body: String,
}

pub async fn update_message(
    path: web::Path<i64>,
    req: web::Json<UpdateMessageRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let message = state
        .store
        .update_message(path.into_inner(), req.requester_id, &req.body)
        .await?;
    Ok(HttpResponse::Ok().json(message))
}

pub async fn delete_message(
    path: web::Path<i64>,
    req: web::Json<RequesterBody>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state
        .store
        .delete_message(path.into_inner(), req.requester_id)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "message deleted" })))
}
