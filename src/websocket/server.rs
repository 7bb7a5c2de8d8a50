use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

use crate::websocket::{ChatContext, ChatSession, ClientEvent, ServerEvent};

/// Accepts room-scoped chat connections on `/ws/rooms/{room_id}` and runs
/// one session per connection: a receive loop in the accepting task and an
/// outbound forwarder draining the session's event channel.
pub struct ChatServer {
    ctx: Arc<ChatContext>,
}

impl ChatServer {
    pub fn new(ctx: Arc<ChatContext>) -> Self {
        Self { ctx }
    }

    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let server = self.clone();
                    tokio::spawn(server.handle_connection(stream, addr));
                }
                Err(e) => {
                    error!("Error accepting chat connection: {}", e);
                }
            }
        }
    }

    pub async fn handle_connection(
        self: Arc<Self>,
        raw_stream: TcpStream,
        addr: std::net::SocketAddr,
    ) {
        info!("New chat connection from: {}", addr);

        let mut request_path = String::new();
        let ws_stream = match tokio_tungstenite::accept_hdr_async(
            raw_stream,
            |req: &Request, response: Response| {
                request_path = req.uri().path().to_string();
                Ok(response)
            },
        )
        .await
        {
            Ok(ws) => ws,
            Err(e) => {
                error!("Error during WebSocket handshake with {}: {}", addr, e);
                return;
            }
        };

        let Some(room_id) = parse_room_path(&request_path) else {
            warn!("Rejecting {}: no room in path {:?}", addr, request_path);
            return;
        };

        let (ws_sink, mut ws_stream) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel();

        // Forward session events to the WebSocket
        let send_task = tokio::spawn(async move {
            let mut ws_sink = ws_sink;
            let mut rx: mpsc::UnboundedReceiver<ServerEvent> = rx;

            while let Some(event) = rx.recv().await {
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to serialize outbound event: {}", e);
                        continue;
                    }
                };
                if let Err(e) = ws_sink.send(Message::Text(text)).await {
                    error!("Error sending chat event: {}", e);
                    break;
                }
            }

            let _ = ws_sink.close().await;
        });

        let mut session = ChatSession::new(room_id, tx.clone(), self.ctx.clone());
        if let Err(e) = session.join().await {
            warn!("Session for {} failed to join room {}: {}", addr, room_id, e);
            let _ = tx.send(ServerEvent::Error {
                message: e.to_string(),
            });
            drop(session);
            drop(tx);
            let _ = send_task.await;
            return;
        }

        // Handle incoming WebSocket messages
        while let Some(message) = ws_stream.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => session.handle_event(event).await,
                    Err(e) => {
                        let _ = tx.send(ServerEvent::Error {
                            message: format!("invalid event: {}", e),
                        });
                    }
                },
                Ok(Message::Close(_)) => {
                    info!("Client initiated close for connection {}", addr);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Error receiving WebSocket message from {}: {}", addr, e);
                    break;
                }
            }
        }

        session.close().await;
        drop(session);
        drop(tx);
        let _ = send_task.await;
        info!("Connection {} closed", addr);
    }
}

/// Room id from a `/ws/rooms/{room_id}` request path.
fn parse_room_path(path: &str) -> Option<i64> {
    path.strip_prefix("/ws/rooms/")?
        .trim_end_matches('/')
        .parse()
        .ok()
}
