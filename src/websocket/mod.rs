//! Real-time chat subsystem: wire events, the per-connection session state
//! machine, and the WebSocket transport that drives it.

mod events;
mod session;
mod server;

pub use events::{ClientEvent, ServerEvent};
pub use session::{ChatContext, ChatSession, SessionState};
pub use server::ChatServer;
