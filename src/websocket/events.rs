use serde::{Deserialize, Serialize};

/// Inbound events, validated on ingress. Anything that does not parse into
/// a variant is answered with a [`ServerEvent::Error`] on the offending
/// connection and goes no further.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "message")]
    Message { user_id: i64, message: String },
}

/// Outbound events, tagged so clients can tell chat traffic from control
/// traffic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "message")]
    Message {
        message_id: i64,
        user_id: i64,
        username: String,
        message: String,
        /// ISO-8601 creation timestamp.
        created: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
}
