use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Routing tag telling the backend which downstream handler gets the message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Chat,
    Freshdesk,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Chat, Channel::Freshdesk];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Chat => "chat",
            Channel::Freshdesk => "freshdesk",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Chat => "Chat",
            Channel::Freshdesk => "Freshdesk",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
}

/// One entry of the `messages` list in a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageItem {
    pub content: String,
    pub content_type: ContentType,
    pub created_at: String,
}

impl MessageItem {
    pub fn text(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            content_type: ContentType::Text,
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// JSON body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub messages: Vec<MessageItem>,
    pub feedback: bool,
    pub channel: Channel,
    pub client_id: String,
    pub client_config: Map<String, Value>,
    pub user_property: Map<String, Value>,
}

/// JSON body of `POST /api/init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    pub index: String,
    pub sop_namespace: String,
    pub kb_namespace: String,
}

/// Backend answer to a chat request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// Message returned by the polling endpoint (`GET /api/chat`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolledMessage {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(alias = "reply")]
    pub content: String,
}
