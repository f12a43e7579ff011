use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::common::{Channel, ChatReply, ChatRequest, InitRequest, MessageItem, PolledMessage};
use crate::config::AppConfig;

use super::error::{ApiError, ApiResult};

/// Identity attached to every request of one process run.
#[derive(Debug)]
pub struct Session {
    session_id: String,
    client_id: String,
}

impl Session {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            client_id: client_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

/// HTTP client for the chat backend. Cheap to clone; clones share the session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    init_url: String,
    chat_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let session = Session::new(config.client_id.clone());
        log::info!("Chat session {} started", session.session_id());
        Self {
            http: reqwest::Client::new(),
            init_url: config.init_url(),
            chat_url: config.chat_url(),
            session: Arc::new(session),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn initialize(
        &self,
        index: &str,
        sop_namespace: &str,
        kb_namespace: &str,
    ) -> ApiResult<Value> {
        let body = InitRequest {
            index: index.to_string(),
            sop_namespace: sop_namespace.to_string(),
            kb_namespace: kb_namespace.to_string(),
        };
        log::info!("Initializing backend with {body:?}");

        let response = self.http.post(&self.init_url).json(&body).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Single-message JSON body for `text`.
    pub fn build_request(&self, text: &str, feedback: bool, channel: Channel) -> ChatRequest {
        ChatRequest {
            session_id: self.session().session_id().to_string(),
            messages: vec![MessageItem::text(text, Utc::now())],
            feedback,
            channel,
            client_id: self.session().client_id().to_string(),
            client_config: Map::new(),
            user_property: Map::new(),
        }
    }

    /// Sends one message. With an image the request goes out as
    /// `multipart/form-data`, otherwise as JSON.
    pub async fn send_message(
        &self,
        text: &str,
        feedback: bool,
        image: Option<&Path>,
        channel: Channel,
    ) -> ApiResult<ChatReply> {
        log::debug!("Sending message ({channel}, feedback={feedback}): {text:?}");

        let request = match image {
            Some(path) => {
                let form = self.build_form(text, feedback, channel, path).await?;
                self.http.post(&self.chat_url).multipart(form)
            }
            None => self
                .http
                .post(&self.chat_url)
                .json(&self.build_request(text, feedback, channel)),
        };

        let response = ensure_success(request.send().await?).await?;
        let reply: ChatReply = response.json().await?;
        log::debug!("Received reply: {reply:?}");
        Ok(reply)
    }

    pub async fn send_feedback(
        &self,
        original_content: &str,
        positive: bool,
        channel: Channel,
    ) -> ApiResult<()> {
        self.send_message(original_content, positive, None, channel)
            .await
            .map(|_| ())
    }

    /// Fetches queued messages; any failure yields an empty list.
    pub async fn poll_messages(&self) -> Vec<PolledMessage> {
        match self.try_poll().await {
            Ok(messages) => messages,
            Err(err) => {
                log::warn!("Polling {} failed: {err}", self.chat_url);
                Vec::new()
            }
        }
    }

    async fn try_poll(&self) -> ApiResult<Vec<PolledMessage>> {
        let response = self
            .http
            .get(&self.chat_url)
            .query(&[("session_id", self.session().session_id())])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn build_form(
        &self,
        text: &str,
        feedback: bool,
        channel: Channel,
        path: &Path,
    ) -> ApiResult<Form> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ApiError::Attachment {
                path: path.to_path_buf(),
                source,
            })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime = image::ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");

        let part = Part::bytes(bytes).file_name(file_name).mime_str(mime)?;

        Ok(Form::new()
            .text("session_id", self.session().session_id().to_string())
            .text("message", text.to_string())
            .text("feedback", feedback.to_string())
            .text("channel", channel.as_str())
            .part("image", part))
    }
}

async fn ensure_success(response: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::error!("Server error {status}: {body}");
    Err(ApiError::Server {
        status: status.as_u16(),
    })
}
