use std::path::{Path, PathBuf};

use chrono::Local;

use crate::common::{Channel, ChatCommand, ChatReply, PolledMessage};
use crate::config::AppConfig;

pub const FAILED_UPLOAD_NOTICE: &str = "Failed to upload image. Please try again.";
pub const EMPTY_REPLY: &str = "No response";

/// Where an image bubble gets its pixels from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Local file shown while the upload is in flight; must be released.
    Preview(String),
    Remote(String),
}

impl ImageRef {
    pub fn preview_for(path: &Path) -> Self {
        ImageRef::Preview(format!("file://{}", path.display()))
    }

    pub fn uri(&self) -> &str {
        match self {
            ImageRef::Preview(uri) | ImageRef::Remote(uri) => uri,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub sender: String,
    pub content: String,
    pub time: String,
    pub is_self: bool,
    pub show_feedback: bool,
    /// `None` until the user rates the reply.
    pub feedback: Option<bool>,
    pub image: Option<ImageRef>,
}

/// Local state of the conversation view. Every user action returns the
/// command the caller has to hand to the network worker.
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub input_text: String,
    pub is_typing: bool,
    pub show_emoji_picker: bool,
    pub channel: Channel,
    assistant_name: String,
    user_name: String,
    next_id: u64,
    /// Taken on first mount so initialization fires once per run.
    pending_init: Option<ChatCommand>,
}

impl ConversationState {
    pub fn new(config: &AppConfig, channel: Channel) -> Self {
        let mut state = Self {
            messages: Vec::new(),
            input_text: String::new(),
            is_typing: false,
            show_emoji_picker: false,
            channel,
            assistant_name: config.assistant_name.clone(),
            user_name: config.user_name.clone(),
            next_id: 1,
            pending_init: Some(ChatCommand::Initialize {
                index: config.index.clone(),
                sop_namespace: config.sop_namespace.clone(),
                kb_namespace: config.kb_namespace.clone(),
            }),
        };
        if !config.greeting.is_empty() {
            state.push_reply(config.greeting.clone());
        }
        state
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    pub fn mount(&mut self) -> Option<ChatCommand> {
        self.pending_init.take()
    }

    pub fn submit(&mut self) -> Option<ChatCommand> {
        if self.input_text.trim().is_empty() {
            return None;
        }

        let text = std::mem::take(&mut self.input_text);
        self.clear_feedback_prompts();
        self.push_self(text.clone(), None);
        self.is_typing = true;

        Some(ChatCommand::SendMessage {
            text,
            channel: self.channel,
        })
    }

    pub fn on_reply(&mut self, reply: ChatReply) {
        self.push_reply(reply.reply.unwrap_or_else(|| EMPTY_REPLY.to_string()));
        self.is_typing = false;
    }

    pub fn on_send_failed(&mut self, error: &str) {
        log::warn!("Message was not delivered: {error}");
        self.is_typing = false;
    }

    pub fn upload_image(&mut self, path: PathBuf) -> ChatCommand {
        self.clear_feedback_prompts();
        let message_id = self.push_self(String::new(), Some(ImageRef::preview_for(&path)));
        self.is_typing = true;

        ChatCommand::UploadImage {
            message_id,
            path,
            channel: self.channel,
        }
    }

    /// Swaps the preview for the server copy and appends the reply. Returns
    /// the preview URI once nothing displays it anymore.
    pub fn on_image_uploaded(&mut self, message_id: u64, reply: ChatReply) -> Option<String> {
        let mut released = None;
        if let (Some(message), Some(url)) = (self.find_mut(message_id), reply.image_url) {
            if let Some(ImageRef::Preview(uri)) = message.image.replace(ImageRef::Remote(url)) {
                released = Some(uri);
            }
        }

        self.on_reply(ChatReply {
            reply: reply.reply,
            image_url: None,
        });
        released
    }

    pub fn on_image_failed(&mut self, message_id: u64) -> Option<String> {
        self.is_typing = false;
        let message = self.find_mut(message_id)?;
        message.content = FAILED_UPLOAD_NOTICE.to_string();
        match message.image.take() {
            Some(ImageRef::Preview(uri)) => Some(uri),
            _ => None,
        }
    }

    /// Only negative ratings are reported to the backend.
    pub fn record_feedback(&mut self, message_id: u64, positive: bool) -> Option<ChatCommand> {
        self.clear_feedback_prompts();
        let channel = self.channel;
        let message = self.find_mut(message_id)?;
        message.feedback = Some(positive);

        if positive {
            return None;
        }

        let content = if message.is_self {
            message.content.clone()
        } else {
            String::new()
        };
        Some(ChatCommand::SendFeedback {
            content,
            positive,
            channel,
        })
    }

    pub fn on_polled(&mut self, polled: Vec<PolledMessage>) {
        for message in polled {
            let sender = message
                .sender
                .unwrap_or_else(|| self.assistant_name.clone());
            self.clear_feedback_prompts();
            let id = self.allocate_id();
            self.messages.push(Message {
                id,
                sender,
                content: message.content,
                time: now_label(),
                is_self: false,
                show_feedback: true,
                feedback: None,
                image: None,
            });
        }
    }

    pub fn set_channel(&mut self, channel: Channel) {
        if self.channel != channel {
            log::info!("Switching channel to {channel}");
            self.channel = channel;
        }
    }

    pub fn toggle_emoji_picker(&mut self) {
        self.show_emoji_picker = !self.show_emoji_picker;
    }

    pub fn pick_emoji(&mut self, glyph: &str) {
        self.input_text.push_str(glyph);
        self.show_emoji_picker = false;
    }

    pub fn dismiss_emoji_picker(&mut self) {
        self.show_emoji_picker = false;
    }

    fn push_self(&mut self, content: String, image: Option<ImageRef>) -> u64 {
        let id = self.allocate_id();
        self.messages.push(Message {
            id,
            sender: self.user_name.clone(),
            content,
            time: now_label(),
            is_self: true,
            show_feedback: false,
            feedback: None,
            image,
        });
        id
    }

    fn push_reply(&mut self, content: String) {
        self.clear_feedback_prompts();
        let id = self.allocate_id();
        self.messages.push(Message {
            id,
            sender: self.assistant_name.clone(),
            content,
            time: now_label(),
            is_self: false,
            show_feedback: true,
            feedback: None,
            image: None,
        });
    }

    fn clear_feedback_prompts(&mut self) {
        for message in &mut self.messages {
            message.show_feedback = false;
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn find_mut(&mut self, message_id: u64) -> Option<&mut Message> {
        self.messages.iter_mut().find(|message| message.id == message_id)
    }
}

fn now_label() -> String {
    Local::now().format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ConversationState {
        ConversationState::new(&AppConfig::default(), Channel::Chat)
    }

    fn bare_state() -> ConversationState {
        let config = AppConfig {
            greeting: String::new(),
            ..AppConfig::default()
        };
        ConversationState::new(&config, Channel::Chat)
    }

    fn reply(text: &str) -> ChatReply {
        ChatReply {
            reply: Some(text.to_string()),
            image_url: None,
        }
    }

    fn prompts(state: &ConversationState) -> usize {
        state.messages.iter().filter(|m| m.show_feedback).count()
    }

    fn send(state: &mut ConversationState, text: &str) -> Option<ChatCommand> {
        state.input_text = text.to_string();
        state.submit()
    }

    #[test]
    fn greeting_offers_feedback() {
        let state = state();
        assert_eq!(state.messages.len(), 1);
        assert!(!state.messages[0].is_self);
        assert_eq!(prompts(&state), 1);
    }

    #[test]
    fn round_trip_appends_self_then_reply() {
        let mut state = bare_state();
        let command = send(&mut state, "hello");
        assert_eq!(
            command,
            Some(ChatCommand::SendMessage {
                text: "hello".into(),
                channel: Channel::Chat,
            })
        );
        assert!(state.is_typing);
        assert!(state.input_text.is_empty());

        state.on_reply(reply("hi"));
        assert_eq!(state.messages.len(), 2);
        assert!(state.messages[0].is_self);
        assert_eq!(state.messages[0].content, "hello");
        assert!(!state.messages[1].is_self);
        assert_eq!(state.messages[1].content, "hi");
        assert_eq!(state.messages[1].feedback, None);
        assert!(!state.is_typing);
    }

    #[test]
    fn exactly_one_feedback_prompt_after_each_reply() {
        let mut state = state();
        for round in 0..4 {
            send(&mut state, &format!("question {round}")).unwrap();
            assert_eq!(prompts(&state), 0);
            state.on_reply(reply("answer"));
            assert_eq!(prompts(&state), 1);
            assert!(state.messages.last().unwrap().show_feedback);
        }
    }

    #[test]
    fn ids_are_monotonic() {
        let mut state = state();
        send(&mut state, "a");
        state.on_reply(reply("b"));
        state.upload_image(PathBuf::from("/tmp/c.png"));
        let ids: Vec<u64> = state.messages.iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut state = state();
        assert_eq!(send(&mut state, "   "), None);
        assert_eq!(state.messages.len(), 1);
        assert!(!state.is_typing);
    }

    #[test]
    fn missing_reply_text_shows_placeholder() {
        let mut state = bare_state();
        send(&mut state, "hello");
        state.on_reply(ChatReply::default());
        assert_eq!(state.messages[1].content, EMPTY_REPLY);
    }

    #[test]
    fn failed_send_only_stops_typing() {
        let mut state = bare_state();
        send(&mut state, "hello");
        state.on_send_failed("server error: 500");
        assert_eq!(state.messages.len(), 1);
        assert!(!state.is_typing);
    }

    #[test]
    fn thumbs_down_reports_thumbs_up_does_not() {
        let mut state = state();
        send(&mut state, "hello");
        state.on_reply(reply("hi"));
        let reply_id = state.messages.last().unwrap().id;

        assert_eq!(state.record_feedback(reply_id, true), None);
        assert_eq!(state.messages.last().unwrap().feedback, Some(true));
        assert_eq!(prompts(&state), 0);

        let command = state.record_feedback(reply_id, false);
        assert_eq!(
            command,
            Some(ChatCommand::SendFeedback {
                content: String::new(),
                positive: false,
                channel: Channel::Chat,
            })
        );
        assert_eq!(state.messages.last().unwrap().feedback, Some(false));
    }

    #[test]
    fn feedback_on_unknown_message_still_clears_prompts() {
        let mut state = state();
        assert_eq!(state.record_feedback(99, false), None);
        assert_eq!(prompts(&state), 0);
    }

    #[test]
    fn image_upload_swaps_preview_for_remote() {
        let mut state = bare_state();
        let command = state.upload_image(PathBuf::from("/tmp/cat.png"));
        let ChatCommand::UploadImage { message_id, .. } = command else {
            panic!("expected upload command");
        };
        assert_eq!(state.messages.len(), 1);
        assert_eq!(
            state.messages[0].image,
            Some(ImageRef::Preview("file:///tmp/cat.png".into()))
        );

        let released = state.on_image_uploaded(
            message_id,
            ChatReply {
                reply: Some("cute".into()),
                image_url: Some("https://cdn/cat.png".into()),
            },
        );
        assert_eq!(released.as_deref(), Some("file:///tmp/cat.png"));
        assert_eq!(
            state.messages[0].image,
            Some(ImageRef::Remote("https://cdn/cat.png".into()))
        );
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].content, "cute");
        assert_eq!(prompts(&state), 1);
        assert!(!state.is_typing);
    }

    #[test]
    fn image_upload_without_server_url_keeps_preview() {
        let mut state = bare_state();
        state.upload_image(PathBuf::from("/tmp/cat.png"));
        let released = state.on_image_uploaded(1, reply("ok"));
        assert_eq!(released, None);
        assert_eq!(
            state.messages[0].image,
            Some(ImageRef::Preview("file:///tmp/cat.png".into()))
        );
    }

    #[test]
    fn failed_image_upload_leaves_notice() {
        let mut state = bare_state();
        state.upload_image(PathBuf::from("/tmp/cat.png"));
        let released = state.on_image_failed(1);

        assert_eq!(released.as_deref(), Some("file:///tmp/cat.png"));
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].content, FAILED_UPLOAD_NOTICE);
        assert_eq!(state.messages[0].image, None);
        assert!(!state.is_typing);
    }

    #[test]
    fn initialization_fires_once_across_mounts() {
        let mut state = state();
        assert!(matches!(state.mount(), Some(ChatCommand::Initialize { .. })));
        assert_eq!(state.mount(), None);
    }

    #[test]
    fn emoji_goes_into_input_and_closes_picker() {
        let mut state = state();
        state.input_text = "hi ".into();
        state.toggle_emoji_picker();
        assert!(state.show_emoji_picker);
        state.pick_emoji("😀");
        assert_eq!(state.input_text, "hi 😀");
        assert!(!state.show_emoji_picker);

        state.toggle_emoji_picker();
        state.dismiss_emoji_picker();
        assert!(!state.show_emoji_picker);
    }

    #[test]
    fn channel_is_carried_into_commands() {
        let mut state = state();
        state.set_channel(Channel::Freshdesk);
        let command = send(&mut state, "ticket").unwrap();
        assert!(matches!(
            command,
            ChatCommand::SendMessage {
                channel: Channel::Freshdesk,
                ..
            }
        ));
    }

    #[test]
    fn polled_messages_append_as_replies() {
        let mut state = state();
        state.on_polled(vec![PolledMessage {
            sender: None,
            content: "ping".into(),
        }]);
        let last = state.messages.last().unwrap();
        assert_eq!(last.sender, "Ray");
        assert_eq!(last.content, "ping");
        assert_eq!(prompts(&state), 1);
    }
}
