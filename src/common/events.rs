use super::types::{ChatReply, PolledMessage};

/// Events the network worker sends back up to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Initialized,
    ReplyReceived(ChatReply),
    SendFailed(String),
    ImageUploaded { message_id: u64, reply: ChatReply },
    ImageFailed { message_id: u64, error: String },
    Polled(Vec<PolledMessage>),
}
