use std::path::PathBuf;

use super::types::Channel;

/// Commands the UI sends down to the network worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// One-shot backend setup.
    Initialize {
        index: String,
        sop_namespace: String,
        kb_namespace: String,
    },
    SendMessage {
        text: String,
        channel: Channel,
    },
    /// Upload a picked image; `message_id` is the optimistic thread entry
    /// holding the local preview.
    UploadImage {
        message_id: u64,
        path: PathBuf,
        channel: Channel,
    },
    SendFeedback {
        content: String,
        positive: bool,
        channel: Channel,
    },
}
