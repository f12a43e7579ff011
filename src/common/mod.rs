pub mod commands;
pub mod events;
pub mod types;

pub use commands::ChatCommand;
pub use events::ChatEvent;
pub use types::{Channel, ChatReply, ChatRequest, InitRequest, MessageItem, PolledMessage};

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;

    #[test]
    fn message_item_uses_iso_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let item = MessageItem::text("hello", at);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["content"], "hello");
        assert_eq!(json["content_type"], "text");
        assert_eq!(json["created_at"], "2024-05-01T12:30:00.000Z");
    }

    #[test]
    fn reply_reads_camel_case_image_url() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"reply":"done","imageUrl":"https://cdn/x.png"}"#).unwrap();
        assert_eq!(reply.reply.as_deref(), Some("done"));
        assert_eq!(reply.image_url.as_deref(), Some("https://cdn/x.png"));

        let empty: ChatReply = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ChatReply::default());
    }

    #[test]
    fn channel_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Channel::Freshdesk).unwrap(), "\"freshdesk\"");
        assert_eq!(Channel::Chat.to_string(), "chat");
    }
}
