pub mod chat_area;
pub mod emoji_picker;
pub mod header;
pub mod input_bar;
pub mod markdown;
