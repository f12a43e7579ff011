use eframe::egui;

use crate::ui::state::{ConversationState, Message};

use super::markdown;

const IMAGE_SIZE: f32 = 128.0;
const BUBBLE_WIDTH: f32 = 320.0;

pub struct FeedbackAction {
    pub message_id: u64,
    pub positive: bool,
}

pub fn render(ui: &mut egui::Ui, state: &ConversationState) -> Option<FeedbackAction> {
    let mut action = None;

    // Leave a row under the thread for the typing line.
    let typing_row = if state.is_typing {
        ui.text_style_height(&egui::TextStyle::Body) + ui.spacing().item_spacing.y
    } else {
        0.0
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .max_height((ui.available_height() - typing_row).max(0.0))
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for message in &state.messages {
                if let Some(feedback) = render_message(ui, message) {
                    action = Some(feedback);
                }
                ui.add_space(6.0);
            }
        });

    if state.is_typing {
        ui.label(
            egui::RichText::new(format!("{} is typing...", state.assistant_name()))
                .italics()
                .weak(),
        );
    }

    action
}

fn render_message(ui: &mut egui::Ui, message: &Message) -> Option<FeedbackAction> {
    let mut action = None;
    let layout = if message.is_self {
        egui::Layout::top_down(egui::Align::Max)
    } else {
        egui::Layout::top_down(egui::Align::Min)
    };

    ui.with_layout(layout, |ui| {
        let fill = if message.is_self {
            ui.visuals().selection.bg_fill
        } else {
            ui.visuals().faint_bg_color
        };

        egui::Frame::new()
            .fill(fill)
            .corner_radius(8.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.set_max_width(BUBBLE_WIDTH);
                if !message.is_self {
                    ui.label(egui::RichText::new(&message.sender).small().strong());
                }

                if let Some(image) = &message.image {
                    ui.add(
                        egui::Image::new(image.uri().to_string())
                            .max_size(egui::vec2(IMAGE_SIZE, IMAGE_SIZE))
                            .corner_radius(6.0),
                    );
                } else if message.is_self {
                    ui.label(&message.content);
                } else {
                    markdown::render(ui, &message.content);
                }

                ui.label(egui::RichText::new(&message.time).small().weak());
            });

        if message.show_feedback && !message.is_self {
            ui.horizontal(|ui| {
                if ui
                    .add(thumb("👍", message.feedback == Some(true), egui::Color32::GREEN))
                    .clicked()
                {
                    action = Some(FeedbackAction {
                        message_id: message.id,
                        positive: true,
                    });
                }
                if ui
                    .add(thumb("👎", message.feedback == Some(false), egui::Color32::RED))
                    .clicked()
                {
                    action = Some(FeedbackAction {
                        message_id: message.id,
                        positive: false,
                    });
                }
            });
        }
    });

    action
}

fn thumb(glyph: &str, active: bool, color: egui::Color32) -> egui::Button<'static> {
    let text = egui::RichText::new(glyph.to_string());
    let text = if active { text.color(color) } else { text.weak() };
    egui::Button::new(text).frame(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Channel, ChatReply};
    use crate::config::AppConfig;

    #[test]
    fn typing_line_stays_inside_panel() {
        let mut state = ConversationState::new(&AppConfig::default(), Channel::Chat);
        for round in 0..30 {
            state.input_text = format!("question {round}");
            state.submit();
            state.on_reply(ChatReply {
                reply: Some(format!("**answer** {round}")),
                image_url: None,
            });
        }
        state.input_text = "one more".into();
        state.submit();
        assert!(state.is_typing);

        let ctx = egui::Context::default();
        let input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(420.0, 640.0),
            )),
            ..Default::default()
        };

        let mut bounds = None;
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                let panel = ui.max_rect();
                render(ui, &state);
                bounds = Some((panel, ui.min_rect()));
            });
        });

        let (panel, used) = bounds.expect("panel was laid out");
        assert!(
            used.bottom() <= panel.bottom() + 0.5,
            "typing line at {used:?} overflows panel {panel:?}"
        );
    }
}
