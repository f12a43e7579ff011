use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{ChatCommand, ChatEvent};

use super::components::{chat_area, emoji_picker, header, input_bar};
use super::state::ConversationState;

pub struct ChatApp {
    state: ConversationState,
    command_sender: mpsc::Sender<ChatCommand>,
    event_receiver: mpsc::Receiver<ChatEvent>,
}

impl ChatApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        mut state: ConversationState,
        command_sender: mpsc::Sender<ChatCommand>,
        event_receiver: mpsc::Receiver<ChatEvent>,
    ) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let initialize = state.mount();
        let mut app = Self {
            state,
            command_sender,
            event_receiver,
        };
        if let Some(command) = initialize {
            app.send_command(command);
        }
        app
    }

    fn handle_network_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.event_receiver.try_recv() {
            let released = match event {
                ChatEvent::Initialized => {
                    log::info!("Backend ready");
                    None
                }
                ChatEvent::ReplyReceived(reply) => {
                    self.state.on_reply(reply);
                    None
                }
                ChatEvent::SendFailed(error) => {
                    self.state.on_send_failed(&error);
                    None
                }
                ChatEvent::ImageUploaded { message_id, reply } => {
                    self.state.on_image_uploaded(message_id, reply)
                }
                ChatEvent::ImageFailed { message_id, error } => {
                    log::warn!("Image upload {message_id} failed: {error}");
                    self.state.on_image_failed(message_id)
                }
                ChatEvent::Polled(messages) => {
                    self.state.on_polled(messages);
                    None
                }
            };

            if let Some(uri) = released {
                ctx.forget_image(&uri);
            }
        }
    }

    fn send_command(&mut self, command: ChatCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to network: {err}");
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events(ctx);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            if let Some(channel) = header::render(ui, self.state.assistant_name(), self.state.channel)
            {
                self.state.set_channel(channel);
            }
        });

        let input = egui::TopBottomPanel::bottom("input_bar")
            .show(ctx, |ui| {
                ui.add_space(4.0);
                let actions = input_bar::render(ui, &mut self.state.input_text);
                ui.add_space(4.0);
                actions
            })
            .inner;

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(feedback) = chat_area::render(ui, &self.state) {
                if let Some(command) = self
                    .state
                    .record_feedback(feedback.message_id, feedback.positive)
                {
                    self.send_command(command);
                }
            }
        });

        if input.toggle_emoji {
            self.state.toggle_emoji_picker();
        }
        if self.state.show_emoji_picker {
            if let Some(button) = input.emoji_button {
                let outcome = emoji_picker::render(ctx, button.left_top(), button);
                if let Some(glyph) = outcome.picked {
                    self.state.pick_emoji(glyph);
                } else if outcome.clicked_outside {
                    self.state.dismiss_emoji_picker();
                }
            }
        }

        if let Some(path) = input.image {
            let command = self.state.upload_image(path);
            self.send_command(command);
        }
        if input.submit {
            if let Some(command) = self.state.submit() {
                self.send_command(command);
            }
        }

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
