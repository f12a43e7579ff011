use std::path::PathBuf;

use eframe::egui;

#[derive(Default)]
pub struct InputActions {
    pub submit: bool,
    pub toggle_emoji: bool,
    pub image: Option<PathBuf>,
    /// Screen rect of the emoji button; the picker opens above it.
    pub emoji_button: Option<egui::Rect>,
}

pub fn render(ui: &mut egui::Ui, input_text: &mut String) -> InputActions {
    let mut actions = InputActions::default();

    ui.horizontal(|ui| {
        let emoji = ui.button("😊");
        if emoji.clicked() {
            actions.toggle_emoji = true;
        }
        actions.emoji_button = Some(emoji.rect);

        if ui.button("➕").on_hover_text("Upload image").clicked() {
            actions.image = pick_image();
        }

        let send_width = 60.0;
        let response = ui.add(
            egui::TextEdit::singleline(input_text)
                .hint_text("Type your message here...")
                .desired_width(ui.available_width() - send_width),
        );
        if ui.button("Send").clicked() {
            actions.submit = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            actions.submit = true;
            response.request_focus();
        }
    });

    actions
}

fn pick_image() -> Option<PathBuf> {
    let path = rfd::FileDialog::new()
        .add_filter("images", &["png", "jpg", "jpeg", "gif", "webp"])
        .set_title("Select Image")
        .pick_file();
    if path.is_none() {
        log::debug!("Image selection cancelled");
    }
    path
}
