use eframe::egui;

use crate::common::Channel;

/// Assistant title plus channel selector. Returns the newly chosen channel.
pub fn render(ui: &mut egui::Ui, assistant_name: &str, channel: Channel) -> Option<Channel> {
    let mut selected = channel;

    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.heading(assistant_name);
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::GREEN, "●");
                ui.label(egui::RichText::new("Online").small());
            });
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            egui::ComboBox::from_id_salt("channel")
                .selected_text(selected.label())
                .show_ui(ui, |ui| {
                    for option in Channel::ALL {
                        ui.selectable_value(&mut selected, option, option.label());
                    }
                });
        });
    });

    (selected != channel).then_some(selected)
}
