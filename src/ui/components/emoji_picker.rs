use eframe::egui;

pub const EMOJIS: &[&str] = &[
    "😀", "😂", "😊", "😍", "🤔", "😅", "😢", "😮", "😡", "😴", "👍", "👎", "👏", "🙏", "💪",
    "👋", "🎉", "🔥", "✅", "❌", "❤", "⭐", "💡", "📎",
];
const COLUMNS: usize = 8;

#[derive(Default)]
pub struct PickerOutcome {
    pub picked: Option<&'static str>,
    pub clicked_outside: bool,
}

/// Draws the picker above `anchor`. A press anywhere outside the popup, other
/// than on `toggle_rect`, is reported as `clicked_outside`.
pub fn render(ctx: &egui::Context, anchor: egui::Pos2, toggle_rect: egui::Rect) -> PickerOutcome {
    let mut outcome = PickerOutcome::default();

    let area = egui::Area::new(egui::Id::new("emoji_picker"))
        .order(egui::Order::Foreground)
        .fixed_pos(anchor)
        .pivot(egui::Align2::LEFT_BOTTOM)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                egui::Grid::new("emoji_grid").show(ui, |ui| {
                    for (i, emoji) in EMOJIS.iter().enumerate() {
                        if ui.button(*emoji).clicked() {
                            outcome.picked = Some(*emoji);
                        }
                        if (i + 1) % COLUMNS == 0 {
                            ui.end_row();
                        }
                    }
                });
            });
        });

    let popup_rect = area.response.rect;
    outcome.clicked_outside = ctx.input(|i| {
        i.pointer.any_pressed()
            && i
                .pointer
                .interact_pos()
                .is_some_and(|pos| !popup_rect.contains(pos) && !toggle_rect.contains(pos))
    });

    outcome
}
