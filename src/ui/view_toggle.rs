//! Explorer / Analysis switch

use eframe::egui;
use egui::{Color32, RichText};

use crate::state::{AppState, View};

const EXPLORER_ACCENT: Color32 = Color32::from_rgb(0x25, 0x63, 0xeb);
const ANALYSIS_ACCENT: Color32 = Color32::from_rgb(0x05, 0x96, 0x69);

pub fn show_view_toggle(ui: &mut egui::Ui, state: &mut AppState) {
    ui.horizontal_centered(|ui| {
        for (view, label, accent) in [
            (View::Explorer, "🌐 Explorer", EXPLORER_ACCENT),
            (View::Analysis, "📊 Analysis", ANALYSIS_ACCENT),
        ] {
            let active = state.view() == view;
            let text = if active {
                RichText::new(label).strong().color(Color32::WHITE)
            } else {
                RichText::new(label)
            };
            let button = egui::Button::new(text)
                .fill(if active { accent } else { Color32::TRANSPARENT })
                .rounding(12.0);
            if ui.add(button).clicked() {
                state.set_view(view);
            }
        }
    });
}
