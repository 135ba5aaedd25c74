//! Full-screen loading and error views

use eframe::egui;
use egui::{Color32, RichText};

pub fn loading_view(ui: &mut egui::Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() * 0.4);
        ui.add(egui::Spinner::new().size(32.0));
        ui.add_space(8.0);
        ui.label(RichText::new("Loading Semantic Space...").size(16.0));
    });
}

/// Returns true when the user asks to retry
pub fn error_view(ui: &mut egui::Ui, message: &str) -> bool {
    let mut retry = false;
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() * 0.35);
        ui.label(
            RichText::new("Failed to load the paper map")
                .size(18.0)
                .color(Color32::from_rgb(0xf8, 0x71, 0x71)),
        );
        ui.add_space(8.0);
        ui.label(RichText::new(message).weak());
        ui.add_space(12.0);
        retry = ui.button("Retry").clicked();
    });
    retry
}
