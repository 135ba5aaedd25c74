//! Gradient legend for the continuous color modes

use eframe::egui;
use egui::epaint::Mesh;
use egui::{Color32, Rect, RichText, Sense, Shape, Vec2};

use crate::color::{ColorDomains, ColorMode};

const STEPS: usize = 32;

/// Left to right colors of the legend bar; empty in topic mode
///
/// Reversed schemes start hot, so the left end always sits at the domain
/// minimum.
pub fn gradient_stops(mode: ColorMode, steps: usize) -> Vec<Color32> {
    let Some((scheme, reversed)) = mode.scheme() else {
        return Vec::new();
    };
    let last = steps.saturating_sub(1).max(1) as f64;
    (0..steps)
        .map(|i| {
            let t = i as f64 / last;
            scheme.sample(if reversed { 1.0 - t } else { t })
        })
        .collect()
}

fn format_bound(mode: ColorMode, value: f64) -> String {
    match mode {
        ColorMode::Citations => format!("{:.0}", value),
        _ => format!("{:.2}", value),
    }
}

/// Floating legend in the bottom-right corner of `area`
pub fn show_legend(ctx: &egui::Context, area: Rect, mode: ColorMode, domains: &ColorDomains) {
    let (Some(title), Some((lo, hi))) = (mode.legend_title(), domains.range(mode)) else {
        return;
    };
    let stops = gradient_stops(mode, STEPS);

    egui::Area::new(egui::Id::new("color_legend"))
        .fixed_pos(area.right_bottom() - Vec2::new(276.0, 96.0))
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style())
                .fill(Color32::from_black_alpha(204))
                .show(ui, |ui| {
                    ui.set_width(240.0);
                    ui.label(RichText::new(title).strong());

                    let (rect, _) = ui.allocate_exact_size(Vec2::new(240.0, 14.0), Sense::hover());
                    let mut mesh = Mesh::default();
                    let w = rect.width() / stops.len().max(1) as f32;
                    for (i, color) in stops.iter().enumerate() {
                        let x = rect.left() + i as f32 * w;
                        let cell = Rect::from_min_max(
                            egui::pos2(x, rect.top()),
                            egui::pos2(x + w + 0.5, rect.bottom()),
                        );
                        mesh.add_colored_rect(cell, *color);
                    }
                    ui.painter().add(Shape::mesh(mesh));

                    ui.horizontal(|ui| {
                        ui.label(RichText::new(format_bound(mode, lo)).small().weak());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(RichText::new(format_bound(mode, hi)).small().weak());
                        });
                    });
                });
        });
}
