//! Explorer sidebar - color mode, filters, topic list, search and the
//! selected paper

use eframe::egui;
use egui::{Color32, RichText};

use crate::color::{topic_color, ColorMode};
use crate::render::overlay::LABEL_KEYWORDS;
use crate::state::AppState;

const SECTION: Color32 = Color32::from_rgb(0xa1, 0xa1, 0xaa);
const ACCENT: Color32 = Color32::from_rgb(0x60, 0xa5, 0xfa);

/// What the sidebar asks of the controller beyond state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarAction {
    None,
    Reload,
}

fn section(ui: &mut egui::Ui, title: &str) {
    ui.add_space(12.0);
    ui.label(RichText::new(title).small().strong().color(SECTION));
    ui.add_space(4.0);
}

pub fn show_sidebar(ui: &mut egui::Ui, state: &mut AppState) -> SidebarAction {
    let mut action = SidebarAction::None;

    ui.horizontal(|ui| {
        ui.heading(RichText::new("Paper Atlas").color(ACCENT));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.small_button("⟳").on_hover_text("Reload data").clicked() {
                action = SidebarAction::Reload;
            }
        });
    });
    ui.label(
        RichText::new(format!(
            "{} PAPERS • {} TOPICS",
            state.papers().len(),
            state.topics().len()
        ))
        .small()
        .weak(),
    );
    ui.separator();

    egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
        color_mode_section(ui, state);
        filter_section(ui, state);
        search_section(ui, state);
        selected_paper_section(ui, state);
    });

    action
}

fn color_mode_section(ui: &mut egui::Ui, state: &mut AppState) {
    section(ui, "VISUALIZATION MODE");
    egui::Grid::new("color_modes").num_columns(2).spacing([6.0, 6.0]).show(ui, |ui| {
        for (i, mode) in ColorMode::ALL.into_iter().enumerate() {
            let selected = state.color_mode() == mode;
            let text = RichText::new(mode.label()).strong();
            if ui
                .selectable_label(selected, text)
                .on_hover_text(mode.description())
                .clicked()
            {
                state.set_color_mode(mode);
            }
            if i % 2 == 1 {
                ui.end_row();
            }
        }
    });
    ui.label(RichText::new(state.color_mode().description()).small().weak());
}

fn filter_section(ui: &mut egui::Ui, state: &mut AppState) {
    section(ui, "FILTERS");

    ui.horizontal(|ui| {
        let mut labels = state.show_labels();
        if ui.checkbox(&mut labels, "Labels").changed() {
            state.set_show_labels(labels);
        }
        let mut keywords = state.show_keywords();
        if ui.checkbox(&mut keywords, "Keywords").changed() {
            state.set_show_keywords(keywords);
        }
    });

    let mut journal = state.filter_journal().map(str::to_string);
    egui::ComboBox::from_id_salt("journal_filter")
        .width(ui.available_width())
        .selected_text(journal.as_deref().unwrap_or("All Journals"))
        .show_ui(ui, |ui| {
            ui.selectable_value(&mut journal, None, "All Journals");
            for name in state.journals() {
                ui.selectable_value(&mut journal, Some(name.clone()), name);
            }
        });
    state.set_filter_journal(journal);

    ui.add_space(6.0);
    let active = state
        .topics()
        .iter()
        .filter(|t| !state.is_topic_hidden(&t.id))
        .count();
    ui.horizontal(|ui| {
        ui.label(RichText::new("Topic Visibility").small());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(format!("{} Active", active)).small().weak());
        });
    });

    let mut toggled: Option<String> = None;
    egui::ScrollArea::vertical()
        .id_salt("topic_list")
        .max_height(200.0)
        .show(ui, |ui| {
            for topic in state.sorted_topics() {
                let hidden = state.is_topic_hidden(&topic.id);
                let swatch = if hidden { Color32::DARK_GRAY } else { topic_color(&topic.id) };
                let text_color = if hidden { Color32::DARK_GRAY } else { Color32::LIGHT_GRAY };

                let row = ui.horizontal(|ui| {
                    ui.colored_label(swatch, "●");
                    ui.vertical(|ui| {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(format!("Topic {}", topic.id)).color(text_color));
                            ui.label(RichText::new(topic.count.to_string()).small().weak());
                        });
                        let keywords = topic.keyword_summary(LABEL_KEYWORDS);
                        if !keywords.is_empty() {
                            ui.label(RichText::new(keywords).small().weak());
                        }
                    });
                });
                let response = ui.interact(
                    row.response.rect,
                    ui.id().with(("topic_row", &topic.id)),
                    egui::Sense::click(),
                );
                if response.on_hover_text("Toggle visibility").clicked() {
                    toggled = Some(topic.id.clone());
                }
            }
        });
    if let Some(id) = toggled {
        state.toggle_topic_visibility(&id);
    }
}

fn search_section(ui: &mut egui::Ui, state: &mut AppState) {
    section(ui, "SEARCH");
    let mut query = state.search_query().to_string();
    let edit = egui::TextEdit::singleline(&mut query)
        .hint_text("Search paper titles...")
        .desired_width(f32::INFINITY);
    if ui.add(edit).changed() {
        state.set_search_query(query);
    }
}

fn selected_paper_section(ui: &mut egui::Ui, state: &mut AppState) {
    let Some(paper) = state.selected_paper() else {
        return;
    };
    let mut close = false;

    section(ui, "SELECTED PAPER");
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format!("T{}", paper.cluster))
                    .small()
                    .color(Color32::BLACK)
                    .background_color(topic_color(&paper.cluster)),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                close = ui.small_button("✕").clicked();
            });
        });
        ui.label(RichText::new(&paper.title).strong().size(15.0));
        ui.add_space(4.0);
        egui::Grid::new("paper_details").num_columns(2).show(ui, |ui| {
            ui.label(RichText::new("Journal").weak());
            ui.label(&paper.journal);
            ui.end_row();
            ui.label(RichText::new("Year").weak());
            ui.label(paper.year().map_or_else(|| paper.date.clone(), |y| y.to_string()));
            ui.end_row();
            ui.label(RichText::new("Citations").weak());
            ui.label(paper.citations.to_string());
            ui.end_row();
        });
        if !paper.abstract_text.is_empty() {
            ui.add_space(4.0);
            egui::ScrollArea::vertical()
                .id_salt("abstract")
                .max_height(220.0)
                .show(ui, |ui| {
                    ui.label(RichText::new(&paper.abstract_text).small());
                });
        }
    });

    if close {
        state.select(None);
    }
}
