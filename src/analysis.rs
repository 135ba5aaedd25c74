//! Analysis dashboard - static charts over `data/analysis.json`
//!
//! The document is requested the first time the analysis view opens and is
//! kept for the rest of the session, even if it arrives after the user has
//! switched back to the explorer.

use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::loader::LoadError;
use crate::model::compare_topic_ids;
use crate::render::preview::Preview;
use crate::state::AppState;

pub const TOP_JOURNALS: usize = 10;

const JOURNAL_COLOR: Color32 = Color32::from_rgb(0x60, 0xa5, 0xfa);
const ABSTRACT_COLOR: Color32 = Color32::from_rgb(0x34, 0xd3, 0x99);
const TOPIC_COLOR: Color32 = Color32::from_rgb(0xf5, 0x9e, 0x0b);
const TOPIC_DIST_COLOR: Color32 = Color32::from_rgb(0xc0, 0x84, 0xfc);
const GLOBAL_DIST_COLOR: Color32 = Color32::from_rgb(0x34, 0xd3, 0x99);
const PREVIEW_HEIGHT: f32 = 400.0;

/// One `(lo, hi]` distance bucket with the mean citations of its papers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistBin {
    pub bin: String,
    /// Representative distance of the bucket
    #[serde(default, alias = "dist_to_topic", alias = "dist_to_global")]
    pub value: f64,
    #[serde(default)]
    pub citations: f64,
    #[serde(default)]
    pub count: u64,
}

impl DistBin {
    /// Lower bound parsed from the label, else the representative value
    pub fn lower_bound(&self) -> f64 {
        self.bin
            .split(',')
            .next()
            .map(|lo| lo.trim().trim_start_matches(['(', '[']).trim())
            .and_then(|lo| lo.parse::<f64>().ok())
            .filter(|lo| lo.is_finite())
            .unwrap_or(self.value)
    }

    pub fn bin_label(&self) -> String {
        format!("{:.2}", self.lower_bound())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Correlations {
    pub dist_topic_citations: Option<f64>,
    pub dist_global_citations: Option<f64>,
    pub log_dist_topic_citations: Option<f64>,
    pub log_dist_global_citations: Option<f64>,
}

impl Correlations {
    pub fn rows(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("Distance to topic vs citations", self.dist_topic_citations),
            ("Distance to global vs citations", self.dist_global_citations),
            ("log distance to topic vs citations", self.log_dist_topic_citations),
            ("log distance to global vs citations", self.log_dist_global_citations),
        ]
    }
}

/// Precomputed corpus statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisData {
    pub topic_counts: BTreeMap<String, u64>,
    pub topic_journals: BTreeMap<String, BTreeMap<String, u64>>,
    pub top_journals_global: BTreeMap<String, u64>,
    pub abstract_length_dist: BTreeMap<String, u64>,
    pub dist_topic_stats: Vec<DistBin>,
    pub dist_global_stats: Vec<DistBin>,
    pub correlations: Correlations,
}

/// Count descending, then name
fn ranked(counts: &BTreeMap<String, u64>, n: usize) -> Vec<(&str, u64)> {
    let mut rows: Vec<(&str, u64)> = counts.iter().map(|(k, &v)| (k.as_str(), v)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows.truncate(n);
    rows
}

/// Leading number of a bucket label such as "50-100"
fn bucket_start(label: &str) -> Option<f64> {
    label.split('-').next()?.trim().parse().ok()
}

impl AnalysisData {
    pub fn top_journals(&self, n: usize) -> Vec<(&str, u64)> {
        ranked(&self.top_journals_global, n)
    }

    /// Buckets ordered by their numeric lower bound; unparsable labels go last
    pub fn abstract_length_bins(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<(&str, u64)> = self
            .abstract_length_dist
            .iter()
            .map(|(k, &v)| (k.as_str(), v))
            .collect();
        rows.sort_by(|a, b| match (bucket_start(a.0), bucket_start(b.0)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.0.cmp(b.0),
        });
        rows
    }

    /// Topic sizes in display order
    pub fn topic_sizes(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<(&str, u64)> =
            self.topic_counts.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        rows.sort_by(|a, b| compare_topic_ids(a.0, b.0));
        rows
    }

    /// Topics that have a journal breakdown, in display order
    pub fn breakdown_topics(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.topic_journals.keys().map(String::as_str).collect();
        ids.sort_by(|a, b| compare_topic_ids(a, b));
        ids
    }

    pub fn topic_journal_breakdown(&self, topic: &str, n: usize) -> Vec<(&str, u64)> {
        self.topic_journals
            .get(topic)
            .map(|journals| ranked(journals, n))
            .unwrap_or_default()
    }

    /// Papers counted across all topics
    pub fn total_papers(&self) -> u64 {
        self.topic_counts.values().sum()
    }
}

/// `[x, citations]` points for a distance curve
pub fn citation_series(stats: &[DistBin]) -> Vec<[f64; 2]> {
    stats.iter().map(|d| [d.lower_bound(), d.citations]).collect()
}

enum Status {
    NotRequested,
    Loading(oneshot::Receiver<Result<AnalysisData, LoadError>>),
    Ready(AnalysisData),
    Missing(String),
}

pub struct AnalysisDashboard {
    status: Status,
    selected_topic: Option<String>,
    topic_preview: Preview,
    centroid_preview: Preview,
}

impl Default for AnalysisDashboard {
    fn default() -> Self {
        Self {
            status: Status::NotRequested,
            selected_topic: None,
            topic_preview: Preview::topics(),
            centroid_preview: Preview::centroids(),
        }
    }
}

impl AnalysisDashboard {
    /// True until the first load has been started
    pub fn needs_load(&self) -> bool {
        matches!(self.status, Status::NotRequested)
    }

    pub fn start_loading(&mut self, rx: oneshot::Receiver<Result<AnalysisData, LoadError>>) {
        self.status = Status::Loading(rx);
    }

    #[cfg(test)]
    pub fn data(&self) -> Option<&AnalysisData> {
        match &self.status {
            Status::Ready(data) => Some(data),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        matches!(self.status, Status::Loading(_))
    }

    /// Allow another load after a failed one
    pub fn retry(&mut self) {
        if matches!(self.status, Status::Missing(_)) {
            info!("Retrying analysis load");
            self.status = Status::NotRequested;
        }
    }

    /// Pick up a finished load; call once per frame
    pub fn poll(&mut self) {
        let Status::Loading(rx) = &mut self.status else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(data)) => {
                info!("Analysis data ready");
                self.selected_topic = data.breakdown_topics().first().map(|s| s.to_string());
                self.status = Status::Ready(data);
            }
            Ok(Err(e)) => {
                warn!("Analysis data unavailable: {}", e);
                self.status = Status::Missing(e.to_string());
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                warn!("Analysis load task ended without a result");
                self.status = Status::Missing("load task ended unexpectedly".to_string());
            }
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &AppState) {
        let data = match &self.status {
            Status::NotRequested | Status::Loading(_) => {
                ui.centered_and_justified(|ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading analysis...");
                    });
                });
                return;
            }
            Status::Missing(reason) => {
                let retry = ui
                    .vertical_centered(|ui| {
                        ui.add_space(ui.available_height() * 0.35);
                        ui.label(RichText::new("Analysis data not found.").size(18.0));
                        ui.label(RichText::new("Generate data/analysis.json, then retry.").weak());
                        ui.label(RichText::new(reason).small().weak());
                        ui.add_space(8.0);
                        ui.button("Retry").clicked()
                    })
                    .inner;
                if retry {
                    self.retry();
                    ui.ctx().request_repaint();
                }
                return;
            }
            Status::Ready(data) => data,
        };

        let selected_topic = &mut self.selected_topic;
        let topic_preview = &mut self.topic_preview;
        let centroid_preview = &mut self.centroid_preview;
        egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(RichText::new("Mapping the Landscape of Research").size(28.0));
            });
            ui.add_space(16.0);

            ui.heading("Data Overview");
            ui.separator();
            ui.columns(2, |cols| {
                cols[0].label(RichText::new("TOP 10 JOURNALS BY VOLUME").small().strong());
                journal_chart(&mut cols[0], "top_journals", &data.top_journals(TOP_JOURNALS), JOURNAL_COLOR);
                cols[1].label(RichText::new("ABSTRACT LENGTH DISTRIBUTION").small().strong());
                column_chart(&mut cols[1], "abstract_lengths", &data.abstract_length_bins(), ABSTRACT_COLOR);
            });
            ui.add_space(24.0);

            ui.heading("Topic Distribution");
            ui.separator();
            ui.label(format!("{} distinct research topics.", data.topic_counts.len()));
            column_chart(ui, "topic_sizes", &data.topic_sizes(), TOPIC_COLOR);

            let topics = data.breakdown_topics();
            if !topics.is_empty() {
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.label("Journals in topic");
                    let current = selected_topic.clone().unwrap_or_default();
                    egui::ComboBox::from_id_salt("breakdown_topic")
                        .selected_text(format!("Topic {}", current))
                        .show_ui(ui, |ui| {
                            for id in &topics {
                                ui.selectable_value(selected_topic, Some(id.to_string()), format!("Topic {}", id));
                            }
                        });
                });
                if let Some(topic) = selected_topic.as_deref() {
                    journal_chart(
                        ui,
                        "topic_journals",
                        &data.topic_journal_breakdown(topic, TOP_JOURNALS),
                        TOPIC_COLOR,
                    );
                }
            }
            ui.add_space(24.0);

            ui.heading("Semantic Space Visualization");
            ui.separator();
            preview_or_note(ui, topic_preview, state);
            ui.add_space(24.0);

            ui.heading("Key Words");
            ui.separator();
            preview_or_note(ui, centroid_preview, state);
            ui.add_space(24.0);

            ui.heading("Centrality & Impact");
            ui.separator();
            ui.columns(2, |cols| {
                cols[0].label(RichText::new("TOPIC CENTRALITY VS. IMPACT").small().strong());
                distance_chart(&mut cols[0], "dist_topic_citations", &data.dist_topic_stats, TOPIC_DIST_COLOR);
                cols[1].label(RichText::new("GLOBAL CENTRALITY VS. IMPACT").small().strong());
                distance_chart(&mut cols[1], "dist_global_citations", &data.dist_global_stats, GLOBAL_DIST_COLOR);
            });
            ui.add_space(8.0);
            egui::Grid::new("correlations").striped(true).show(ui, |ui| {
                for (name, value) in data.correlations.rows() {
                    ui.label(name);
                    ui.monospace(value.map_or("n/a".to_string(), |v| format!("{:+.3}", v)));
                    ui.end_row();
                }
            });
            ui.add_space(24.0);

            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new(format!("Analysis generated from {} papers.", data.total_papers()))
                        .weak(),
                );
            });
        });
    }
}

fn preview_or_note(ui: &mut egui::Ui, preview: &mut Preview, state: &AppState) {
    if state.papers().is_empty() {
        ui.label(RichText::new("Paper data is not loaded; open the explorer to retry.").weak());
    } else {
        preview.show(ui, state, PREVIEW_HEIGHT);
    }
}

/// Horizontal bars, largest on top
fn journal_chart(ui: &mut egui::Ui, id: &str, rows: &[(&str, u64)], color: Color32) {
    let names: Vec<String> = rows.iter().rev().map(|(n, _)| n.to_string()).collect();
    let bars: Vec<Bar> = rows
        .iter()
        .rev()
        .enumerate()
        .map(|(i, (name, count))| Bar::new(i as f64, *count as f64).name(*name).width(0.7).fill(color))
        .collect();
    let chart = BarChart::new(bars).horizontal().color(color);

    Plot::new(id)
        .height(300.0)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show_grid([true, false])
        .include_x(0.0)
        .y_axis_formatter(move |mark, _range| label_at(&names, mark.value))
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Vertical bars labelled by category
fn column_chart(ui: &mut egui::Ui, id: &str, rows: &[(&str, u64)], color: Color32) {
    let names: Vec<String> = rows.iter().map(|(n, _)| n.to_string()).collect();
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, (name, count))| Bar::new(i as f64, *count as f64).name(*name).width(0.8).fill(color))
        .collect();
    let chart = BarChart::new(bars).color(color);

    Plot::new(id)
        .height(260.0)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show_grid([false, true])
        .include_y(0.0)
        .x_axis_formatter(move |mark, _range| label_at(&names, mark.value))
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

fn distance_chart(ui: &mut egui::Ui, id: &str, stats: &[DistBin], color: Color32) {
    let line = Line::new(PlotPoints::from(citation_series(stats)))
        .color(color)
        .width(2.0)
        .name("Avg. citations");
    let bins = stats.to_vec();
    Plot::new(id)
        .height(200.0)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(|mark, _range| format!("{:.2}", mark.value))
        .label_formatter(move |_name, point| match nearest_bin_label(&bins, point.x) {
            Some(label) => format!("bin {}\n{:.1} citations", label, point.y),
            None => String::new(),
        })
        .show(ui, |plot_ui| plot_ui.line(line));
}

/// Label of the bin whose lower bound is closest to `x`
fn nearest_bin_label(stats: &[DistBin], x: f64) -> Option<String> {
    stats
        .iter()
        .min_by(|a, b| (a.lower_bound() - x).abs().total_cmp(&(b.lower_bound() - x).abs()))
        .map(DistBin::bin_label)
}

/// Category name for an integer grid mark
fn label_at(names: &[String], value: f64) -> String {
    if value < 0.0 || value.fract().abs() > 1e-6 {
        return String::new();
    }
    names.get(value as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "topic_counts": {"10": 5, "2": 7, "0": 3},
        "topic_journals": {"2": {"TVCG": 4, "CGF": 4, "VIS": 1}, "0": {"TVCG": 3}},
        "top_journals_global": {"A": 5, "B": 9, "C": 5, "D": 1},
        "abstract_length_dist": {"100-150": 4, "0-50": 2, "50-100": 8, "other": 1},
        "dist_topic_stats": [
            {"bin": "(0.1, 0.2]", "dist_to_topic": 0.15, "citations": 12.5, "count": 40},
            {"bin": "garbage", "dist_to_topic": 0.25, "citations": 8.0, "count": 10}
        ],
        "dist_global_stats": [
            {"bin": "(-0.1, 0.5]", "dist_to_global": 0.25, "citations": 20.0, "count": 3}
        ],
        "correlations": {"dist_topic_citations": -0.21, "dist_global_citations": null}
    }"#;

    fn sample() -> AnalysisData {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_top_journals_ranked_by_count_then_name() {
        let data = sample();
        assert_eq!(data.top_journals(3), vec![("B", 9), ("A", 5), ("C", 5)]);
        assert_eq!(data.top_journals(10).len(), 4);
    }

    #[test]
    fn test_abstract_bins_sorted_numerically() {
        let data = sample();
        let labels: Vec<&str> = data.abstract_length_bins().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["0-50", "50-100", "100-150", "other"]);
    }

    #[test]
    fn test_topic_sizes_in_display_order() {
        let data = sample();
        let ids: Vec<&str> = data.topic_sizes().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["0", "2", "10"]);
        assert_eq!(data.total_papers(), 15);
    }

    #[test]
    fn test_topic_breakdown() {
        let data = sample();
        assert_eq!(data.breakdown_topics(), vec!["0", "2"]);
        assert_eq!(
            data.topic_journal_breakdown("2", 2),
            vec![("CGF", 4), ("TVCG", 4)]
        );
        assert!(data.topic_journal_breakdown("99", 10).is_empty());
    }

    #[test]
    fn test_dist_bins_use_lower_bound_with_fallback() {
        let data = sample();
        assert_eq!(data.dist_topic_stats[0].lower_bound(), 0.1);
        assert_eq!(data.dist_topic_stats[0].bin_label(), "0.10");
        assert_eq!(data.dist_topic_stats[1].lower_bound(), 0.25);
        assert_eq!(data.dist_global_stats[0].bin_label(), "-0.10");
        assert_eq!(citation_series(&data.dist_topic_stats), vec![[0.1, 12.5], [0.25, 8.0]]);
    }

    #[test]
    fn test_hover_label_picks_nearest_bin() {
        let data = sample();
        let stats = &data.dist_topic_stats;
        assert_eq!(nearest_bin_label(stats, 0.12).as_deref(), Some("0.10"));
        assert_eq!(nearest_bin_label(stats, 0.3).as_deref(), Some("0.25"));
        assert_eq!(nearest_bin_label(&[], 0.3), None);
    }

    #[test]
    fn test_missing_sections_default() {
        let data: AnalysisData = serde_json::from_str(r#"{"topic_counts": {"1": 2}}"#).unwrap();
        assert!(data.dist_topic_stats.is_empty());
        assert!(data.top_journals(10).is_empty());
        assert_eq!(data.correlations, Correlations::default());
        assert_eq!(sample().correlations.dist_global_citations, None);
    }

    #[test]
    fn test_dashboard_keeps_late_result() {
        let mut dashboard = AnalysisDashboard::default();
        assert!(dashboard.needs_load());
        let (tx, rx) = oneshot::channel();
        dashboard.start_loading(rx);
        dashboard.poll();
        assert!(dashboard.is_loading());

        tx.send(Ok(sample())).unwrap();
        dashboard.poll();
        assert_eq!(dashboard.data().map(|d| d.topic_counts.len()), Some(3));
        assert!(!dashboard.needs_load());
    }

    #[test]
    fn test_dashboard_failure_shows_missing() {
        let mut dashboard = AnalysisDashboard::default();
        let (tx, rx) = oneshot::channel();
        dashboard.start_loading(rx);
        drop(tx);
        dashboard.poll();
        assert!(dashboard.data().is_none());
        assert!(!dashboard.is_loading());
        assert!(!dashboard.needs_load());

        dashboard.retry();
        assert!(dashboard.needs_load());
    }

    #[test]
    fn test_retry_leaves_loaded_data_alone() {
        let mut dashboard = AnalysisDashboard::default();
        let (tx, rx) = oneshot::channel();
        dashboard.start_loading(rx);
        tx.send(Ok(sample())).unwrap();
        dashboard.poll();
        dashboard.retry();
        assert!(!dashboard.needs_load());
        assert!(dashboard.data().is_some());
    }

    #[test]
    fn test_label_at_integer_marks_only() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(label_at(&names, 1.0), "b");
        assert_eq!(label_at(&names, 0.5), "");
        assert_eq!(label_at(&names, 5.0), "");
    }
}
