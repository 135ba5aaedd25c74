//! Application State - Single Source of Truth (SSOT)
//!
//! Owned by the GUI controller and lent to every panel and renderer. Only the
//! named setters mutate it. Each setter that actually changes something bumps
//! the revision of its facet; consumers keep the revisions they last derived
//! from and recompute when those differ.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::color::ColorMode;
use crate::filter::FilterState;
use crate::model::{Dataset, GlobalData, Paper, Topic};

/// Top-level view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Explorer,
    Analysis,
}

/// Change counters, one per facet of the state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revisions {
    /// Papers, topics or global summary replaced
    pub dataset: u64,
    /// Journal filter, search text or hidden topics
    pub filters: u64,
    pub color: u64,
    /// Label/keyword flags or hidden topics
    pub overlay: u64,
    /// Selection or hover
    pub selection: u64,
    pub view: u64,
}

/// Initial view settings, normally taken from the config file
#[derive(Debug, Clone, Copy)]
pub struct ViewDefaults {
    pub color_mode: ColorMode,
    pub show_labels: bool,
    pub show_keywords: bool,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Topic,
            show_labels: true,
            show_keywords: true,
        }
    }
}

pub struct AppState {
    dataset: Dataset,
    journals: Vec<String>,
    topic_order: Vec<usize>,
    selected: Option<usize>,
    hovered: Option<usize>,
    filter_journal: Option<String>,
    search_query: String,
    show_keywords: bool,
    show_labels: bool,
    hidden_topics: BTreeSet<String>,
    color_mode: ColorMode,
    view: View,
    revisions: Revisions,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewDefaults::default())
    }
}

impl AppState {
    /// Empty state; populated later by `set_data`
    pub fn new(defaults: ViewDefaults) -> Self {
        Self {
            dataset: Dataset::default(),
            journals: Vec::new(),
            topic_order: Vec::new(),
            selected: None,
            hovered: None,
            filter_journal: None,
            search_query: String::new(),
            show_keywords: defaults.show_keywords,
            show_labels: defaults.show_labels,
            hidden_topics: BTreeSet::new(),
            color_mode: defaults.color_mode,
            view: View::Explorer,
            revisions: Revisions::default(),
        }
    }

    // ---- reads ----

    pub fn papers(&self) -> &[Paper] {
        &self.dataset.papers
    }

    pub fn topics(&self) -> &[Topic] {
        &self.dataset.topics
    }

    pub fn global(&self) -> Option<&GlobalData> {
        self.dataset.global.as_ref()
    }

    /// Sorted journal names of the current dataset
    pub fn journals(&self) -> &[String] {
        &self.journals
    }

    /// Topics in display order
    pub fn sorted_topics(&self) -> impl Iterator<Item = &Topic> + '_ {
        self.topic_order.iter().map(|&i| &self.dataset.topics[i])
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_paper(&self) -> Option<&Paper> {
        self.selected.and_then(|i| self.dataset.papers.get(i))
    }

    pub fn hovered_index(&self) -> Option<usize> {
        self.hovered
    }

    pub fn hovered_paper(&self) -> Option<&Paper> {
        self.hovered.and_then(|i| self.dataset.papers.get(i))
    }

    pub fn filter_journal(&self) -> Option<&str> {
        self.filter_journal.as_deref()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn show_keywords(&self) -> bool {
        self.show_keywords
    }

    pub fn show_labels(&self) -> bool {
        self.show_labels
    }

    pub fn is_topic_hidden(&self, id: &str) -> bool {
        self.hidden_topics.contains(id)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn revisions(&self) -> Revisions {
        self.revisions
    }

    pub fn filter_state(&self) -> FilterState<'_> {
        FilterState::new(
            self.filter_journal.as_deref(),
            &self.search_query,
            &self.hidden_topics,
        )
    }

    // ---- writes ----

    /// Replace the dataset wholesale
    ///
    /// Selection and hover refer to paper indices, so both are cleared.
    pub fn set_data(&mut self, dataset: Dataset) {
        info!(
            "Dataset replaced: {} papers, {} topics, global={}",
            dataset.papers.len(),
            dataset.topics.len(),
            dataset.global.is_some()
        );
        self.journals = dataset.journals();
        self.topic_order = dataset.topic_order();
        self.dataset = dataset;
        self.selected = None;
        self.hovered = None;
        self.revisions.dataset += 1;
        self.revisions.selection += 1;
        self.revisions.overlay += 1;
    }

    pub fn select(&mut self, index: Option<usize>) {
        if let Some(i) = index {
            if i >= self.dataset.papers.len() {
                warn!("Ignoring selection of paper index {} (only {} papers)", i, self.dataset.papers.len());
                return;
            }
        }
        if self.selected != index {
            debug!("Selection changed: {:?}", index.map(|i| &self.dataset.papers[i].id));
            self.selected = index;
            self.revisions.selection += 1;
        }
    }

    pub fn set_hovered(&mut self, index: Option<usize>) {
        let index = index.filter(|&i| i < self.dataset.papers.len());
        if self.hovered != index {
            self.hovered = index;
            self.revisions.selection += 1;
        }
    }

    pub fn set_filter_journal(&mut self, journal: Option<String>) {
        if self.filter_journal != journal {
            debug!("Journal filter: {:?}", journal);
            self.filter_journal = journal;
            self.revisions.filters += 1;
        }
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if self.search_query != query {
            self.search_query = query;
            self.revisions.filters += 1;
        }
    }

    pub fn set_show_keywords(&mut self, show: bool) {
        if self.show_keywords != show {
            self.show_keywords = show;
            self.revisions.overlay += 1;
        }
    }

    pub fn set_show_labels(&mut self, show: bool) {
        if self.show_labels != show {
            self.show_labels = show;
            self.revisions.overlay += 1;
        }
    }

    pub fn toggle_topic_visibility(&mut self, topic_id: &str) {
        if !self.hidden_topics.remove(topic_id) {
            self.hidden_topics.insert(topic_id.to_string());
        }
        debug!("Topic {} hidden={}", topic_id, self.hidden_topics.contains(topic_id));
        self.revisions.filters += 1;
        self.revisions.overlay += 1;
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        if self.color_mode != mode {
            debug!("Color mode: {:?}", mode);
            self.color_mode = mode;
            self.revisions.color += 1;
        }
    }

    pub fn set_view(&mut self, view: View) {
        if self.view != view {
            info!("View switched to {:?}", view);
            self.view = view;
            self.revisions.view += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{paper, topic};

    fn dataset() -> Dataset {
        Dataset {
            papers: vec![paper("a", "0", "X", "Alpha"), paper("b", "1", "Y", "Beta")],
            topics: vec![topic("1", &[], [0.0; 3]), topic("0", &[], [0.0; 3])],
            global: None,
        }
    }

    #[test]
    fn test_reload_clears_selection_and_hover() {
        let mut state = AppState::default();
        state.set_data(dataset());
        state.select(Some(1));
        state.set_hovered(Some(0));
        assert_eq!(state.selected_paper().map(|p| p.id.as_str()), Some("b"));

        state.set_data(dataset());
        assert!(state.selected_paper().is_none());
        assert!(state.hovered_paper().is_none());
    }

    #[test]
    fn test_out_of_range_selection_ignored() {
        let mut state = AppState::default();
        state.set_data(dataset());
        state.select(Some(0));
        state.select(Some(5));
        assert_eq!(state.selected_index(), Some(0));
        state.select(None);
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn test_toggle_topic_twice_restores() {
        let mut state = AppState::default();
        state.toggle_topic_visibility("3");
        assert!(state.is_topic_hidden("3"));
        state.toggle_topic_visibility("3");
        assert!(!state.is_topic_hidden("3"));
        assert_eq!(state.revisions().filters, 2);
        assert_eq!(state.revisions().overlay, 2);
    }

    #[test]
    fn test_unchanged_setters_do_not_bump() {
        let mut state = AppState::default();
        let before = state.revisions();
        state.set_color_mode(ColorMode::Topic);
        state.set_search_query("");
        state.set_filter_journal(None);
        state.set_show_labels(true);
        state.set_view(View::Explorer);
        assert_eq!(state.revisions(), before);

        state.set_color_mode(ColorMode::Citations);
        state.set_search_query("graph");
        assert_eq!(state.revisions().color, before.color + 1);
        assert_eq!(state.revisions().filters, before.filters + 1);
    }

    #[test]
    fn test_derived_lists_follow_dataset() {
        let mut state = AppState::default();
        state.set_data(dataset());
        assert_eq!(state.journals(), ["X".to_string(), "Y".to_string()]);
        let ids: Vec<&str> = state.sorted_topics().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1"]);
    }

    #[test]
    fn test_defaults_apply() {
        let state = AppState::new(ViewDefaults {
            color_mode: ColorMode::DistGlobal,
            show_labels: false,
            show_keywords: true,
        });
        assert_eq!(state.color_mode(), ColorMode::DistGlobal);
        assert!(!state.show_labels());
        assert_eq!(state.view(), View::Explorer);
    }
}
