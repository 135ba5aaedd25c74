//! Point visibility predicate
//!
//! A paper is drawn only if every active filter lets it through. The same
//! predicate gates hit-testing, so hidden points can never be picked.

use crate::model::Paper;
use std::collections::BTreeSet;

/// Snapshot of the filter settings, borrowed from the store
#[derive(Debug, Clone)]
pub struct FilterState<'a> {
    journal: Option<&'a str>,
    query: String,
    hidden_topics: &'a BTreeSet<String>,
}

impl<'a> FilterState<'a> {
    pub fn new(
        journal: Option<&'a str>,
        search_query: &str,
        hidden_topics: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            journal,
            query: search_query.to_lowercase(),
            hidden_topics,
        }
    }

    pub fn is_visible(&self, paper: &Paper) -> bool {
        if paper.is_noise() {
            return false;
        }
        if self.hidden_topics.contains(&paper.cluster) {
            return false;
        }
        if let Some(journal) = self.journal {
            if paper.journal != journal {
                return false;
            }
        }
        if !self.query.is_empty() && !paper.title.to_lowercase().contains(&self.query) {
            return false;
        }
        true
    }

    /// Indices of the visible papers, in paper order
    #[cfg(test)]
    pub fn visible_indices(&self, papers: &[Paper]) -> Vec<usize> {
        papers
            .iter()
            .enumerate()
            .filter(|(_, p)| self.is_visible(p))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::paper;

    #[test]
    fn test_journal_then_search_narrow_to_nothing() {
        let papers = vec![
            paper("A", "0", "X", "Graph Drawing"),
            paper("B", "1", "Y", "Volume Rendering"),
        ];
        let hidden = BTreeSet::new();

        let by_journal = FilterState::new(Some("X"), "", &hidden);
        assert_eq!(by_journal.visible_indices(&papers), vec![0]);

        let both = FilterState::new(Some("X"), "volume", &hidden);
        assert!(both.visible_indices(&papers).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let papers = vec![paper("B", "1", "Y", "Volume Rendering")];
        let hidden = BTreeSet::new();
        let filter = FilterState::new(None, "VOLUME ren", &hidden);
        assert_eq!(filter.visible_indices(&papers), vec![0]);
    }

    #[test]
    fn test_noise_never_visible() {
        let papers = vec![paper("N", "-1", "X", "Noise")];
        let hidden = BTreeSet::new();
        assert!(!FilterState::new(None, "", &hidden).is_visible(&papers[0]));
        assert!(!FilterState::new(Some("X"), "noise", &hidden).is_visible(&papers[0]));
    }

    #[test]
    fn test_hidden_topic_excludes_its_papers() {
        let papers = vec![paper("A", "3", "X", "a"), paper("B", "4", "X", "b")];
        let hidden: BTreeSet<String> = ["3".to_string()].into_iter().collect();
        let filter = FilterState::new(None, "", &hidden);
        assert_eq!(filter.visible_indices(&papers), vec![1]);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let papers = vec![paper("A", "0", "X", ""), paper("B", "0", "Y", "anything")];
        let hidden = BTreeSet::new();
        assert_eq!(FilterState::new(None, "", &hidden).visible_indices(&papers), vec![0, 1]);
    }
}
