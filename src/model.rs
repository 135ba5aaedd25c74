//! Data model - papers, topics and the corpus-wide summary
//!
//! Records are deserialized straight from the precomputed JSON files.
//! Lenient field readers keep a single malformed record from failing the
//! whole load: numeric ids become strings, null counts and coordinates
//! become 0, and a missing topic distance reads as undefined.

use chrono::{DateTime, Datelike, NaiveDate};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// Cluster id of papers the clustering step left unassigned
pub const NOISE_CLUSTER: &str = "-1";

/// Sentinel for a paper without a meaningful topic distance
pub const UNDEFINED_DISTANCE: f64 = -1.0;

/// One ingested document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    #[serde(deserialize_with = "de::id_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, deserialize_with = "de::coordinate")]
    pub x: f32,
    #[serde(default, deserialize_with = "de::coordinate")]
    pub y: f32,
    #[serde(default, deserialize_with = "de::coordinate")]
    pub z: f32,
    #[serde(deserialize_with = "de::id_string")]
    pub cluster: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default, deserialize_with = "de::count")]
    pub citations: u64,
    #[serde(default = "undefined_distance", deserialize_with = "de::distance_or_undefined")]
    pub dist_to_topic: f64,
    #[serde(default, deserialize_with = "de::distance_or_zero")]
    pub dist_to_global: f64,
}

fn undefined_distance() -> f64 {
    UNDEFINED_DISTANCE
}

impl Paper {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn is_noise(&self) -> bool {
        self.cluster == NOISE_CLUSTER
    }

    /// Distance to the topic centroid, `None` for noise or garbage values
    pub fn topic_distance(&self) -> Option<f64> {
        let d = self.dist_to_topic;
        if d == UNDEFINED_DISTANCE || !d.is_finite() {
            None
        } else {
            Some(d)
        }
    }

    /// Publication year parsed from `date`
    ///
    /// Accepts plain ISO dates, RFC 3339 timestamps and anything that starts
    /// with a four digit year.
    pub fn year(&self) -> Option<i32> {
        let date = self.date.trim();
        if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            return Some(d.year());
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
            return Some(dt.year());
        }
        let prefix: String = date.chars().take(4).collect();
        if prefix.len() == 4 && prefix.chars().all(|c| c.is_ascii_digit()) {
            return prefix.parse().ok();
        }
        None
    }
}

/// One discovered cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(deserialize_with = "de::id_string")]
    pub id: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub position: Vec3,
    #[serde(default, deserialize_with = "de::count")]
    pub count: u64,
}

impl Topic {
    pub fn is_noise(&self) -> bool {
        self.id == NOISE_CLUSTER
    }

    /// The first `n` keywords joined for a label
    pub fn keyword_summary(&self, n: usize) -> String {
        keyword_summary(&self.keywords, n)
    }
}

/// Corpus-wide centroid and its nearest keywords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalData {
    pub position: Vec3,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl GlobalData {
    pub fn keyword_summary(&self, n: usize) -> String {
        keyword_summary(&self.keywords, n)
    }
}

fn keyword_summary(keywords: &[String], n: usize) -> String {
    keywords
        .iter()
        .take(n)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display order for topic ids: numeric when both parse, lexical otherwise
pub fn compare_topic_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Everything the explorer needs, loaded in one go
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub papers: Vec<Paper>,
    pub topics: Vec<Topic>,
    pub global: Option<GlobalData>,
}

/// Summary of how well papers and topics line up
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrityReport {
    pub papers: usize,
    pub topics: usize,
    pub journals: usize,
    pub noise_papers: usize,
    pub undefined_topic_distances: usize,
    pub unknown_cluster_papers: usize,
    pub unknown_clusters: BTreeSet<String>,
    pub has_global: bool,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.unknown_cluster_papers == 0
    }
}

impl Dataset {
    /// Sorted, de-duplicated journal names
    pub fn journals(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.papers.iter().map(|p| p.journal.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Indices into `topics` in display order
    pub fn topic_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.topics.len()).collect();
        order.sort_by(|&a, &b| compare_topic_ids(&self.topics[a].id, &self.topics[b].id));
        order
    }

    pub fn integrity_report(&self) -> IntegrityReport {
        let known: HashSet<&str> = self.topics.iter().map(|t| t.id.as_str()).collect();
        let mut report = IntegrityReport {
            papers: self.papers.len(),
            topics: self.topics.len(),
            journals: self.journals().len(),
            has_global: self.global.is_some(),
            ..Default::default()
        };

        for paper in &self.papers {
            if paper.topic_distance().is_none() {
                report.undefined_topic_distances += 1;
            }
            if paper.is_noise() {
                report.noise_papers += 1;
            } else if !known.contains(paper.cluster.as_str()) {
                report.unknown_cluster_papers += 1;
                report.unknown_clusters.insert(paper.cluster.clone());
            }
        }

        report
    }
}

/// Field readers tolerant of the shapes the upstream pipeline emits
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    /// Accept `"3"`, `3` or `3.0` as the id `"3"`
    pub fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match RawId::deserialize(d)? {
            RawId::Text(s) => s,
            RawId::Int(i) => i.to_string(),
            RawId::Float(f) if f.fract() == 0.0 && f.is_finite() => (f as i64).to_string(),
            RawId::Float(f) => f.to_string(),
        })
    }

    /// Non-negative count; null, negative and non-finite read as 0
    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let v = Option::<f64>::deserialize(d)?;
        Ok(v.filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| v.round() as u64)
            .unwrap_or(0))
    }

    /// Null or non-finite reads as 0
    pub fn coordinate<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
        Ok(Option::<f64>::deserialize(d)?
            .filter(|v| v.is_finite())
            .map_or(0.0, |v| v as f32))
    }

    pub fn distance_or_undefined<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(super::UNDEFINED_DISTANCE))
    }

    pub fn distance_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(0.0))
    }
}
