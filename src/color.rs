//! Color modes, scales and schemes
//!
//! Domains are computed once per dataset load (`ColorDomains`) and kept
//! apart from the per-point mapping, which is a pure function of the paper,
//! the mode and the cached domains.

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::model::Paper;

/// 20 distinct hues for topic ids
pub const TOPIC_PALETTE: [Color32; 20] = [
    Color32::from_rgb(0xe6, 0x19, 0x4b),
    Color32::from_rgb(0x3c, 0xb4, 0x4b),
    Color32::from_rgb(0xff, 0xe1, 0x19),
    Color32::from_rgb(0x43, 0x63, 0xd8),
    Color32::from_rgb(0xf5, 0x82, 0x31),
    Color32::from_rgb(0x91, 0x1e, 0xb4),
    Color32::from_rgb(0x46, 0xf0, 0xf0),
    Color32::from_rgb(0xf0, 0x32, 0xe6),
    Color32::from_rgb(0xbc, 0xf6, 0x0c),
    Color32::from_rgb(0xfa, 0xbe, 0xbe),
    Color32::from_rgb(0x00, 0x80, 0x80),
    Color32::from_rgb(0xe6, 0xbe, 0xff),
    Color32::from_rgb(0x9a, 0x63, 0x24),
    Color32::from_rgb(0xff, 0xfa, 0xc8),
    Color32::from_rgb(0x80, 0x00, 0x00),
    Color32::from_rgb(0xaa, 0xff, 0xc3),
    Color32::from_rgb(0x80, 0x80, 0x00),
    Color32::from_rgb(0xff, 0xd8, 0xb1),
    Color32::from_rgb(0x00, 0x00, 0x75),
    Color32::from_rgb(0x80, 0x80, 0x80),
];

/// Fallback for cluster ids that are not palette indices
pub const NEUTRAL_GREY: Color32 = Color32::from_rgb(0x88, 0x88, 0x88);

/// Papers with no topic distance in `DistTopic` mode
pub const UNDEFINED_COLOR: Color32 = Color32::from_rgb(0x33, 0x33, 0x33);

/// How points are colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Topic,
    Citations,
    DistTopic,
    DistGlobal,
}

impl ColorMode {
    pub const ALL: [ColorMode; 4] = [
        ColorMode::Topic,
        ColorMode::Citations,
        ColorMode::DistTopic,
        ColorMode::DistGlobal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ColorMode::Topic => "Topic Clusters",
            ColorMode::Citations => "Impact",
            ColorMode::DistTopic => "Typicality",
            ColorMode::DistGlobal => "Centrality",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ColorMode::Topic => "Color by semantic topic groups",
            ColorMode::Citations => "Color by citation count (log scale)",
            ColorMode::DistTopic => "Distance to topic center",
            ColorMode::DistGlobal => "Distance to global center",
        }
    }

    /// Name of the quantity shown on the legend
    pub fn legend_title(self) -> Option<&'static str> {
        match self {
            ColorMode::Topic => None,
            ColorMode::Citations => Some("Citations"),
            ColorMode::DistTopic => Some("Distance to Topic Center"),
            ColorMode::DistGlobal => Some("Distance to Global Center"),
        }
    }

    /// Scheme and whether it runs reversed (small values hot)
    pub fn scheme(self) -> Option<(ColorScheme, bool)> {
        match self {
            ColorMode::Topic => None,
            ColorMode::Citations => Some((ColorScheme::Viridis, false)),
            ColorMode::DistTopic => Some((ColorScheme::Inferno, true)),
            ColorMode::DistGlobal => Some((ColorScheme::Turbo, true)),
        }
    }
}

/// Sequential schemes backed by `colorous`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Viridis,
    Inferno,
    Turbo,
}

impl ColorScheme {
    /// Sample at `t` in [0, 1]; out of range values are clamped
    pub fn sample(self, t: f64) -> Color32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let gradient = match self {
            ColorScheme::Viridis => colorous::VIRIDIS,
            ColorScheme::Inferno => colorous::INFERNO,
            ColorScheme::Turbo => colorous::TURBO,
        };
        let c = gradient.eval_continuous(t);
        Color32::from_rgb(c.r, c.g, c.b)
    }
}

/// Linear map from `[lo, hi]` to `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub lo: f64,
    pub hi: f64,
}

impl LinearScale {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Observed range of the finite values, or `None` if there are none
    pub fn fit(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        (lo <= hi).then_some(Self { lo, hi })
    }

    /// Degenerate domains map to the middle
    pub fn position(&self, value: f64) -> f64 {
        let span = self.hi - self.lo;
        if span == 0.0 {
            0.5
        } else {
            (value - self.lo) / span
        }
    }
}

/// Logarithmic map from `[lo, hi]` (both >= 1) to `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    pub lo: f64,
    pub hi: f64,
}

impl LogScale {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self {
            lo: lo.max(1.0),
            hi: hi.max(1.0),
        }
    }

    pub fn position(&self, value: f64) -> f64 {
        let lo = self.lo.ln();
        let span = self.hi.ln() - lo;
        if span == 0.0 {
            0.5
        } else {
            (value.max(1.0).ln() - lo) / span
        }
    }
}

/// Per-dataset scale domains
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorDomains {
    pub citations: LogScale,
    pub dist_topic: LinearScale,
    pub dist_global: LinearScale,
}

impl Default for ColorDomains {
    fn default() -> Self {
        Self {
            citations: LogScale::new(1.0, 10.0),
            dist_topic: LinearScale::new(0.0, 1.0),
            dist_global: LinearScale::new(0.0, 1.0),
        }
    }
}

impl ColorDomains {
    pub fn from_papers(papers: &[Paper]) -> Self {
        if papers.is_empty() {
            return Self::default();
        }
        let defaults = Self::default();

        let (min_c, max_c) = papers
            .iter()
            .map(|p| p.citations)
            .fold((u64::MAX, 0), |(lo, hi), c| (lo.min(c), hi.max(c)));

        Self {
            citations: LogScale::new(min_c as f64, max_c as f64),
            dist_topic: LinearScale::fit(papers.iter().filter_map(Paper::topic_distance))
                .unwrap_or(defaults.dist_topic),
            dist_global: LinearScale::fit(papers.iter().map(|p| p.dist_to_global))
                .unwrap_or(defaults.dist_global),
        }
    }

    /// Legend bounds for a mode
    pub fn range(&self, mode: ColorMode) -> Option<(f64, f64)> {
        match mode {
            ColorMode::Topic => None,
            ColorMode::Citations => Some((self.citations.lo, self.citations.hi)),
            ColorMode::DistTopic => Some((self.dist_topic.lo, self.dist_topic.hi)),
            ColorMode::DistGlobal => Some((self.dist_global.lo, self.dist_global.hi)),
        }
    }
}

/// Palette color for a topic id; grey for anything that is not an index
pub fn topic_color(cluster: &str) -> Color32 {
    match cluster.trim().parse::<u64>() {
        Ok(i) => TOPIC_PALETTE[(i % TOPIC_PALETTE.len() as u64) as usize],
        Err(_) => NEUTRAL_GREY,
    }
}

/// Color of one paper under `mode`
pub fn paper_color(paper: &Paper, mode: ColorMode, domains: &ColorDomains) -> Color32 {
    match mode {
        ColorMode::Topic => topic_color(&paper.cluster),
        ColorMode::Citations => {
            let t = domains.citations.position(paper.citations.max(1) as f64);
            ColorScheme::Viridis.sample(t)
        }
        ColorMode::DistTopic => match paper.topic_distance() {
            Some(d) => ColorScheme::Inferno.sample(1.0 - domains.dist_topic.position(d)),
            None => UNDEFINED_COLOR,
        },
        ColorMode::DistGlobal => {
            if !paper.dist_to_global.is_finite() {
                return UNDEFINED_COLOR;
            }
            ColorScheme::Turbo.sample(1.0 - domains.dist_global.position(paper.dist_to_global))
        }
    }
}
