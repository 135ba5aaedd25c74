//! Topic centroids, the global node and the connectors between them
//!
//! `build_overlay` turns the state into world-space overlay items; the
//! renderer caches that and only re-derives it when the dataset or overlay
//! revision moves. Connectors are decoration and never take part in picking.
//! The noise cluster gets neither a marker nor a connector.

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};
use glam::Vec3;
use tracing::debug;

use super::camera::{OrbitCamera, Projected};
use super::scene::Lighting;
use crate::color::topic_color;
use crate::model::Topic;
use crate::state::AppState;

/// How many keywords a label shows
pub const LABEL_KEYWORDS: usize = 3;
/// Arrow sits this far before the topic centroid
pub const ARROW_SETBACK: f32 = 0.5;

const TOPIC_RADIUS: f32 = 0.15;
const CENTROID_RADIUS: f32 = 0.2;
const GLOBAL_RADIUS: f32 = 0.3;
const ARROW_RADIUS: f32 = 0.08;
const ARROW_LENGTH: f32 = 0.2;
const KEYWORD_CHARS: usize = 32;

const TOPIC_TITLE: Color32 = Color32::from_rgb(0x93, 0xc5, 0xfd);
const TOPIC_LABEL_FILL: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 128);
const GLOBAL_LABEL_FILL: Color32 = Color32::from_rgba_premultiplied(0x1d, 0x4e, 0xc4, 230);

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub title: String,
    /// Present only while keywords are switched on
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicMarker {
    pub topic_id: String,
    pub position: Vec3,
    /// World units
    pub radius: f32,
    pub color: Color32,
    pub label: Option<Label>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalNode {
    pub position: Vec3,
    pub label: Option<Label>,
}

/// Dashed line from the global node to one topic centroid
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub topic_id: String,
    pub start: Vec3,
    pub end: Vec3,
    pub arrow_at: Vec3,
    /// Unit vector from start to end
    pub direction: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub markers: Vec<TopicMarker>,
    pub global: Option<GlobalNode>,
    pub connectors: Vec<Connector>,
}

fn make_label(state: &AppState, title: String, keywords: String) -> Option<Label> {
    state.show_labels().then(|| Label {
        title,
        keywords: state.show_keywords().then_some(keywords),
    })
}

/// Derive the overlay for the current dataset and flags
pub fn build_overlay(state: &AppState) -> Overlay {
    let mut overlay = Overlay::default();

    for topic in state.sorted_topics() {
        if topic.is_noise() || state.is_topic_hidden(&topic.id) {
            continue;
        }
        overlay.markers.push(TopicMarker {
            topic_id: topic.id.clone(),
            position: topic.position,
            radius: TOPIC_RADIUS,
            color: topic_color(&topic.id),
            label: make_label(
                state,
                format!("Topic {}", topic.id),
                topic.keyword_summary(LABEL_KEYWORDS),
            ),
        });
    }

    let Some(global) = state.global() else {
        return overlay;
    };
    overlay.global = Some(GlobalNode {
        position: global.position,
        label: make_label(state, "Global".to_string(), global.keyword_summary(LABEL_KEYWORDS)),
    });

    for topic in state.sorted_topics() {
        if topic.is_noise() || state.is_topic_hidden(&topic.id) {
            continue;
        }
        let Some(direction) = (topic.position - global.position).try_normalize() else {
            debug!("Skipping zero-length connector to topic {}", topic.id);
            continue;
        };
        overlay.connectors.push(Connector {
            topic_id: topic.id.clone(),
            start: global.position,
            end: topic.position,
            arrow_at: topic.position - direction * ARROW_SETBACK,
            direction,
        });
    }

    overlay
}

/// Label of a centroid: its first keyword, then the next two below it
fn centroid_label(topic: &Topic) -> Label {
    let title = topic
        .keywords
        .first()
        .cloned()
        .unwrap_or_else(|| format!("Topic {}", topic.id));
    let rest = topic.keywords.iter().skip(1).take(2).cloned().collect::<Vec<_>>().join(", ");
    Label {
        title,
        keywords: (!rest.is_empty()).then_some(rest),
    }
}

/// Every non-noise centroid with its keyword label; ignores the explorer's
/// topic visibility and label switches
pub fn build_centroid_overlay<'a>(topics: impl Iterator<Item = &'a Topic>) -> Overlay {
    let markers = topics
        .filter(|topic| !topic.is_noise())
        .map(|topic| TopicMarker {
            topic_id: topic.id.clone(),
            position: topic.position,
            radius: CENTROID_RADIUS,
            color: topic_color(&topic.id),
            label: Some(centroid_label(topic)),
        })
        .collect();
    Overlay {
        markers,
        ..Default::default()
    }
}

#[derive(Default)]
pub struct OverlayRenderer {
    overlay: Overlay,
    synced: Option<(u64, u64)>,
}

impl OverlayRenderer {
    /// Rebuild if the dataset or overlay flags changed
    pub fn sync(&mut self, state: &AppState) -> bool {
        let r = state.revisions();
        let key = (r.dataset, r.overlay);
        if self.synced == Some(key) {
            return false;
        }
        self.overlay = build_overlay(state);
        self.synced = Some(key);
        debug!(
            "Overlay rebuilt: {} markers, {} connectors, global={}",
            self.overlay.markers.len(),
            self.overlay.connectors.len(),
            self.overlay.global.is_some()
        );
        true
    }

    /// Rebuild the centroid view when the dataset changes
    pub fn sync_centroids(&mut self, state: &AppState) -> bool {
        let key = (state.revisions().dataset, 0);
        if self.synced == Some(key) {
            return false;
        }
        self.overlay = build_centroid_overlay(state.sorted_topics());
        self.synced = Some(key);
        debug!("Centroid overlay rebuilt: {} markers", self.overlay.markers.len());
        true
    }

    pub fn paint(&self, painter: &Painter, camera: &OrbitCamera, rect: Rect, lighting: &Lighting) {
        let project = camera.projector(rect);
        let eye = camera.eye();

        for connector in &self.overlay.connectors {
            let (Some(a), Some(b)) = (project(connector.start), project(connector.end)) else {
                continue;
            };
            let stroke = Stroke::new(1.0, Color32::from_white_alpha(38));
            painter.extend(Shape::dashed_line(&[a.pos, b.pos], stroke, 6.0, 6.0));

            let half = connector.direction * (ARROW_LENGTH * 0.5);
            let base = project(connector.arrow_at - half);
            let tip = project(connector.arrow_at + half);
            if let (Some(base), Some(tip)) = (base, tip) {
                paint_arrow(painter, base, tip);
            }
        }

        // Far to near so closer markers cover farther ones
        let mut markers: Vec<(&TopicMarker, Projected)> = self
            .overlay
            .markers
            .iter()
            .filter_map(|m| project(m.position).map(|p| (m, p)))
            .collect();
        markers.sort_by(|a, b| b.1.depth.total_cmp(&a.1.depth));

        for (marker, p) in &markers {
            let r = (marker.radius * p.pixels_per_unit).max(3.0);
            let normal = (eye - marker.position).try_normalize().unwrap_or(Vec3::Z);
            let lit = lighting.shade(marker.color, marker.position, normal);
            painter.circle_filled(p.pos, r, lit);

            let to_light = project(lighting.light_position)
                .map(|l| (l.pos - p.pos).normalized())
                .unwrap_or(Vec2::new(0.7, -0.7));
            painter.circle_filled(p.pos + to_light * r * 0.35, r * 0.35, Lighting::specular(lit));
        }

        let global = self
            .overlay
            .global
            .as_ref()
            .and_then(|g| project(g.position).map(|p| (g, p)));
        if let Some((_, p)) = &global {
            let r = (GLOBAL_RADIUS * p.pixels_per_unit).max(4.0);
            painter.circle_filled(p.pos, r * 1.6, Color32::from_white_alpha(30));
            painter.circle_filled(p.pos, r, Color32::WHITE);
        }

        for (marker, p) in &markers {
            if let Some(label) = &marker.label {
                paint_label(painter, p, label, TOPIC_TITLE, TOPIC_LABEL_FILL);
            }
        }
        if let Some((node, p)) = global {
            if let Some(label) = &node.label {
                paint_label(painter, &p, label, Color32::WHITE, GLOBAL_LABEL_FILL);
            }
        }
    }
}

fn paint_arrow(painter: &Painter, base: Projected, tip: Projected) {
    let axis = tip.pos - base.pos;
    if axis.length() < 0.5 {
        return;
    }
    let perp = axis.normalized().rot90();
    let half_width = (ARROW_RADIUS * base.pixels_per_unit).max(2.0);
    painter.add(Shape::convex_polygon(
        vec![tip.pos, base.pos + perp * half_width, base.pos - perp * half_width],
        Color32::from_white_alpha(77),
        Stroke::NONE,
    ));
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max_chars - 1).collect();
        short.push('…');
        short
    }
}

/// Label box centered just above the projected point; text shrinks with distance
fn paint_label(painter: &Painter, at: &Projected, label: &Label, title_color: Color32, fill: Color32) {
    let size = (12.0 * 10.0 / at.depth.max(0.1)).clamp(9.0, 16.0);
    let title = painter.layout_no_wrap(label.title.clone(), FontId::proportional(size), title_color);
    let keywords = label.keywords.as_ref().filter(|k| !k.is_empty()).map(|k| {
        painter.layout_no_wrap(
            truncate(k, KEYWORD_CHARS),
            FontId::proportional(size * 0.8),
            Color32::from_white_alpha(204),
        )
    });

    let pad = Vec2::new(6.0, 3.0);
    let mut content = title.size();
    if let Some(k) = &keywords {
        content.x = content.x.max(k.size().x);
        content.y += k.size().y;
    }
    let anchor = at.pos - Vec2::new(0.0, 10.0);
    let bg = Align2::CENTER_BOTTOM.anchor_size(anchor, content + pad * 2.0);
    painter.rect(bg, 3.0, fill, Stroke::new(1.0, Color32::from_white_alpha(51)));

    let mut cursor = Pos2::new(bg.min.x + pad.x, bg.min.y + pad.y);
    let title_height = title.size().y;
    painter.galley(cursor, title, title_color);
    cursor.y += title_height;
    if let Some(k) = keywords {
        painter.galley(cursor, k, Color32::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::topic;
    use crate::model::{Dataset, GlobalData};
    use glam::Vec3;

    fn state(global: bool) -> AppState {
        let mut state = AppState::default();
        state.set_data(Dataset {
            papers: Vec::new(),
            topics: vec![
                topic("1", &["volume", "rendering", "gpu", "ray"], [4.0, 0.0, 0.0]),
                topic("0", &["graph", "layout"], [0.0, 3.0, 0.0]),
                topic("-1", &[], [1.0, 1.0, 1.0]),
                topic("2", &["same"], [0.0, 0.0, 0.0]),
            ],
            global: global.then(|| GlobalData {
                position: Vec3::ZERO,
                keywords: vec!["data".into(), "visual".into(), "analysis".into(), "more".into()],
            }),
        });
        state
    }

    #[test]
    fn test_markers_in_display_order_without_noise() {
        let overlay = build_overlay(&state(false));
        let ids: Vec<&str> = overlay.markers.iter().map(|m| m.topic_id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(overlay.markers[1].color, topic_color("1"));
        let label = overlay.markers[1].label.as_ref().unwrap();
        assert_eq!(label.title, "Topic 1");
        assert_eq!(label.keywords.as_deref(), Some("volume, rendering, gpu"));
    }

    #[test]
    fn test_hidden_topic_loses_marker_label_and_connector() {
        let mut state = state(true);
        state.toggle_topic_visibility("1");
        let overlay = build_overlay(&state);
        assert!(overlay.markers.iter().all(|m| m.topic_id != "1"));
        assert!(overlay.connectors.iter().all(|c| c.topic_id != "1"));
    }

    #[test]
    fn test_labels_off_removes_every_label() {
        let mut state = state(true);
        state.set_show_labels(false);
        let overlay = build_overlay(&state);
        assert!(overlay.markers.iter().all(|m| m.label.is_none()));
        assert!(overlay.global.as_ref().unwrap().label.is_none());
        assert_eq!(overlay.markers.len(), 3);
    }

    #[test]
    fn test_keywords_off_keeps_titles() {
        let mut state = state(true);
        state.set_show_keywords(false);
        let overlay = build_overlay(&state);
        let global = overlay.global.unwrap();
        assert_eq!(global.label.as_ref().unwrap().title, "Global");
        assert!(global.label.unwrap().keywords.is_none());
        assert!(overlay.markers.iter().all(|m| m.label.as_ref().unwrap().keywords.is_none()));
    }

    #[test]
    fn test_no_global_means_no_node_or_connectors() {
        let overlay = build_overlay(&state(false));
        assert!(overlay.global.is_none());
        assert!(overlay.connectors.is_empty());
        assert!(!overlay.markers.is_empty());
    }

    #[test]
    fn test_connectors_skip_zero_length_and_place_arrow() {
        let overlay = build_overlay(&state(true));
        let ids: Vec<&str> = overlay.connectors.iter().map(|c| c.topic_id.as_str()).collect();
        // Topic 2 sits on the global centroid and noise gets no connector
        assert_eq!(ids, vec!["0", "1"]);

        let to_one = overlay.connectors.iter().find(|c| c.topic_id == "1").unwrap();
        assert_eq!(to_one.direction, Vec3::X);
        assert_eq!(to_one.arrow_at, Vec3::new(3.5, 0.0, 0.0));
        assert_eq!(
            overlay.global.unwrap().label.unwrap().keywords.as_deref(),
            Some("data, visual, analysis")
        );
    }

    #[test]
    fn test_noise_topic_has_no_marker_or_connector() {
        let mut state = AppState::default();
        state.set_data(Dataset {
            papers: Vec::new(),
            topics: vec![topic("0", &[], [1.0, 0.0, 0.0]), topic("-1", &[], [0.0, 2.0, 0.0])],
            global: Some(GlobalData {
                position: Vec3::ZERO,
                keywords: Vec::new(),
            }),
        });
        let overlay = build_overlay(&state);
        let markers: Vec<&str> = overlay.markers.iter().map(|m| m.topic_id.as_str()).collect();
        let connectors: Vec<&str> = overlay.connectors.iter().map(|c| c.topic_id.as_str()).collect();
        assert_eq!(markers, vec!["0"]);
        assert_eq!(connectors, vec!["0"]);
    }

    #[test]
    fn test_centroid_labels_use_keywords() {
        let mut state = state(true);
        state.toggle_topic_visibility("1");
        state.set_show_labels(false);
        let overlay = build_centroid_overlay(state.sorted_topics());
        assert!(overlay.global.is_none());
        assert!(overlay.connectors.is_empty());

        let ids: Vec<&str> = overlay.markers.iter().map(|m| m.topic_id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert!(overlay.markers.iter().all(|m| m.radius == CENTROID_RADIUS));

        let one = overlay.markers[1].label.as_ref().unwrap();
        assert_eq!(one.title, "volume");
        assert_eq!(one.keywords.as_deref(), Some("rendering, gpu"));
        let two = overlay.markers[2].label.as_ref().unwrap();
        assert_eq!(two.title, "same");
        assert_eq!(two.keywords, None);
    }

    #[test]
    fn test_centroid_without_keywords_falls_back_to_id() {
        let overlay = build_centroid_overlay([topic("4", &[], [0.0; 3])].iter());
        let label = overlay.markers[0].label.as_ref().unwrap();
        assert_eq!(label.title, "Topic 4");
        assert_eq!(label.keywords, None);
    }

    #[test]
    fn test_centroid_renderer_follows_dataset_only() {
        let mut state = state(true);
        let mut renderer = OverlayRenderer::default();
        assert!(renderer.sync_centroids(&state));
        state.set_show_keywords(false);
        assert!(!renderer.sync_centroids(&state));
        state.set_data(Dataset::default());
        assert!(renderer.sync_centroids(&state));
    }

    #[test]
    fn test_renderer_rebuilds_on_overlay_revision_only() {
        let mut state = state(true);
        let mut renderer = OverlayRenderer::default();
        assert!(renderer.sync(&state));
        assert!(!renderer.sync(&state));
        state.set_search_query("graph");
        assert!(!renderer.sync(&state));
        state.set_show_keywords(false);
        assert!(renderer.sync(&state));
    }

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdefgh", 5), "abcd…");
    }
}
