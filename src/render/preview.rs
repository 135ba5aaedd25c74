//! Small embedded 3D views for the analysis page
//!
//! Both previews read the explorer's dataset but none of its filters: the
//! topic preview draws every non-noise paper in its topic color, the
//! centroid preview draws one labelled marker per topic.

use egui::{Align2, Color32, FontId, PointerButton, Sense, Stroke, Ui, Vec2};
use glam::Vec3;

use super::camera::OrbitCamera;
use super::overlay::OverlayRenderer;
use super::scatter::{PointStyle, ScatterRenderer};
use super::scene::Lighting;
use super::stars::Starfield;
use crate::state::AppState;

const EYE: Vec3 = Vec3::new(0.0, 0.0, 12.0);
const FOV: f32 = 45.0;
const AUTO_ROTATE_SPEED: f32 = 0.5;
const STAR_COUNT: usize = 2000;
const STAR_RADIUS: f32 = 50.0;
const STAR_DEPTH: f32 = 50.0;
const POINT_RADIUS: f32 = 0.03;
const BACKGROUND: Color32 = Color32::from_rgb(0x05, 0x05, 0x05);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreviewContent {
    /// Papers colored by topic
    Topics,
    /// Topic centroids with keyword labels
    Centroids,
}

pub struct Preview {
    content: PreviewContent,
    badge: &'static str,
    /// Zoom and pan on top of orbiting
    navigable: bool,
    camera: OrbitCamera,
    stars: Starfield,
    scatter: ScatterRenderer,
    overlay: OverlayRenderer,
    lighting: Lighting,
    synced_dataset: Option<u64>,
}

impl Preview {
    pub fn topics() -> Self {
        Self::new(PreviewContent::Topics, "Interactive 3D Preview", false)
    }

    pub fn centroids() -> Self {
        Self::new(PreviewContent::Centroids, "Topic Centroids & Keywords", true)
    }

    fn new(content: PreviewContent, badge: &'static str, navigable: bool) -> Self {
        Self {
            content,
            badge,
            navigable,
            camera: OrbitCamera::looking_at(EYE, Vec3::ZERO, FOV)
                .with_distance_limits(1.0, STAR_RADIUS)
                .with_auto_rotate(true, AUTO_ROTATE_SPEED),
            stars: Starfield::new(STAR_COUNT, STAR_RADIUS, STAR_DEPTH),
            scatter: ScatterRenderer::new(PointStyle {
                radius: POINT_RADIUS,
                ..PointStyle::default()
            }),
            overlay: OverlayRenderer::default(),
            lighting: Lighting::default(),
            synced_dataset: None,
        }
    }

    /// Refresh from the dataset; returns true if anything was rebuilt
    pub fn sync(&mut self, state: &AppState) -> bool {
        let dataset = state.revisions().dataset;
        let retarget = self.synced_dataset != Some(dataset);
        if retarget {
            self.camera
                .set_target(state.global().map_or(Vec3::ZERO, |g| g.position));
            self.synced_dataset = Some(dataset);
        }
        let rebuilt = match self.content {
            PreviewContent::Topics => self.scatter.sync_topics(state),
            PreviewContent::Centroids => self.overlay.sync_centroids(state),
        };
        retarget || rebuilt
    }

    pub fn show(&mut self, ui: &mut Ui, state: &AppState, height: f32) {
        let size = Vec2::new(ui.available_width(), height);
        let (response, painter) = ui.allocate_painter(size, Sense::drag());
        let rect = response.rect;

        if response.dragged_by(PointerButton::Primary) {
            self.camera.orbit(response.drag_delta());
        } else if self.navigable
            && (response.dragged_by(PointerButton::Secondary)
                || response.dragged_by(PointerButton::Middle))
        {
            self.camera.pan(response.drag_delta(), rect);
        }
        if self.navigable && response.hovered() {
            // Plain scrolling belongs to the page; pinch or ctrl+scroll zooms
            let zoom = ui.input(|i| i.zoom_delta());
            if zoom != 1.0 {
                self.camera.zoom_by(zoom);
            }
        }
        self.camera.set_interacting(response.is_pointer_button_down_on());
        let dt = ui.input(|i| i.stable_dt).min(0.1);
        let moving = self.camera.update(dt);

        self.sync(state);

        painter.rect_filled(rect, 12.0, BACKGROUND);
        self.stars.paint(&painter, &self.camera, rect);
        match self.content {
            PreviewContent::Topics => self.scatter.paint(&painter, &self.camera, rect),
            PreviewContent::Centroids => {
                self.overlay.paint(&painter, &self.camera, rect, &self.lighting)
            }
        }

        let badge_pos = rect.left_top() + Vec2::new(16.0, 16.0);
        let galley = painter.layout_no_wrap(
            self.badge.to_string(),
            FontId::proportional(11.0),
            Color32::LIGHT_GRAY,
        );
        let badge = Align2::LEFT_TOP
            .anchor_size(badge_pos, galley.size() + Vec2::new(16.0, 6.0));
        painter.rect(
            badge,
            badge.height() * 0.5,
            Color32::from_black_alpha(128),
            Stroke::new(1.0, Color32::from_white_alpha(26)),
        );
        painter.galley(badge.min + Vec2::new(8.0, 3.0), galley, Color32::LIGHT_GRAY);

        if moving {
            ui.ctx().request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{paper, topic};
    use crate::model::{Dataset, GlobalData};

    fn state() -> AppState {
        let mut state = AppState::default();
        state.set_data(Dataset {
            papers: vec![paper("a", "0", "X", "Graph Drawing"), paper("n", "-1", "X", "Noise")],
            topics: vec![topic("0", &["graph"], [1.0, 0.0, 0.0])],
            global: Some(GlobalData {
                position: Vec3::new(1.0, 2.0, 3.0),
                keywords: Vec::new(),
            }),
        });
        state
    }

    #[test]
    fn test_preview_targets_global_and_syncs_once() {
        let state = state();
        let mut preview = Preview::topics();
        assert!(preview.sync(&state));
        assert_eq!(preview.camera.target(), Vec3::new(1.0, 2.0, 3.0));
        assert!(preview.scatter.is_visible(0));
        assert!(!preview.scatter.is_visible(1));
        assert!(!preview.sync(&state));
    }

    #[test]
    fn test_preview_ignores_explorer_filters() {
        let mut state = state();
        let mut preview = Preview::topics();
        preview.sync(&state);
        state.set_filter_journal(Some("nothing".to_string()));
        state.toggle_topic_visibility("0");
        assert!(!preview.sync(&state));
        assert!(preview.scatter.is_visible(0));
    }

    #[test]
    fn test_centroid_preview_rebuilds_on_new_dataset() {
        let mut state = state();
        let mut preview = Preview::centroids();
        assert_eq!(preview.content, PreviewContent::Centroids);
        assert!(preview.sync(&state));
        state.set_show_labels(false);
        assert!(!preview.sync(&state));
        state.set_data(Dataset::default());
        assert!(preview.sync(&state));
        assert_eq!(preview.camera.target(), Vec3::ZERO);
    }
}
