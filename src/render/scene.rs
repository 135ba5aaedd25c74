//! Scene composer
//!
//! Owns the camera and both renderers, paints background, stars, points and
//! overlay into one viewport and turns pointer input into camera motion,
//! hover and selection.

use egui::{Color32, CursorIcon, PointerButton, Pos2, Rect, Sense, Stroke, Ui};
use glam::Vec3;
use tracing::debug;

use super::camera::OrbitCamera;
use super::overlay::OverlayRenderer;
use super::scatter::{PointStyle, ScatterRenderer};
use super::stars::Starfield;
use crate::config::Config;
use crate::state::AppState;

/// Ambient term plus one point light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub light_position: Vec3,
    pub intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.5,
            light_position: Vec3::splat(10.0),
            intensity: 1.0,
        }
    }
}

impl Lighting {
    /// Lambert shading of `color` at a surface point with unit `normal`
    pub fn shade(&self, color: Color32, position: Vec3, normal: Vec3) -> Color32 {
        let diffuse = (self.light_position - position)
            .try_normalize()
            .map_or(0.0, |l| normal.dot(l).max(0.0));
        let k = (self.ambient + self.intensity * diffuse).clamp(0.0, 1.0);
        let [r, g, b, a] = color.to_array();
        let f = |c: u8| (c as f32 * k).round() as u8;
        Color32::from_rgba_premultiplied(f(r), f(g), f(b), a)
    }

    /// Color of the specular spot on top of a shaded surface
    pub fn specular(color: Color32) -> Color32 {
        let [r, g, b, a] = color.to_array();
        let f = |c: u8| (c as f32 + (255.0 - c as f32) * 0.35).round() as u8;
        Color32::from_rgba_premultiplied(f(r), f(g), f(b), a)
    }
}

pub struct Scene {
    camera: OrbitCamera,
    scatter: ScatterRenderer,
    overlay: OverlayRenderer,
    lighting: Lighting,
    stars: Starfield,
    background: Color32,
    synced_dataset: Option<u64>,
}

impl Scene {
    pub fn new(config: &Config) -> Self {
        let cam = &config.camera;
        let scene = &config.scene;
        let points = &config.points;
        let [r, g, b] = scene.background;
        Self {
            camera: OrbitCamera::looking_at(Vec3::from_array(cam.eye), Vec3::ZERO, cam.fov)
                .with_damping(cam.damping)
                .with_distance_limits(cam.min_distance, cam.max_distance)
                .with_auto_rotate(cam.auto_rotate, cam.auto_rotate_speed),
            scatter: ScatterRenderer::new(PointStyle {
                radius: points.radius,
                min_pixel_radius: points.min_pixel_radius,
                pick_tolerance: points.pick_tolerance,
            }),
            overlay: OverlayRenderer::default(),
            lighting: Lighting {
                ambient: scene.ambient,
                light_position: Vec3::from_array(scene.light_position),
                intensity: scene.light_intensity,
            },
            stars: Starfield::new(scene.star_count, scene.star_radius, scene.star_depth),
            background: Color32::from_rgb(r, g, b),
            synced_dataset: None,
        }
    }

    #[cfg(test)]
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn scatter(&self) -> &ScatterRenderer {
        &self.scatter
    }

    /// Re-derive everything that depends on changed state revisions
    pub fn sync(&mut self, state: &AppState) {
        let dataset = state.revisions().dataset;
        if self.synced_dataset != Some(dataset) {
            let target = state.global().map_or(Vec3::ZERO, |g| g.position);
            debug!("Camera target set to {:?}", target);
            self.camera.set_target(target);
            self.synced_dataset = Some(dataset);
        }
        self.scatter.sync(state);
        self.overlay.sync(state);
    }

    /// Fill the remaining space of `ui` with the 3D view
    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;

        if response.dragged_by(PointerButton::Primary) {
            self.camera.orbit(response.drag_delta());
        } else if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.camera.pan(response.drag_delta(), rect);
        }
        self.camera.set_interacting(response.is_pointer_button_down_on());

        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.camera.zoom(scroll);
            }
        }

        let dt = ui.input(|i| i.stable_dt).min(0.1);
        let moving = self.camera.update(dt);

        self.sync(state);

        painter.rect_filled(rect, 0.0, self.background);
        self.stars.paint(&painter, &self.camera, rect);
        self.scatter.paint(&painter, &self.camera, rect);
        self.overlay.paint(&painter, &self.camera, rect, &self.lighting);

        let hovered = if response.dragged() {
            None
        } else {
            response.hover_pos().and_then(|p| self.pick(rect, p))
        };
        state.set_hovered(hovered);

        if response.clicked() {
            if let Some(index) = hovered {
                state.select(Some(index));
            }
        }

        if let Some(index) = state.selected_index() {
            self.scatter.paint_highlight(&painter, &self.camera, rect, index, Stroke::new(2.0, Color32::WHITE));
        }
        if let Some(paper) = state.hovered_paper() {
            if let Some(index) = state.hovered_index() {
                self.scatter.paint_highlight(
                    &painter,
                    &self.camera,
                    rect,
                    index,
                    Stroke::new(1.5, Color32::from_white_alpha(160)),
                );
            }
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
            response.on_hover_text_at_pointer(paper.title.as_str());
        }

        if moving {
            ui.ctx().request_repaint();
        }
    }

    /// Paper index under the pointer
    pub fn pick(&self, rect: Rect, pointer: Pos2) -> Option<usize> {
        self.scatter.pick(&self.camera, rect, pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{paper, topic};
    use crate::model::{Dataset, GlobalData};

    #[test]
    fn test_lighting_facing_light_is_full_bright() {
        let lighting = Lighting::default();
        let color = Color32::from_rgb(200, 100, 50);
        let normal = Vec3::ONE.normalize();
        assert_eq!(lighting.shade(color, Vec3::ZERO, normal), color);
    }

    #[test]
    fn test_lighting_back_side_gets_ambient_only() {
        let lighting = Lighting::default();
        let color = Color32::from_rgb(200, 100, 50);
        let normal = Vec3::NEG_ONE.normalize();
        assert_eq!(
            lighting.shade(color, Vec3::ZERO, normal),
            Color32::from_rgb(100, 50, 25)
        );
    }

    #[test]
    fn test_camera_targets_global_on_each_load() {
        let mut scene = Scene::new(&Config::default());
        let mut state = AppState::default();
        state.set_data(Dataset {
            papers: vec![paper("a", "0", "X", "t")],
            topics: vec![topic("0", &[], [1.0, 0.0, 0.0])],
            global: Some(GlobalData {
                position: Vec3::new(2.0, 3.0, 4.0),
                keywords: Vec::new(),
            }),
        });
        scene.sync(&state);
        assert_eq!(scene.camera().target(), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(scene.scatter().instances().len(), 1);

        state.set_data(Dataset {
            papers: Vec::new(),
            topics: Vec::new(),
            global: None,
        });
        scene.sync(&state);
        assert_eq!(scene.camera().target(), Vec3::ZERO);
        assert!(scene.scatter().instances().is_empty());
    }
}
