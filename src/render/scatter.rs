//! Scatter renderer - one instance per paper
//!
//! The instance arena is sized to the paper count when a dataset arrives and
//! is then updated in place by index whenever the filters or the color mode
//! change. Filtered-out papers keep their slot with zero scale and black
//! color, so index `i` is always paper `i`.
//!
//! Painting projects every visible instance and emits all of them as a single
//! `egui::Mesh`.

use egui::epaint::{Mesh, Vertex, WHITE_UV};
use egui::{Color32, Painter, Pos2, Rect, Shape, Stroke};
use glam::Vec3;
use tracing::debug;

use super::camera::OrbitCamera;
use crate::color::{paper_color, topic_color, ColorDomains};
use crate::model::Paper;
use crate::state::{AppState, Revisions};

/// Per-paper transform and color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    pub position: Vec3,
    pub scale: f32,
    pub color: Color32,
}

impl Instance {
    const HIDDEN: Instance = Instance {
        position: Vec3::ZERO,
        scale: 0.0,
        color: Color32::BLACK,
    };

    pub fn is_visible(&self) -> bool {
        self.scale > 0.0
    }
}

/// Appearance knobs, from the `points` config section
#[derive(Debug, Clone, Copy)]
pub struct PointStyle {
    /// Sphere radius in world units
    pub radius: f32,
    /// Never draw a point smaller than this
    pub min_pixel_radius: f32,
    /// Extra slack around a point for hover/click
    pub pick_tolerance: f32,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            radius: 0.02,
            min_pixel_radius: 1.0,
            pick_tolerance: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SyncKey {
    dataset: u64,
    filters: u64,
    color: u64,
}

impl From<Revisions> for SyncKey {
    fn from(r: Revisions) -> Self {
        Self {
            dataset: r.dataset,
            filters: r.filters,
            color: r.color,
        }
    }
}

/// Unit circle used for every dot
const DOT_SEGMENTS: usize = 8;

pub struct ScatterRenderer {
    instances: Vec<Instance>,
    domains: ColorDomains,
    visible_count: usize,
    style: PointStyle,
    synced: Option<SyncKey>,
    dot: [(f32, f32); DOT_SEGMENTS],
}

impl ScatterRenderer {
    pub fn new(style: PointStyle) -> Self {
        let mut dot = [(0.0, 0.0); DOT_SEGMENTS];
        for (k, d) in dot.iter_mut().enumerate() {
            let a = k as f32 / DOT_SEGMENTS as f32 * std::f32::consts::TAU;
            *d = (a.cos(), a.sin());
        }
        Self {
            instances: Vec::new(),
            domains: ColorDomains::default(),
            visible_count: 0,
            style,
            synced: None,
            dot,
        }
    }

    #[cfg(test)]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    #[cfg(test)]
    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.instances.get(index).is_some_and(Instance::is_visible)
    }

    /// Scale domains of the current dataset
    pub fn domains(&self) -> &ColorDomains {
        &self.domains
    }

    /// Bring the arena in line with the explorer state; returns true if
    /// anything changed
    pub fn sync(&mut self, state: &AppState) -> bool {
        let key = SyncKey::from(state.revisions());
        let filter = state.filter_state();
        let mode = state.color_mode();
        self.sync_with(key, state.papers(), |paper, domains| {
            filter.is_visible(paper).then(|| paper_color(paper, mode, domains))
        })
    }

    /// Every paper outside the noise cluster in its topic color, ignoring
    /// filters and the color mode
    pub fn sync_topics(&mut self, state: &AppState) -> bool {
        let key = SyncKey {
            dataset: state.revisions().dataset,
            filters: 0,
            color: 0,
        };
        self.sync_with(key, state.papers(), |paper, _| {
            (!paper.is_noise()).then(|| topic_color(&paper.cluster))
        })
    }

    /// `color_of` returns `None` for papers that should not be drawn
    fn sync_with<F>(&mut self, key: SyncKey, papers: &[Paper], color_of: F) -> bool
    where
        F: Fn(&Paper, &ColorDomains) -> Option<Color32>,
    {
        if self.synced == Some(key) {
            return false;
        }

        if self.synced.map(|k| k.dataset) != Some(key.dataset) {
            self.domains = ColorDomains::from_papers(papers);
            self.instances.clear();
            self.instances.resize(papers.len(), Instance::HIDDEN);
            debug!("Instance arena sized to {} papers, domains {:?}", papers.len(), self.domains);
        }

        let mut visible_count = 0;
        for (instance, paper) in self.instances.iter_mut().zip(papers) {
            instance.position = paper.position();
            match color_of(paper, &self.domains) {
                Some(color) => {
                    instance.scale = 1.0;
                    instance.color = color;
                    visible_count += 1;
                }
                None => {
                    instance.scale = 0.0;
                    instance.color = Color32::BLACK;
                }
            }
        }
        self.visible_count = visible_count;
        self.synced = Some(key);
        debug!("Instances updated: {} of {} visible", visible_count, self.instances.len());
        true
    }

    fn pixel_radius(&self, scale: f32, pixels_per_unit: f32) -> f32 {
        (self.style.radius * scale * pixels_per_unit).max(self.style.min_pixel_radius)
    }

    /// Paint every visible instance, far to near, as one mesh
    pub fn paint(&self, painter: &Painter, camera: &OrbitCamera, rect: Rect) {
        if self.visible_count == 0 {
            return;
        }
        let project = camera.projector(rect);

        let mut dots: Vec<(f32, Pos2, f32, Color32)> = Vec::with_capacity(self.visible_count);
        for instance in self.instances.iter().filter(|i| i.is_visible()) {
            if let Some(p) = project(instance.position) {
                if rect.expand(8.0).contains(p.pos) {
                    let r = self.pixel_radius(instance.scale, p.pixels_per_unit);
                    dots.push((p.depth, p.pos, r, instance.color));
                }
            }
        }
        dots.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut mesh = Mesh::default();
        mesh.reserve_vertices(dots.len() * (DOT_SEGMENTS + 1));
        mesh.reserve_triangles(dots.len() * DOT_SEGMENTS);
        for (_, pos, r, color) in dots {
            self.mesh_add_dot(&mut mesh, pos, r, color);
        }
        painter.add(Shape::mesh(mesh));
    }

    fn mesh_add_dot(&self, mesh: &mut Mesh, p: Pos2, r: f32, color: Color32) {
        let base = mesh.vertices.len() as u32;
        mesh.vertices.push(Vertex { pos: p, uv: WHITE_UV, color });
        for &(cx, cy) in &self.dot {
            mesh.vertices.push(Vertex {
                pos: Pos2::new(p.x + cx * r, p.y + cy * r),
                uv: WHITE_UV,
                color,
            });
        }
        let n = DOT_SEGMENTS as u32;
        for k in 0..n {
            mesh.add_triangle(base, base + 1 + k, base + 1 + (k + 1) % n);
        }
    }

    /// Ring around one instance, if it is visible and on screen
    pub fn paint_highlight(
        &self,
        painter: &Painter,
        camera: &OrbitCamera,
        rect: Rect,
        index: usize,
        stroke: Stroke,
    ) {
        if !self.is_visible(index) {
            return;
        }
        let instance = &self.instances[index];
        if let Some(p) = camera.project(instance.position, rect) {
            let r = self.pixel_radius(instance.scale, p.pixels_per_unit) + 3.0;
            painter.circle_stroke(p.pos, r, stroke);
        }
    }

    /// Visible instance under `pointer`
    ///
    /// Closest to the camera wins; equal depth goes to the lower index.
    pub fn pick(&self, camera: &OrbitCamera, rect: Rect, pointer: Pos2) -> Option<usize> {
        let project = camera.projector(rect);
        let mut best: Option<(f32, usize)> = None;
        for (index, instance) in self.instances.iter().enumerate() {
            if !self.is_visible(index) {
                continue;
            }
            let Some(p) = project(instance.position) else {
                continue;
            };
            let reach = self.pixel_radius(instance.scale, p.pixels_per_unit) + self.style.pick_tolerance;
            if p.pos.distance(pointer) > reach {
                continue;
            }
            match best {
                Some((depth, _)) if depth <= p.depth => {}
                _ => best = Some((p.depth, index)),
            }
        }
        best.map(|(_, index)| index)
    }
}
