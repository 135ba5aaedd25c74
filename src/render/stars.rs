//! Fixed background stars

use egui::epaint::Mesh;
use egui::{Color32, Painter, Rect, Shape, Vec2};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

use super::camera::OrbitCamera;

const STAR_SEED: u64 = 5000;

pub struct Starfield {
    stars: Vec<(Vec3, Color32)>,
    radius: f32,
}

impl Starfield {
    /// Seeded shell of stars between `radius` and `radius + depth`
    pub fn new(count: usize, radius: f32, depth: f32) -> Self {
        let mut rng = StdRng::seed_from_u64(STAR_SEED);
        let stars = (0..count)
            .map(|_| {
                let r = radius + depth * rng.gen::<f32>();
                let theta = rng.gen::<f32>() * TAU;
                let cos_phi = rng.gen::<f32>() * 2.0 - 1.0;
                let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
                let position = Vec3::new(
                    r * sin_phi * theta.cos(),
                    r * cos_phi,
                    r * sin_phi * theta.sin(),
                );
                (position, Color32::from_gray(rng.gen_range(120..=255)))
            })
            .collect();
        Self { stars, radius }
    }

    pub fn paint(&self, painter: &Painter, camera: &OrbitCamera, rect: Rect) {
        let project = camera.projector(rect);
        let near = self.radius * 1.1;
        let mut mesh = Mesh::default();
        for &(position, color) in &self.stars {
            if let Some(p) = project(position) {
                if rect.contains(p.pos) {
                    let size = if p.depth < near { 1.5 } else { 1.0 };
                    mesh.add_colored_rect(Rect::from_center_size(p.pos, Vec2::splat(size)), color);
                }
            }
        }
        painter.add(Shape::mesh(mesh));
    }
}
