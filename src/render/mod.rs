//! 3D explorer rendering on top of the egui painter

pub mod camera;
pub mod overlay;
pub mod preview;
pub mod scatter;
pub mod scene;
pub mod stars;

pub use scene::Scene;
