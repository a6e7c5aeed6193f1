//! Shared window, GPU and camera setup for the viewer binaries.

pub mod graphics;
pub mod camera;

pub use graphics::*;
pub use camera::*;
