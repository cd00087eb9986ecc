//! Core shared types: math re-exports, orbital camera, pointer input, errors.

pub use glam::{Mat4, Quat, Vec2, Vec3, vec3};

use thiserror::Error;

pub mod camera;
pub mod input;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Degenerate camera: {0}")]
    DegenerateCamera(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
