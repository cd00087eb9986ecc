//! Platform layer: window, event loop, GUI and camera input.

mod app;
pub mod config;
mod gui;
pub mod panel;

pub use app::run_with_renderer;
pub use asset::{AssemblyMode, LoadOptions, NgonPolicy, VertexPacking};
pub use config::{AppConfig, DEFAULT_MODELS_DIR};
pub use wgpu::Backends;
