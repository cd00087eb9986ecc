//! Runtime configuration handed from `app` to the event loop.

use std::path::PathBuf;

use asset::{LoadOptions, VertexPacking};
use wgpu::Backends;

pub const DEFAULT_MODELS_DIR: &str = "resources/object";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub backends: Backends,
    pub show_fps: bool,
    pub width: u32,
    pub height: u32,
    /// Directory scanned for `.obj` files.
    pub models_dir: PathBuf,
    /// File name inside `models_dir` to load at startup.
    pub initial_model: Option<String>,
    pub load: LoadOptions,
    pub packing: VertexPacking,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backends: Backends::all(),
            show_fps: false,
            width: 1280,
            height: 720,
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            initial_model: None,
            load: LoadOptions::default(),
            packing: VertexPacking::default(),
        }
    }
}
