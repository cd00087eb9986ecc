//! Event loop: window, renderer, camera input and the control panel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use corelib::{
    Vec3,
    camera::OrbitalCamera,
    input::{DragButton, PointerState, apply_drag},
    vec3,
};
use renderer::GpuState;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{config::AppConfig, gui::EguiLayer, panel::ControlPanel};

const FPS_WINDOW: Duration = Duration::from_millis(500);
/// Pixels per scroll line when the platform reports pixel deltas.
const PIXELS_PER_LINE: f32 = 40.0;

/// Frames counted over a sliding window.
struct FpsCounter {
    since: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            since: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) -> f32 {
        self.frames += 1;
        let elapsed = self.since.elapsed();
        if elapsed >= FPS_WINDOW {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.since = Instant::now();
        }
        self.fps
    }
}

/// Everything that exists only while a window does.
struct Viewer {
    window: Arc<Window>,
    gpu: GpuState,
    gui: EguiLayer,
}

struct ViewerApp {
    config: AppConfig,
    viewer: Option<Viewer>,
    camera: OrbitalCamera,
    pointer: PointerState,
    panel: ControlPanel,
    fps: FpsCounter,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(config: AppConfig) -> Result<Self> {
        let camera = OrbitalCamera::new(vec3(0.3, 0.4, 3.0), Vec3::ZERO, Vec3::Y)
            .context("Invalid initial camera")?;
        let mut panel = ControlPanel::new(&config.models_dir, config.load, config.packing);
        panel.show_fps = config.show_fps;
        if let Some(name) = &config.initial_model {
            if !panel.select_by_name(name) {
                log::warn!(
                    "Model '{}' not found in {}",
                    name,
                    config.models_dir.display()
                );
            }
        }
        Ok(Self {
            config,
            viewer: None,
            camera,
            pointer: PointerState::new(),
            panel,
            fps: FpsCounter::new(),
            error: None,
        })
    }

    fn create_viewer(&self, event_loop: &ActiveEventLoop) -> Result<Viewer> {
        let attrs = Window::default_attributes()
            .with_title("glengine")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let gpu = pollster::block_on(GpuState::new(window.clone(), self.config.backends))
            .context("Failed to initialize GPU")?;
        let gui = EguiLayer::new(&window, gpu.device(), gpu.surface_format());
        Ok(Viewer { window, gpu, gui })
    }

    /// Apply a queued reload. Runs between frames.
    fn apply_pending_reload(&mut self) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if let Some(req) = self.panel.take_pending() {
            let result = viewer
                .gpu
                .load_model(&req.path, &req.options, req.packing)
                .map(|()| viewer.gpu.model_stats());
            self.panel.report_load(result);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.apply_pending_reload();
        let fps = self.fps.tick();
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        let panel = &mut self.panel;
        viewer
            .gui
            .run(&viewer.window, |ctx| panel.show(ctx, Some(fps)));

        let size = viewer.gpu.size();
        let gui = &mut viewer.gui;
        let result = viewer
            .gpu
            .render(&self.camera, &self.panel.settings, |device, queue, encoder, view| {
                gui.paint(device, queue, encoder, view, [size.0, size.1])
            });

        match result {
            Ok(()) => {}
            Err(e) if GpuState::is_surface_lost(&e) => {
                log::warn!("Surface lost/outdated: {e:?}. Recreating surface...");
                viewer.gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory. Exiting.");
                event_loop.exit();
            }
            Err(e) => {
                log::warn!("Transient surface error: {e:?}. Skipping frame.");
            }
        }
    }

    fn handle_camera_input(&mut self, event: &WindowEvent, gui_wants_pointer: bool) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => DragButton::Left,
                    MouseButton::Right => DragButton::Right,
                    MouseButton::Middle => DragButton::Middle,
                    _ => return,
                };
                let pressed = *state == ElementState::Pressed;
                // A press that lands on the GUI never starts a camera drag.
                if pressed && gui_wants_pointer {
                    return;
                }
                self.pointer.button(button, pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(drag) = self.pointer.moved(position.x as f32, position.y as f32) {
                    apply_drag(&drag, &mut self.camera);
                }
            }
            WindowEvent::CursorLeft { .. } => self.pointer.reset(),
            WindowEvent::MouseWheel { delta, .. } if !gui_wants_pointer => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.camera.zoom(lines);
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match self.create_viewer(event_loop) {
            Ok(viewer) => {
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
            }
            Err(e) => {
                log::error!("{e:#}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let consumed = viewer.gui.on_window_event(&viewer.window, &event);
        let gui_wants_pointer = consumed || viewer.gui.wants_pointer();

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !consumed => {
                log::info!("Escape pressed. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::info!("Resized: {}x{}", new_size.width, new_size.height);
                viewer.gpu.resize(new_size.width, new_size.height);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed: {scale_factor:.3}");
                let size = viewer.window.inner_size();
                viewer.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            other => self.handle_camera_input(&other, gui_wants_pointer),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // GPU buffers go before the device and window.
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.gpu.release_model();
        }
        self.viewer = None;
    }
}

/// Open the viewer window and run until it is closed.
pub fn run_with_renderer(config: AppConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(config)?;
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
