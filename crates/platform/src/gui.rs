//! egui integration: winit input in, wgpu paint out.

use egui_wgpu::ScreenDescriptor;
use wgpu::{CommandBuffer, CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{event::WindowEvent, window::Window};

pub struct EguiLayer {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    frame: Option<egui::FullOutput>,
}

impl EguiLayer {
    pub fn new(window: &Window, device: &Device, format: TextureFormat) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);
        Self {
            ctx,
            state,
            renderer,
            frame: None,
        }
    }

    /// Feed a window event. Returns true when egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// True while the pointer is over (or dragging) a GUI widget.
    pub fn wants_pointer(&self) -> bool {
        self.ctx.wants_pointer_input() || self.ctx.is_pointer_over_area()
    }

    /// Build the UI for this frame. Output is kept until [`EguiLayer::paint`].
    pub fn run(&mut self, window: &Window, ui: impl FnMut(&egui::Context)) {
        let input = self.state.take_egui_input(window);
        let output = self.ctx.run(input, ui);
        self.state
            .handle_platform_output(window, output.platform_output.clone());
        self.frame = Some(output);
    }

    /// Record the GUI on top of `view`. Returns buffers to submit first.
    pub fn paint(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        view: &TextureView,
        size_in_pixels: [u32; 2],
    ) -> Vec<CommandBuffer> {
        let Some(output) = self.frame.take() else {
            return Vec::new();
        };
        let pixels_per_point = output.pixels_per_point;
        let screen = ScreenDescriptor {
            size_in_pixels,
            pixels_per_point,
        };
        let primitives = self.ctx.tessellate(output.shapes, pixels_per_point);

        for (id, delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let extra = self
            .renderer
            .update_buffers(device, queue, encoder, &primitives, &screen);

        {
            let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("GuiPass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let mut rpass = rpass.forget_lifetime();
            self.renderer.render(&mut rpass, &primitives, &screen);
        }

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
        extra
    }
}
