// egui host: owns the egui context, winit integration and wgpu renderer.
// What gets drawn is decided by the closure passed to `render`.

use egui::epaint::Shadow;
use egui::{Color32, Stroke};
use winit::window::Window;

pub struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// Dark, warm, semi-transparent panels with monospace white text.
fn apply_theme(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.window_fill = Color32::from_rgba_premultiplied(20, 16, 12, 230);
    visuals.window_stroke = Stroke::new(2.0, Color32::from_rgb(120, 90, 60));
    visuals.window_shadow = Shadow::NONE;
    visuals.popup_shadow = Shadow::NONE;
    visuals.override_text_color = Some(Color32::WHITE);
    ctx.set_visuals(visuals);

    ctx.style_mut(|style| {
        style.override_font_id = Some(egui::FontId::monospace(14.0));
        style.spacing.button_padding = egui::vec2(10.0, 6.0);
    });
}

impl Overlay {
    pub fn new(window: &Window, device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let ctx = egui::Context::default();
        apply_theme(&ctx);

        let viewport = egui::ViewportId::ROOT;
        let scale = Some(window.scale_factor() as f32);
        let state = egui_winit::State::new(ctx.clone(), viewport, window, scale, None, None);

        // Composited after the scene pass: no depth, no msaa, no dithering.
        let renderer = egui_wgpu::Renderer::new(device, target_format, None, 1, false);

        Self { ctx, state, renderer }
    }

    /// Forward a window event. `consumed` is set when a widget used it.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.state.on_window_event(window, event)
    }

    /// Whether the pointer is over an egui area or a widget is being dragged.
    pub fn wants_pointer(&self) -> bool {
        self.ctx.wants_pointer_input() || self.ctx.is_pointer_over_area()
    }

    /// Run one egui frame and composite it over `target`.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        target: &wgpu::TextureView,
        size_in_pixels: [u32; 2],
        build_ui: impl FnMut(&egui::Context),
    ) {
        let input = self.state.take_egui_input(window);
        let egui::FullOutput {
            platform_output,
            textures_delta,
            shapes,
            pixels_per_point,
            ..
        } = self.ctx.run(input, build_ui);
        self.state.handle_platform_output(window, platform_output);

        let screen = egui_wgpu::ScreenDescriptor { size_in_pixels, pixels_per_point };
        let primitives = self.ctx.tessellate(shapes, pixels_per_point);

        for (id, delta) in &textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.renderer.update_buffers(device, queue, encoder, &primitives, &screen);

        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ui"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                })],
                ..Default::default()
            })
            .forget_lifetime();
        self.renderer.render(&mut pass, &primitives, &screen);
        drop(pass);

        for id in &textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
