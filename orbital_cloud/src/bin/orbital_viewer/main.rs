//! Orbital cloud viewer
//!
//! Usage: `orbital_viewer [DATA_FILE]`. Without a file a dialog asks for one.
//!
//! Controls:
//! - Arrow keys: Rotate view
//! - Scroll: Zoom
//! - R: Redraw
//! - Escape: Stop the current draw

mod panel;
mod renderer;

use std::path::{Path, PathBuf};

use common::{Camera3D, GraphicsContext};
use orbital_cloud::{CloudConfig, CloudError, Session};
use panel::{draw_control_panel, PanelAction, PanelState};
use renderer::PointRenderer;
use winit::{
    event::{ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
};

struct EguiState {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct App {
    ctx: GraphicsContext,
    renderer: PointRenderer,
    session: Session,
    camera: Camera3D,
    panel: PanelState,
    egui: EguiState,
}

impl App {
    fn new(ctx: GraphicsContext, session: Session) -> Self {
        let renderer = PointRenderer::new(&ctx, session.point_count());
        let camera = Camera3D::new(ctx.aspect_ratio());

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &ctx.window,
            Some(ctx.window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1);

        let panel = PanelState {
            point_count: session.point_count(),
            message: None,
        };

        let mut app = Self {
            ctx,
            renderer,
            session,
            camera,
            panel,
            egui: EguiState {
                ctx: egui_ctx,
                state: egui_state,
                renderer: egui_renderer,
            },
        };
        app.frame_dataset();
        app
    }

    /// Point the camera and window at the current dataset.
    fn frame_dataset(&mut self) {
        let radius = self.session.dataset().state().r_max() as f32;
        let viewer = &self.session.config().viewer;
        self.camera.frame(radius, viewer.magnification);
        self.renderer
            .set_point_size(&self.ctx.queue, radius * viewer.point_scale);
        self.ctx.window.set_title(&self.session.title());
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.update_aspect_ratio(self.ctx.aspect_ratio());
    }

    fn update(&mut self) {
        if let Err(e) = self.session.poll() {
            log::error!("sampling failed: {e}");
            self.panel.message = Some(e.to_string());
        }
    }

    fn apply(&mut self, action: PanelAction) {
        let result = match action {
            PanelAction::Redraw => self.session.redraw(),
            PanelAction::Stop => self.session.stop(),
            PanelAction::SelectOrbital(index) => self.session.select_orbital(index),
            PanelAction::SetComponent(component) => self.session.set_component(component),
            PanelAction::SetPointCount(count) => self.session.set_point_count(count),
            PanelAction::Load => {
                if prompt_load(&mut self.session) {
                    self.panel.point_count = self.session.point_count();
                    self.frame_dataset();
                }
                Ok(())
            }
        };
        match result {
            Ok(()) => self.panel.message = None,
            Err(e) => {
                log::error!("{e}");
                self.panel.message = Some(e.to_string());
            }
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.update_camera(&self.ctx.queue, &self.camera);
        if let Some(cloud) = self.session.ready() {
            self.renderer.upload(&self.ctx.device, &self.ctx.queue, &cloud);
        }

        let raw_input = self.egui.state.take_egui_input(&self.ctx.window);
        let mut actions = Vec::new();
        let full_output = self.egui.ctx.run(raw_input, |ctx| {
            actions = draw_control_panel(ctx, &self.session, &mut self.panel);
        });

        self.egui.state.handle_platform_output(&self.ctx.window, full_output.platform_output);
        let tris = self.egui.ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui.renderer.update_texture(&self.ctx.device, &self.ctx.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.ctx.size.width, self.ctx.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer.render(&mut encoder, &view);

        self.egui.renderer.update_buffers(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui.renderer.render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for action in actions {
            self.apply(action);
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }

        match key {
            KeyCode::KeyR => self.apply(PanelAction::Redraw),
            KeyCode::Escape => self.apply(PanelAction::Stop),
            KeyCode::ArrowLeft => self.camera.orbit(-0.1, 0.0),
            KeyCode::ArrowRight => self.camera.orbit(0.1, 0.0),
            KeyCode::ArrowUp => self.camera.orbit(0.0, 0.1),
            KeyCode::ArrowDown => self.camera.orbit(0.0, -0.1),
            _ => {}
        }
    }

    fn handle_scroll(&mut self, delta: f32) {
        self.camera.zoom(0.9f32.powf(delta));
    }

    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui.state.on_window_event(&self.ctx.window, event).consumed
    }
}

fn show_error(title: &str, error: &CloudError) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(title)
        .set_description(error.to_string())
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

fn pick_data_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open radial data file")
        .add_filter("Radial data", &["csv", "dat", "txt"])
        .add_filter("All files", &["*"])
        .pick_file()
}

/// Ask for files until one loads or the dialog is cancelled.
fn prompt_open(config: &CloudConfig, first: Option<PathBuf>) -> Option<Session> {
    let mut candidate = first;
    loop {
        let path = match candidate.take() {
            Some(path) => path,
            None => pick_data_file()?,
        };
        match Session::open(&path, config.clone()) {
            Ok(session) => return Some(session),
            Err(e) => {
                log::error!("cannot open {}: {e}", path.display());
                show_error("Cannot open data file", &e);
            }
        }
    }
}

/// Replace the session's dataset. Returns whether anything changed. An
/// unsupported orbital ends the prompt and keeps the current cloud.
fn prompt_load(session: &mut Session) -> bool {
    loop {
        let Some(path) = pick_data_file() else {
            return false;
        };
        match session.load(&path) {
            Ok(()) => return true,
            Err(e @ CloudError::UnsupportedOrbital { .. }) => {
                show_error("Unsupported orbital", &e);
                return false;
            }
            Err(e) => {
                log::error!("cannot load {}: {e}", path.display());
                show_error("Cannot open data file", &e);
            }
        }
    }
}

fn run(data_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = CloudConfig::default();
    let (ctx, event_loop) = pollster::block_on(GraphicsContext::new(
        "Orbital Cloud",
        defaults.viewer.width,
        defaults.viewer.height,
    ))?;

    let config = CloudConfig::load_or_default()?;
    if config.viewer != defaults.viewer {
        let _ = ctx.window.request_inner_size(winit::dpi::PhysicalSize::new(
            config.viewer.width,
            config.viewer.height,
        ));
    }

    let Some(session) = prompt_open(&config, data_file.map(Path::to_path_buf)) else {
        log::info!("no data file chosen, exiting");
        return Ok(());
    };

    let mut app = App::new(ctx, session);

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { ref event, .. } => {
                let consumed = app.handle_window_event(event);

                if !consumed {
                    match event {
                        WindowEvent::CloseRequested => {
                            app.session.shutdown();
                            elwt.exit();
                        }
                        WindowEvent::Resized(size) => app.resize(*size),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    physical_key: PhysicalKey::Code(key),
                                    state,
                                    ..
                                },
                            ..
                        } => app.handle_key(*key, *state),
                        WindowEvent::MouseWheel { delta, .. } => {
                            let scroll = match delta {
                                MouseScrollDelta::LineDelta(_, y) => *y,
                                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                            };
                            app.handle_scroll(scroll);
                        }
                        WindowEvent::RedrawRequested => {
                            app.update();
                            match app.render() {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost) => app.resize(app.ctx.size),
                                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                                Err(e) => log::warn!("render error: {e:?}"),
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                app.ctx.window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn main() {
    let data_file = std::env::args_os().nth(1).map(PathBuf::from);
    if let Err(e) = run(data_file.as_deref()) {
        log::error!("{e}");
        eprintln!("orbital_viewer: {e}");
        std::process::exit(1);
    }
}
