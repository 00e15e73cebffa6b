use anyhow::Result;
use egui::{self, FontId};
use egui_wgpu::winit::Painter;
use egui_wgpu::{RenderState, RendererOptions, WgpuConfiguration, WgpuSetup, WgpuSetupCreateNew};
use egui_winit::State as EguiWinitState;
use folio_base::{FolioConfig, Portfolio, PortfolioItem};
use folio_view::{
    ClickTarget, FrameLoop, LOAD_ERROR_COLOR, LoadState, ModalController, SceneRenderer, Viewer,
    ViewerInput,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};

const VIEWER_PANEL_WIDTH: f32 = 480.0;
const CARD_WIDTH: f32 = 260.0;
const OVERLAY_ALPHA: u8 = 170;

pub struct GuiOptions {
    pub config: FolioConfig,
    pub portfolio: Portfolio,
    pub max_frames: Option<u64>,
}

pub fn run_gui(options: GuiOptions) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow::anyhow!(err.to_string()))?;
    let window = event_loop
        .create_window(
            winit::window::Window::default_attributes()
                .with_title("Folio")
                .with_min_inner_size(LogicalSize::new(960.0, 600.0)),
        )
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    let window = Arc::new(window);

    let egui_ctx = egui::Context::default();
    let mut painter = create_painter(egui_ctx.clone())?;
    pollster::block_on(painter.set_window(egui::ViewportId::ROOT, Some(window.clone())))
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    let render_state = painter
        .render_state()
        .ok_or_else(|| anyhow::anyhow!("wgpu render state not initialized"))?;

    let mut egui_state = EguiWinitState::new(
        egui_ctx.clone(),
        egui::ViewportId::ROOT,
        &event_loop,
        Some(window.scale_factor() as f32),
        window.theme(),
        painter.max_texture_side(),
    );

    let mut frame_loop = FrameLoop::new(options.max_frames);
    let stop = frame_loop.stop_handle();
    let mut app = FolioApp::new(
        options.config,
        options.portfolio,
        &render_state,
        window.scale_factor() as f32,
    );

    let clear_color = egui_ctx.style().visuals.window_fill;
    let [r, g, b, a] = clear_color.to_array();
    let clear_color = [
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ];

    #[allow(deprecated)]
    event_loop
        .run(move |event, event_loop| {
            event_loop.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent { event, window_id } if window_id == window.id() => {
                    if matches!(event, WindowEvent::CloseRequested) {
                        stop.stop();
                        info!(frames = frame_loop.frames(), "window closed");
                        event_loop.exit();
                        return;
                    }

                    let response = egui_state.on_window_event(&window, &event);
                    if response.repaint {
                        window.request_redraw();
                    }

                    match event {
                        WindowEvent::Resized(size) => {
                            resize_surface(&mut painter, size);
                        }
                        WindowEvent::ScaleFactorChanged { .. } => {
                            resize_surface(&mut painter, window.inner_size());
                        }
                        WindowEvent::RedrawRequested => {
                            if frame_loop.begin_frame().is_none() {
                                event_loop.exit();
                                return;
                            }

                            let raw_input = egui_state.take_egui_input(&window);
                            let full_output = egui_ctx.run(raw_input, |ctx| {
                                app.ui(ctx, &render_state);
                            });

                            egui_state.handle_platform_output(&window, full_output.platform_output);

                            let clipped_primitives = egui_ctx
                                .tessellate(full_output.shapes, full_output.pixels_per_point);
                            let _ = painter.paint_and_update_textures(
                                egui::ViewportId::ROOT,
                                full_output.pixels_per_point,
                                clear_color,
                                &clipped_primitives,
                                &full_output.textures_delta,
                                Vec::new(),
                            );
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;

    Ok(())
}

fn resize_surface(painter: &mut Painter, size: PhysicalSize<u32>) {
    if let Some((width, height)) = surface_size(size) {
        painter.on_window_resized(egui::ViewportId::ROOT, width, height);
    }
}

/// Minimised windows report a zero extent; the surface keeps its last size then.
fn surface_size(size: PhysicalSize<u32>) -> Option<(NonZeroU32, NonZeroU32)> {
    Some((NonZeroU32::new(size.width)?, NonZeroU32::new(size.height)?))
}

fn create_painter(ctx: egui::Context) -> Result<Painter> {
    let mut configuration = WgpuConfiguration::default();
    let power_preference = match std::env::var("FOLIO_POWER_PREF") {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "high" | "high_performance" | "high-performance" => {
                wgpu::PowerPreference::HighPerformance
            }
            "default" => wgpu::PowerPreference::default(),
            _ => wgpu::PowerPreference::LowPower,
        },
        Err(_) => wgpu::PowerPreference::LowPower,
    };
    configuration.wgpu_setup = WgpuSetup::CreateNew(WgpuSetupCreateNew {
        power_preference,
        device_descriptor: Arc::new(|adapter| {
            let required_limits =
                wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());
            wgpu::DeviceDescriptor {
                label: Some("folio-view"),
                required_features: wgpu::Features::empty(),
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::default(),
            }
        }),
        ..Default::default()
    });

    let painter = pollster::block_on(Painter::new(
        ctx,
        configuration,
        false,
        RendererOptions::default(),
    ));
    Ok(painter)
}

struct FolioApp {
    portfolio: Portfolio,
    items: Vec<PortfolioItem>,
    modal: ModalController,
    viewer: Viewer<SceneRenderer>,
    viewer_size: egui::Vec2,
    render_texture_id: Option<egui::TextureId>,
    render_texture_revision: u64,
}

impl FolioApp {
    fn new(
        config: FolioConfig,
        portfolio: Portfolio,
        render_state: &RenderState,
        pixel_ratio: f32,
    ) -> Self {
        let backend = SceneRenderer::new(render_state.device.clone(), render_state.queue.clone());
        let height = VIEWER_PANEL_WIDTH * 0.75;
        let mut viewer = Viewer::new(&config, backend, VIEWER_PANEL_WIDTH, height, pixel_ratio);
        viewer.begin_loading(config.model_path.clone());

        let items = portfolio.items();
        debug!(items = items.len(), "portfolio ready");
        Self {
            portfolio,
            items,
            modal: ModalController::new(),
            viewer,
            viewer_size: egui::vec2(VIEWER_PANEL_WIDTH, height),
            render_texture_id: None,
            render_texture_revision: 0,
        }
    }

    fn ui(&mut self, ctx: &egui::Context, render_state: &RenderState) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            if !self.portfolio.owner.is_empty() {
                ui.heading(&self.portfolio.owner);
            }
            if !self.portfolio.headline.is_empty() {
                ui.label(&self.portfolio.headline);
            }
            ui.add_space(6.0);
        });

        egui::SidePanel::right("viewer_panel")
            .resizable(true)
            .default_width(VIEWER_PANEL_WIDTH)
            .show(ctx, |ui| {
                ui.heading("Model");
                ui.add_space(4.0);
                let available = ui.available_size();
                let (rect, response) =
                    ui.allocate_exact_size(available, egui::Sense::click_and_drag());
                self.draw_viewport(ctx, ui, rect, response, render_state);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.spacing_mut().item_spacing = egui::vec2(12.0, 12.0);
                    for idx in 0..self.items.len() {
                        if self.item_card(ui, idx) {
                            self.modal.open(&self.items[idx]);
                        }
                    }
                });
            });
        });

        if self.modal.is_visible() {
            self.project_modal(ctx);
        }
    }

    /// Returns true when the card was clicked.
    fn item_card(&self, ui: &mut egui::Ui, idx: usize) -> bool {
        let item = &self.items[idx];
        let response = egui::Frame::group(ui.style())
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.strong(&item.title);
                ui.label(&item.role);
                ui.small(&item.tools);
            })
            .response
            .interact(egui::Sense::click())
            .on_hover_cursor(egui::CursorIcon::PointingHand);
        response.clicked()
    }

    fn project_modal(&mut self, ctx: &egui::Context) {
        #[allow(deprecated)]
        let screen = ctx.screen_rect();
        let overlay = egui::Area::new(egui::Id::new("modal_overlay"))
            .order(egui::Order::Middle)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                let response = ui.allocate_rect(screen, egui::Sense::click());
                ui.painter().rect_filled(
                    screen,
                    0.0,
                    egui::Color32::from_black_alpha(OVERLAY_ALPHA),
                );
                response
            })
            .inner;

        let mut close_requested = false;
        let window = egui::Window::new("project_modal")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .order(egui::Order::Foreground)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_max_width(420.0);
                ui.heading(self.modal.title());
                ui.add_space(4.0);
                ui.label(format!("Role: {}", self.modal.role()));
                ui.label(format!("Tools: {}", self.modal.tools()));
                ui.add_space(6.0);
                ui.label(self.modal.description());
                ui.add_space(8.0);
                if ui.button("Close").clicked() {
                    close_requested = true;
                }
            });

        if close_requested {
            self.modal.close();
            return;
        }
        if window.is_some_and(|window| window.response.clicked()) {
            self.modal.handle_click(ClickTarget::Content);
        }
        if overlay.clicked() {
            self.modal.handle_click(ClickTarget::Overlay);
        }
    }

    fn draw_viewport(
        &mut self,
        ctx: &egui::Context,
        ui: &mut egui::Ui,
        rect: egui::Rect,
        response: egui::Response,
        render_state: &RenderState,
    ) {
        let size = rect.size();
        let pixel_ratio = ctx.pixels_per_point();
        if (self.viewer.pixel_ratio() - pixel_ratio).abs() > f32::EPSILON {
            self.viewer.set_pixel_ratio(pixel_ratio);
        }
        if size != self.viewer_size {
            self.viewer_size = size;
            self.viewer.resize(size.x, size.y);
        }

        let hovered = response.hovered();
        let delta = response.drag_delta();
        let scroll_delta = if hovered {
            ctx.input(|i| i.raw_scroll_delta.y)
        } else {
            0.0
        };
        self.viewer.handle_input(&ViewerInput {
            pointer_delta: [delta.x, delta.y],
            primary_down: response.dragged_by(egui::PointerButton::Primary),
            secondary_down: response.dragged_by(egui::PointerButton::Secondary),
            middle_down: response.dragged_by(egui::PointerButton::Middle),
            scroll_delta,
            hovered,
        });
        self.viewer.tick();
        self.sync_render_texture(render_state);

        if let Some(texture_id) = self.render_texture_id {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            ui.painter().image(texture_id, rect, uv, egui::Color32::WHITE);
        }

        let painter = ui.painter().with_clip_rect(rect);
        if let Some(message) = self.viewer.error_message() {
            let [r, g, b] = LOAD_ERROR_COLOR.rgb();
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                message,
                FontId::proportional(16.0),
                egui::Color32::from_rgb(r, g, b),
            );
        } else if let LoadState::Loading { percent } = self.viewer.load_state() {
            let text = match percent {
                Some(percent) => format!("Loading {percent:.0}%"),
                None => "Loading".to_string(),
            };
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                text,
                FontId::proportional(14.0),
                ui.visuals().weak_text_color(),
            );
        }
    }

    fn sync_render_texture(&mut self, render_state: &RenderState) {
        let revision = self.viewer.backend().target_revision();
        if self.render_texture_revision == revision && self.render_texture_id.is_some() {
            return;
        }

        let view = self.viewer.backend().target_view();
        let mut renderer = render_state.renderer.write();
        let texture_id = if let Some(id) = self.render_texture_id {
            renderer.update_egui_texture_from_wgpu_texture(
                &render_state.device,
                view,
                wgpu::FilterMode::Linear,
                id,
            );
            id
        } else {
            renderer.register_native_texture(
                &render_state.device,
                view,
                wgpu::FilterMode::Linear,
            )
        };
        self.render_texture_id = Some(texture_id);
        self.render_texture_revision = revision;
    }
}
