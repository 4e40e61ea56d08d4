use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use pathlight_core::film::Extent;
use pathlight_core::schedule::{RenderScheduler, ViewEvent};
use pathlight_core::session::SessionConfig;
use pathlight_core::uniforms::ShaderMode;

use crate::gpu::{Gpu, GpuInit, SurfaceErrorAction};
use crate::tracer::{FilmTexture, Tracer};

/// Scale from a winit scroll line to browser-style wheel delta units, which
/// the zoom rate constant is calibrated against.
const WHEEL_LINE_DELTA: f32 = 100.0;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub session: SessionConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "pathlight".to_string(),
            initial_size: LogicalSize::new(800.0, 450.0),
            session: SessionConfig::default(),
        }
    }
}

/// Entry point for the viewer runtime.
pub struct Runtime;

impl Runtime {
    pub fn run(config: ViewerConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// Renderer + scheduler for the single view.
struct ViewState {
    tracer: Tracer,
    scheduler: RenderScheduler<FilmTexture>,
}

struct AppState {
    config: ViewerConfig,
    entry: Option<WindowEntry>,
    view: Option<ViewState>,
}

impl AppState {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            entry: None,
            view: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let entry = WindowEntryBuilder {
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, GpuInit::default()))
                    .expect("GPU initialization failed for window")
            },
        }
        .build();

        let view = entry.with_gpu(|gpu| -> Result<ViewState> {
            let size = gpu.size();
            let extent = Extent::new(size.width, size.height);

            let mut tracer = Tracer::new(gpu.device(), gpu.surface_format());
            let films = tracer
                .create_films(gpu.device(), extent)
                .context("failed to create accumulation films")?;

            let mut session = self.config.session.clone();
            session.aspect = size.width as f32 / size.height.max(1) as f32;

            Ok(ViewState {
                tracer,
                scheduler: RenderScheduler::new(session, films),
            })
        })?;

        entry.with_window(|w| w.request_redraw());

        self.entry = Some(entry);
        self.view = Some(view);
        Ok(())
    }

    /// Recreates both films together for the new surface size and restarts
    /// accumulation. A zero size defers until the next real resize.
    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        let (Some(entry), Some(view)) = (self.entry.as_mut(), self.view.as_mut()) else {
            return;
        };

        entry.with_gpu_mut(|gpu| gpu.resize(new_size));

        let extent = Extent::new(new_size.width, new_size.height);
        if extent.is_empty() {
            return;
        }
        let films = entry.with_gpu(|gpu| view.tracer.create_films(gpu.device(), extent));
        match films {
            Ok(pair) => {
                let aspect = new_size.width as f32 / new_size.height as f32;
                view.scheduler.resize(pair, aspect);
                entry.with_window(|w| w.request_redraw());
            }
            Err(e) => log::error!("film recreation failed: {e}"),
        }
    }

    /// Translates a pressed key into a scheduler event.
    fn key_event(&self, code: KeyCode) -> Option<ViewEvent> {
        let view = self.view.as_ref()?;
        let session = view.scheduler.session();

        match code {
            KeyCode::Digit1 => Some(ViewEvent::SetShaderMode(ShaderMode::Lambertian)),
            KeyCode::Digit2 => Some(ViewEvent::SetShaderMode(ShaderMode::Phong)),
            KeyCode::Digit3 => Some(ViewEvent::SetShaderMode(ShaderMode::Mirror)),
            KeyCode::Digit4 => Some(ViewEvent::SetShaderMode(ShaderMode::Transmissive)),
            KeyCode::Digit5 => Some(ViewEvent::SetShaderMode(ShaderMode::PathTraced)),

            KeyCode::Equal | KeyCode::NumpadAdd => Some(ViewEvent::IncreaseSubdivisions),
            KeyCode::Minus | KeyCode::NumpadSubtract => Some(ViewEvent::DecreaseSubdivisions),

            KeyCode::KeyA => Some(ViewEvent::SetAddressMode(session.address_mode().next())),
            KeyCode::KeyF => Some(ViewEvent::SetFilterMode(session.filter_mode().next())),

            KeyCode::Space => Some(ViewEvent::ToggleProgressive),

            _ => None,
        }
    }

    fn apply(&mut self, event: ViewEvent) {
        let (Some(entry), Some(view)) = (self.entry.as_ref(), self.view.as_mut()) else {
            return;
        };

        view.scheduler.apply(event);

        // Arm a redraw whenever the scheduler has a pending submission.
        // winit coalesces repeated requests, so several events still yield
        // one frame.
        if view.scheduler.wants_frame() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    /// Drives one tick: at most one render submission, then the ping-pong
    /// copy, then presentation.
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(entry), Some(view)) = (self.entry.as_mut(), self.view.as_mut()) else {
            return;
        };

        // Spurious exposure redraws with nothing pending keep the last
        // presented frame; submissions only happen on scheduler request.
        if !view.scheduler.wants_frame() {
            return;
        }

        let mut fatal = false;

        entry.with_mut(|fields| {
            let mut frame = match fields.gpu.begin_frame() {
                Ok(f) => f,
                Err(err) => {
                    match fields.gpu.handle_surface_error(err) {
                        SurfaceErrorAction::Fatal => fatal = true,
                        // Request still pending in the scheduler; retry.
                        _ => fields.window.request_redraw(),
                    }
                    return;
                }
            };

            let ViewState { tracer, scheduler } = view;
            let queue = fields.gpu.queue();

            let outcome: std::result::Result<_, anyhow::Error> = scheduler.run_frame(
                &mut frame.encoder,
                |encoder, snapshot, src, _dst| {
                    tracer.render(queue, encoder, &frame.view, snapshot, src);
                    Ok(())
                },
                |encoder, src, dst| Tracer::copy_film(encoder, src, dst),
            );

            if let Err(e) = outcome {
                // Counter and snapshot are untouched; the same frame is
                // retried on the next tick.
                log::error!("render submission failed: {e:#}");
                fields.window.request_redraw();
                return;
            }

            fields.window.pre_present_notify();
            fields.gpu.submit(frame);

            if scheduler.wants_frame() {
                fields.window.request_redraw();
            }
        });

        if fatal {
            log::error!("surface error is fatal; shutting down");
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window(event_loop) {
            log::error!("failed to create viewer window: {e:#}");
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Progressive refinement self-schedules; everything else waits for
        // input.
        let (Some(entry), Some(view)) = (self.entry.as_ref(), self.view.as_ref()) else {
            return;
        };
        if view.scheduler.wants_frame() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(new_size) => self.handle_resize(new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_ref() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    self.handle_resize(new_size);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINE_DELTA,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                self.apply(ViewEvent::Zoom { delta });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(ev) = self.key_event(code) {
                        self.apply(ev);
                    }
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
