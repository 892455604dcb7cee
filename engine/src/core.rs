//! Core engine features

use crate::{
    config::Config,
    context::Context,
    gl::GlContext,
    mesh::Mesh,
    render::{RenderSettings, Renderer},
    shader::Shader,
    window::{surface::RenderSurface, LogicalPosition, PhysicalSize},
    Error, Result,
};
use derive_builder::Builder;
use std::{borrow::Cow, time::Instant};
#[cfg(debug_assertions)]
use winit::event::{ElementState, VirtualKeyCode};
use winit::{
    dpi::LogicalSize,
    event::{Event, StartCause, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

#[derive(Debug, Clone, Builder)]
#[builder(default, build_fn(error = "Error"))]
#[builder_struct_attr(must_use)]
#[must_use]
pub struct Engine {
    #[builder(setter(into))]
    title: Cow<'static, str>,
    width: u32,
    height: u32,
    position: LogicalPosition<f64>,
    config: Config,
    vertex_shader: Shader,
    fragment_shader: Shader,
    mesh: Mesh,
    settings: RenderSettings,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            title: "Trigon".into(),
            width: 800,
            height: 600,
            position: LogicalPosition::new(100.0, 100.0),
            config: Config::default(),
            vertex_shader: Shader::default_vertex(),
            fragment_shader: Shader::default_fragment(),
            mesh: Mesh::triangle(),
            settings: RenderSettings::default(),
        }
    }
}

fn schedule_redraw(next: Option<Instant>, control_flow: &mut ControlFlow) {
    match next {
        Some(deadline) => control_flow.set_wait_until(deadline),
        None => control_flow.set_wait(),
    }
}

fn on_resized(
    size: PhysicalSize<u32>,
    cx: &mut Context,
    surface: &RenderSurface,
    gl: &GlContext,
    renderer: &mut Renderer<GlContext>,
) {
    // Minimized windows report a zero size; drawing resumes on the next non-zero resize.
    cx.suspended = size.is_empty();
    if cx.suspended {
        tracing::debug!("window minimized, suspending redraws");
        return;
    }
    surface.resize(size);
    renderer.on_resized(gl, size);
    surface.request_redraw();
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the window, build the GPU resources and redraw until the window closes.
    ///
    /// Only returns on initialization failure. Once the event loop starts, the process exits when
    /// the loop does.
    pub fn run(self) -> Result<()> {
        time!(initialize);

        let event_loop = EventLoop::new();
        let window_builder = WindowBuilder::new()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.width, self.height))
            .with_position(winit::dpi::LogicalPosition::from(self.position));
        let (surface, gl) = RenderSurface::create(&event_loop, window_builder, &self.config)?;

        let mut renderer = Renderer::initialize(
            &gl,
            &self.vertex_shader,
            &self.fragment_shader,
            &self.mesh,
            self.settings,
        )?;
        let mut cx = Context::new(self.title, self.config, Instant::now());
        on_resized(surface.size(), &mut cx, &surface, &gl, &mut renderer);

        timeEnd!(initialize);

        event_loop.run(move |event, _window_target, control_flow| {
            tracing::trace!("received event: {event:?}");
            match event {
                Event::NewEvents(StartCause::Init) => {
                    schedule_redraw(cx.schedule.start(Instant::now()), control_flow);
                }
                Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                    if cx.is_running() {
                        surface.request_redraw();
                    }
                    schedule_redraw(cx.schedule.tick(Instant::now()), control_flow);
                }
                Event::RedrawRequested(_) if cx.is_running() => {
                    renderer.draw_frame(&gl);
                    if let Err(err) = surface.swap_buffers() {
                        tracing::error!("failed to present frame: {err}");
                        control_flow.set_exit_with_code(1);
                        return;
                    }
                    if let Some(title) = cx.frame_presented(Instant::now()) {
                        surface.set_title(title);
                    }
                }
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::Resized(size) => {
                        on_resized(size.into(), &mut cx, &surface, &gl, &mut renderer);
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        on_resized(
                            (*new_inner_size).into(),
                            &mut cx,
                            &surface,
                            &gl,
                            &mut renderer,
                        );
                    }
                    #[cfg(debug_assertions)]
                    WindowEvent::KeyboardInput { input, .. } => {
                        if matches!(
                            (input.virtual_keycode, input.state),
                            (Some(VirtualKeyCode::Escape), ElementState::Pressed)
                        ) {
                            control_flow.set_exit();
                        }
                    }
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        tracing::debug!("window closed or destroyed");
                        control_flow.set_exit();
                    }
                    _ => (),
                },
                Event::LoopDestroyed => {
                    tracing::info!("shutting down...");
                }
                _ => (),
            }
        });
    }
}
