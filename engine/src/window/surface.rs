//! OpenGL window surface.

use crate::{
    config::Config,
    gl::GlContext,
    render_bail,
    window::{PhysicalSize, Window},
    Result,
};
use anyhow::{anyhow, Context as _};
use derive_more::Deref;
use glutin::{
    config::{Config as SurfaceConfig, ConfigTemplateBuilder},
    context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version},
    display::GetGlDisplay,
    prelude::*,
    surface::{Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasRawWindowHandle;
use std::{ffi::CString, num::NonZeroU32, ptr};
use winit::{event_loop::EventLoop, window::WindowBuilder};

const DEPTH_BITS: u8 = 24;

#[derive(Debug, Deref)]
#[must_use]
pub(crate) struct RenderSurface {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    #[deref]
    pub(crate) window: Window,
}

/// Prefer the deepest depth buffer, then the most samples.
// glutin only invokes the picker once at least one config matched the template.
#[allow(clippy::expect_used)]
fn pick_config(configs: Box<dyn Iterator<Item = SurfaceConfig> + '_>) -> SurfaceConfig {
    configs
        .max_by_key(|config| (config.depth_size(), config.num_samples()))
        .expect("at least one matching config")
}

impl RenderSurface {
    /// Create a window with a current OpenGL core context.
    pub(crate) fn create(
        event_loop: &EventLoop<()>,
        window_builder: WindowBuilder,
        config: &Config,
    ) -> Result<(Self, GlContext)> {
        tracing::debug!("creating window surface");

        let template = ConfigTemplateBuilder::new().with_depth_size(DEPTH_BITS);
        let (window, surface_config) = DisplayBuilder::new()
            .with_window_builder(Some(window_builder))
            .build(event_loop, template, pick_config)
            .map_err(|err| anyhow!("failed to create window: {err}"))?;
        let Some(window) = window else {
            render_bail!("failed to create window");
        };

        let display = surface_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(window.raw_window_handle()));
        // SAFETY: The raw window handle belongs to `window`, which outlives the context.
        let context = unsafe { display.create_context(&surface_config, &context_attributes) }
            .context("failed to create OpenGL context")?;

        let surface_attributes = window.build_surface_attributes(Default::default());
        // SAFETY: As above, `window` outlives the surface.
        let surface = unsafe { display.create_window_surface(&surface_config, &surface_attributes) }
            .context("failed to create window surface")?;
        let context = context
            .make_current(&surface)
            .context("failed to make OpenGL context current")?;

        let interval = if config.vsync {
            NonZeroU32::new(1).map_or(SwapInterval::DontWait, SwapInterval::Wait)
        } else {
            SwapInterval::DontWait
        };
        if let Err(err) = surface.set_swap_interval(&context, interval) {
            tracing::warn!("failed to set swap interval: {err}");
        }

        // SAFETY: `context` was made current on this thread above and is kept alive alongside the
        // returned `GlContext` for the lifetime of the event loop.
        let gl = unsafe {
            GlContext::from_loader_function(|symbol| {
                CString::new(symbol)
                    .map_or(ptr::null(), |symbol| display.get_proc_address(&symbol))
            })
        };

        tracing::debug!("created window surface successfully");

        Ok((
            Self {
                surface,
                context,
                window,
            },
            gl,
        ))
    }

    /// Resize the drawable surface. Zero-sized requests are ignored.
    pub(crate) fn resize(&self, size: PhysicalSize<u32>) {
        if let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        {
            self.surface.resize(&self.context, width, height);
        }
    }

    pub(crate) fn swap_buffers(&self) -> Result<()> {
        self.surface
            .swap_buffers(&self.context)
            .context("failed to swap buffers")?;
        Ok(())
    }

    #[inline]
    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.window.inner_size().into()
    }
}
