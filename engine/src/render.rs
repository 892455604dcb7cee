//! Frame setup and the per-frame draw step.

use crate::{
    gl::{ClearFlags, DrawMode, GraphicsContext},
    mesh::{Drawable, Mesh, StaticMeshUploader},
    shader::{Shader, ShaderProgram, ShaderProgramBuilder},
    window::PhysicalSize,
    Result,
};

/// The pixel rectangle rendering output maps onto.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<PhysicalSize<u32>> for Viewport {
    fn from(size: PhysicalSize<u32>) -> Self {
        let clamp = |value: u32| i32::try_from(value).unwrap_or(i32::MAX);
        Self::new(0, 0, clamp(size.width), clamp(size.height))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[must_use]
pub struct RenderSettings {
    pub clear_color: [f32; 4],
    pub depth_test: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            depth_test: true,
        }
    }
}

/// Issue one draw of `drawable` with `program`, leaving neither bound afterwards.
pub fn draw<C: GraphicsContext>(
    gl: &C,
    program: &ShaderProgram<C::Program>,
    drawable: &Drawable<C::VertexArray>,
) {
    gl.use_program(Some(program.handle));
    gl.bind_vertex_array(Some(drawable.vertex_array));
    gl.draw_arrays(DrawMode::Triangles, 0, drawable.vertex_count);
    gl.bind_vertex_array(None);
    gl.use_program(None);
}

/// Owns the program and drawable created once at startup and redraws them on request.
#[derive(Debug)]
#[must_use]
pub struct Renderer<C: GraphicsContext> {
    program: ShaderProgram<C::Program>,
    drawable: Drawable<C::VertexArray>,
    viewport: Option<Viewport>,
    settings: RenderSettings,
}

impl<C: GraphicsContext> Renderer<C> {
    /// Initialize the `Renderer` against a current context.
    pub fn initialize(
        gl: &C,
        vertex: &Shader,
        fragment: &Shader,
        mesh: &Mesh,
        settings: RenderSettings,
    ) -> Result<Self> {
        tracing::info!("OpenGL version: {}", gl.version());

        gl.clear_color(settings.clear_color);
        gl.set_depth_test(settings.depth_test);

        let program = ShaderProgramBuilder::new(gl).build_from(vertex, fragment)?;
        let drawable = StaticMeshUploader::new(gl).upload_mesh(mesh)?;

        tracing::debug!("renderer initialized successfully");

        Ok(Self {
            program,
            drawable,
            viewport: None,
            settings,
        })
    }

    /// Handle window resized event.
    pub fn on_resized(&mut self, gl: &C, size: PhysicalSize<u32>) {
        let viewport = Viewport::from(size);
        tracing::debug!("setting viewport: {}x{}", viewport.width, viewport.height);
        gl.viewport(viewport);
        self.viewport = Some(viewport);
    }

    /// Clear the frame and draw the mesh.
    pub fn draw_frame(&self, gl: &C) {
        let mut flags = ClearFlags::COLOR;
        flags.set(ClearFlags::DEPTH, self.settings.depth_test);
        gl.clear(flags);
        draw(gl, &self.program, &self.drawable);
    }

    /// The viewport set by the last resize, if any.
    #[inline]
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    #[inline]
    pub fn program(&self) -> &ShaderProgram<C::Program> {
        &self.program
    }

    #[inline]
    pub fn drawable(&self) -> &Drawable<C::VertexArray> {
        &self.drawable
    }
}
