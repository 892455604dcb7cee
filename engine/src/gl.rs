//! The explicit graphics context every GPU operation is issued through.
//!
//! OpenGL keeps an implicit "current context" per thread. Rather than reaching for that ambient
//! state, the shader builder, mesh uploader and renderer all take a `&impl GraphicsContext`. The
//! production implementation, [`GlContext`], wraps a [`glow::Context`] and can only be created by
//! a caller that has made the underlying context current on this thread.

use crate::{render::Viewport, shader::ShaderStage};
use bitflags::bitflags;
use glow::HasContext;
use std::{ffi::c_void, fmt, marker::PhantomData};

#[cfg(test)]
pub(crate) mod mock;

bitflags! {
    #[derive(Default)]
    #[must_use]
    pub struct ClearFlags: u32 {
        /// Clear the color buffer.
        const COLOR = 0x01;
        /// Clear the depth buffer.
        const DEPTH = 0x02;
    }
}

/// Usage hint given when uploading buffer data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub enum BufferUsage {
    /// Written once, drawn many times.
    StaticDraw,
}

/// How vertices passed to a draw call are assembled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub enum DrawMode {
    Triangles,
}

/// A graphics API context bound to the calling thread.
///
/// Allocation methods return the driver's reason as a `String` on failure so callers can decide
/// how to surface it.
pub trait GraphicsContext {
    type Shader: Copy + fmt::Debug + PartialEq;
    type Program: Copy + fmt::Debug + PartialEq;
    type VertexArray: Copy + fmt::Debug + PartialEq;
    type Buffer: Copy + fmt::Debug + PartialEq;

    /// The driver's version string.
    fn version(&self) -> String;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>);
    /// Upload `data` to the currently bound array buffer.
    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage);
    fn delete_buffer(&self, buffer: Self::Buffer);

    /// Describe a float attribute sourced from the currently bound array buffer.
    fn vertex_attrib_pointer_f32(
        &self,
        location: u32,
        components: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn enable_vertex_attrib_array(&self, location: u32);

    fn draw_arrays(&self, mode: DrawMode, first: i32, count: i32);

    fn viewport(&self, viewport: Viewport);
    fn clear_color(&self, color: [f32; 4]);
    fn clear(&self, flags: ClearFlags);
    fn set_depth_test(&self, enabled: bool);
}

/// An OpenGL context loaded through [`glow`].
///
/// Not `Send` or `Sync`: a context may only be current on one thread, so every call for it must
/// come from the thread that created it.
#[must_use]
pub struct GlContext {
    gl: glow::Context,
    _thread_bound: PhantomData<*const ()>,
}

impl fmt::Debug for GlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlContext")
            .field("version", &self.gl.version())
            .finish_non_exhaustive()
    }
}

impl GlContext {
    /// Load OpenGL function pointers through `loader`.
    ///
    /// # Safety
    ///
    /// The OpenGL context `loader` resolves symbols for must be current on the calling thread for
    /// as long as the returned `GlContext` is used.
    pub unsafe fn from_loader_function<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        Self {
            gl: glow::Context::from_loader_function(loader),
            _thread_bound: PhantomData,
        }
    }
}

impl From<ShaderStage> for u32 {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl From<BufferUsage> for u32 {
    fn from(usage: BufferUsage) -> Self {
        match usage {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
        }
    }
}

impl From<DrawMode> for u32 {
    fn from(mode: DrawMode) -> Self {
        match mode {
            DrawMode::Triangles => glow::TRIANGLES,
        }
    }
}

impl From<ClearFlags> for u32 {
    fn from(flags: ClearFlags) -> Self {
        let mut mask = 0;
        if flags.contains(ClearFlags::COLOR) {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::DEPTH) {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        mask
    }
}

// SAFETY (all methods below): `GlContext` can only be constructed by a caller guaranteeing the
// context is current, and it cannot leave the thread it was created on. Handles passed in were
// created by this same context.
impl GraphicsContext for GlContext {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type VertexArray = glow::VertexArray;
    type Buffer = glow::Buffer;

    fn version(&self) -> String {
        unsafe { self.gl.get_parameter_string(glow::VERSION) }
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage.into()) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { self.gl.create_vertex_array() }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer) }
    }

    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, usage.into());
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        location: u32,
        components: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                location,
                components,
                glow::FLOAT,
                normalized,
                stride,
                offset,
            );
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) }
    }

    fn draw_arrays(&self, mode: DrawMode, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(mode.into(), first, count) }
    }

    fn viewport(&self, viewport: Viewport) {
        unsafe {
            self.gl
                .viewport(viewport.x, viewport.y, viewport.width, viewport.height);
        }
    }

    fn clear_color(&self, [red, green, blue, alpha]: [f32; 4]) {
        unsafe { self.gl.clear_color(red, green, blue, alpha) }
    }

    fn clear(&self, flags: ClearFlags) {
        unsafe { self.gl.clear(flags.into()) }
    }

    fn set_depth_test(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }
}
