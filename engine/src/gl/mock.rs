//! Software [`GraphicsContext`] for tests, no GPU required.
//!
//! Every call is recorded. Shader compilation and program linking follow a small set of rules
//! that mirror what a driver rejects: a stage without a `main` function fails to compile, and a
//! fragment input with no matching vertex output fails to link. Triangles are rasterized with a
//! pass-through program: attribute 0 is the clip-space position, attribute 1 the color.

use super::{BufferUsage, ClearFlags, DrawMode, GraphicsContext};
use crate::{render::Viewport, shader::ShaderStage};
use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet},
};

pub(crate) const BLACK: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateShader(ShaderStage),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram,
    AttachShader(u32, u32),
    DetachShader(u32, u32),
    LinkProgram(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    CreateVertexArray,
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    CreateBuffer,
    BindArrayBuffer(Option<u32>),
    ArrayBufferData { len: usize, usage: BufferUsage },
    DeleteBuffer(u32),
    VertexAttribPointer {
        location: u32,
        components: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    EnableVertexAttribArray(u32),
    DrawArrays { mode: DrawMode, first: i32, count: i32 },
    Viewport(Viewport),
    ClearColor([f32; 4]),
    Clear(ClearFlags),
    DepthTest(bool),
}

/// Which allocation should report failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Allocation {
    Shader(ShaderStage),
    Program,
    VertexArray,
    Buffer,
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
    deleted: bool,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    deleted: bool,
}

#[derive(Debug, Copy, Clone)]
struct AttribPointer {
    buffer: u32,
    components: i32,
    stride: i32,
    offset: i32,
}

#[derive(Debug, Default)]
struct VertexArrayObject {
    attributes: BTreeMap<u32, AttribPointer>,
    enabled: BTreeSet<u32>,
    deleted: bool,
}

#[derive(Debug, Default)]
struct BufferObject {
    data: Vec<u8>,
    usage: Option<BufferUsage>,
    deleted: bool,
}

#[derive(Debug)]
struct State {
    calls: Vec<Call>,
    next_handle: u32,
    shaders: BTreeMap<u32, ShaderObject>,
    programs: BTreeMap<u32, ProgramObject>,
    vertex_arrays: BTreeMap<u32, VertexArrayObject>,
    buffers: BTreeMap<u32, BufferObject>,
    current_program: Option<u32>,
    bound_vertex_array: Option<u32>,
    bound_array_buffer: Option<u32>,
    viewport: Viewport,
    clear_color: [f32; 4],
    depth_test: bool,
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
}

impl State {
    fn handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

#[derive(Debug)]
pub(crate) struct MockContext {
    state: RefCell<State>,
    fail: Cell<Option<Allocation>>,
}

impl MockContext {
    /// Create a context with a `width` x `height` RGBA framebuffer.
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            state: RefCell::new(State {
                calls: vec![],
                next_handle: 0,
                shaders: BTreeMap::new(),
                programs: BTreeMap::new(),
                vertex_arrays: BTreeMap::new(),
                buffers: BTreeMap::new(),
                current_program: None,
                bound_vertex_array: None,
                bound_array_buffer: None,
                viewport: Viewport::new(0, 0, width as i32, height as i32),
                clear_color: [0.0, 0.0, 0.0, 0.0],
                depth_test: false,
                width,
                height,
                pixels: vec![[0, 0, 0, 0]; width * height],
            }),
            fail: Cell::new(None),
        }
    }

    /// Make the next matching allocation fail.
    pub(crate) fn fail_allocation(&self, allocation: Allocation) {
        self.fail.set(Some(allocation));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub(crate) fn live_shaders(&self) -> usize {
        let state = self.state.borrow();
        state.shaders.values().filter(|s| !s.deleted).count()
    }

    pub(crate) fn live_programs(&self) -> usize {
        let state = self.state.borrow();
        state.programs.values().filter(|p| !p.deleted).count()
    }

    pub(crate) fn live_vertex_arrays(&self) -> usize {
        let state = self.state.borrow();
        state.vertex_arrays.values().filter(|v| !v.deleted).count()
    }

    pub(crate) fn live_buffers(&self) -> usize {
        let state = self.state.borrow();
        state.buffers.values().filter(|b| !b.deleted).count()
    }

    pub(crate) fn is_linked(&self, program: u32) -> bool {
        let state = self.state.borrow();
        state
            .programs
            .get(&program)
            .map_or(false, |p| p.linked && !p.deleted)
    }

    pub(crate) fn attached_shaders(&self, program: u32) -> Vec<u32> {
        let state = self.state.borrow();
        state
            .programs
            .get(&program)
            .map(|p| p.attached.clone())
            .unwrap_or_default()
    }

    pub(crate) fn buffer_contents(&self, buffer: u32) -> Option<(Vec<u8>, Option<BufferUsage>)> {
        let state = self.state.borrow();
        state
            .buffers
            .get(&buffer)
            .map(|b| (b.data.clone(), b.usage))
    }

    pub(crate) fn current_viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    pub(crate) fn current_program(&self) -> Option<u32> {
        self.state.borrow().current_program
    }

    pub(crate) fn bound_vertex_array(&self) -> Option<u32> {
        self.state.borrow().bound_vertex_array
    }

    pub(crate) fn bound_array_buffer(&self) -> Option<u32> {
        self.state.borrow().bound_array_buffer
    }

    pub(crate) fn depth_test(&self) -> bool {
        self.state.borrow().depth_test
    }

    pub(crate) fn pixels(&self) -> Vec<[u8; 4]> {
        self.state.borrow().pixels.clone()
    }

    /// Read a pixel with the origin at the bottom-left, as OpenGL does.
    pub(crate) fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let state = self.state.borrow();
        state.pixels[y * state.width + x]
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn should_fail(&self, allocation: Allocation) -> bool {
        if self.fail.get() == Some(allocation) {
            self.fail.set(None);
            true
        } else {
            false
        }
    }
}

/// `(type, name)` pairs for every `in` or `out` declaration in `source`.
fn interface(source: &str, qualifier: &str) -> Vec<(String, String)> {
    source
        .lines()
        .filter_map(|line| {
            let mut line = line.trim();
            if line.starts_with("layout") {
                line = line.split_once(')').map_or("", |(_, rest)| rest.trim());
            }
            let mut tokens = line.trim_end_matches(';').split_whitespace();
            if tokens.next()? != qualifier {
                return None;
            }
            let ty = tokens.next()?;
            let name = tokens.next()?;
            Some((ty.to_string(), name.to_string()))
        })
        .collect()
}

fn to_unorm(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

fn read_attribute(state: &State, pointer: AttribPointer, vertex: usize) -> Option<[f32; 3]> {
    let buffer = state.buffers.get(&pointer.buffer)?;
    let start = pointer.offset as usize + vertex * pointer.stride as usize;
    let mut value = [0.0; 3];
    for (component, slot) in value
        .iter_mut()
        .enumerate()
        .take(pointer.components as usize)
    {
        let offset = start + component * 4;
        let bytes = buffer.data.get(offset..offset + 4)?;
        *slot = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    Some(value)
}

impl State {
    fn rasterize(&mut self, first: i32, count: i32) {
        let Some(program) = self.current_program else {
            return;
        };
        if !self.programs.get(&program).map_or(false, |p| p.linked) {
            return;
        }
        let Some(vertex_array) = self
            .bound_vertex_array
            .and_then(|vao| self.vertex_arrays.get(&vao))
        else {
            return;
        };
        let (Some(&position), Some(&color)) = (
            vertex_array.attributes.get(&0),
            vertex_array.attributes.get(&1),
        ) else {
            return;
        };
        if !vertex_array.enabled.contains(&0) || !vertex_array.enabled.contains(&1) {
            return;
        }

        let viewport = self.viewport;
        let mut vertices = vec![];
        for vertex in first.max(0) as usize..(first + count).max(0) as usize {
            let (Some(ndc), Some(rgb)) = (
                read_attribute(self, position, vertex),
                read_attribute(self, color, vertex),
            ) else {
                return;
            };
            let window = [
                viewport.x as f32 + (ndc[0] + 1.0) * 0.5 * viewport.width as f32,
                viewport.y as f32 + (ndc[1] + 1.0) * 0.5 * viewport.height as f32,
            ];
            vertices.push((window, rgb));
        }

        let x_range = viewport.x.max(0) as usize
            ..((viewport.x + viewport.width).max(0) as usize).min(self.width);
        let y_range = viewport.y.max(0) as usize
            ..((viewport.y + viewport.height).max(0) as usize).min(self.height);
        for triangle in vertices.chunks_exact(3) {
            let [(a, ca), (b, cb), (c, cc)] = [triangle[0], triangle[1], triangle[2]];
            let area = edge(a, b, c);
            if area == 0.0 {
                continue;
            }
            for y in y_range.clone() {
                for x in x_range.clone() {
                    let p = [x as f32 + 0.5, y as f32 + 0.5];
                    let wa = edge(b, c, p) / area;
                    let wb = edge(c, a, p) / area;
                    let wc = edge(a, b, p) / area;
                    if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                        continue;
                    }
                    let channel = |i: usize| to_unorm(wa * ca[i] + wb * cb[i] + wc * cc[i]);
                    self.pixels[y * self.width + x] = [channel(0), channel(1), channel(2), 255];
                }
            }
        }
    }
}

impl GraphicsContext for MockContext {
    type Shader = u32;
    type Program = u32;
    type VertexArray = u32;
    type Buffer = u32;

    fn version(&self) -> String {
        "3.3 (mock)".to_string()
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        self.record(Call::CreateShader(stage));
        if self.should_fail(Allocation::Shader(stage)) {
            return Err("out of memory".to_string());
        }
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        state.shaders.insert(
            handle,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
                deleted: false,
            },
        );
        Ok(handle)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(object) = self.state.borrow_mut().shaders.get_mut(&shader) {
            object.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) {
        self.record(Call::CompileShader(shader));
        if let Some(object) = self.state.borrow_mut().shaders.get_mut(&shader) {
            object.compiled = object.source.contains("void main");
            object.log = if object.compiled {
                String::new()
            } else {
                "0:1(1): error: syntax error, unexpected end of file".to_string()
            };
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        let state = self.state.borrow();
        state.shaders.get(&shader).map_or(false, |s| s.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        let state = self.state.borrow();
        state
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        self.record(Call::DeleteShader(shader));
        if let Some(object) = self.state.borrow_mut().shaders.get_mut(&shader) {
            object.deleted = true;
        }
    }

    fn create_program(&self) -> Result<u32, String> {
        self.record(Call::CreateProgram);
        if self.should_fail(Allocation::Program) {
            return Err("out of memory".to_string());
        }
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        state.programs.insert(handle, ProgramObject::default());
        Ok(handle)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(Call::AttachShader(program, shader));
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(Call::DetachShader(program, shader));
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.attached.retain(|&attached| attached != shader);
        }
    }

    fn link_program(&self, program: u32) {
        self.record(Call::LinkProgram(program));
        let mut state = self.state.borrow_mut();
        let Some(attached) = state.programs.get(&program).map(|p| p.attached.clone()) else {
            return;
        };
        let stage_source = |stage: ShaderStage| {
            attached
                .iter()
                .filter_map(|handle| state.shaders.get(handle))
                .find(|shader| shader.stage == stage && shader.compiled)
                .map(|shader| shader.source.clone())
        };
        let result = match (
            stage_source(ShaderStage::Vertex),
            stage_source(ShaderStage::Fragment),
        ) {
            (Some(vertex), Some(fragment)) => {
                let outputs = interface(&vertex, "out");
                interface(&fragment, "in")
                    .into_iter()
                    .find_map(|(ty, name)| {
                        match outputs.iter().find(|(_, output)| *output == name) {
                            None => Some(format!(
                                "error: fragment shader input `{name}` has no matching vertex shader output"
                            )),
                            Some((output_ty, _)) if *output_ty != ty => Some(format!(
                                "error: `{name}` declared as {output_ty} in vertex shader and {ty} in fragment shader"
                            )),
                            Some(_) => None,
                        }
                    })
                    .map_or(Ok(()), Err)
            }
            _ => Err("error: program requires a compiled vertex and fragment shader".to_string()),
        };
        if let Some(object) = state.programs.get_mut(&program) {
            match result {
                Ok(()) => {
                    object.linked = true;
                    object.log.clear();
                }
                Err(log) => {
                    object.linked = false;
                    object.log = log;
                }
            }
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        let state = self.state.borrow();
        state.programs.get(&program).map_or(false, |p| p.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        let state = self.state.borrow();
        state
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: u32) {
        self.record(Call::DeleteProgram(program));
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.deleted = true;
        }
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
        self.state.borrow_mut().current_program = program;
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        self.record(Call::CreateVertexArray);
        if self.should_fail(Allocation::VertexArray) {
            return Err("out of memory".to_string());
        }
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        state
            .vertex_arrays
            .insert(handle, VertexArrayObject::default());
        Ok(handle)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(Call::BindVertexArray(vertex_array));
        self.state.borrow_mut().bound_vertex_array = vertex_array;
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        self.record(Call::DeleteVertexArray(vertex_array));
        if let Some(object) = self
            .state
            .borrow_mut()
            .vertex_arrays
            .get_mut(&vertex_array)
        {
            object.deleted = true;
        }
    }

    fn create_buffer(&self) -> Result<u32, String> {
        self.record(Call::CreateBuffer);
        if self.should_fail(Allocation::Buffer) {
            return Err("out of memory".to_string());
        }
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        state.buffers.insert(handle, BufferObject::default());
        Ok(handle)
    }

    fn bind_array_buffer(&self, buffer: Option<u32>) {
        self.record(Call::BindArrayBuffer(buffer));
        self.state.borrow_mut().bound_array_buffer = buffer;
    }

    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage) {
        self.record(Call::ArrayBufferData {
            len: data.len(),
            usage,
        });
        let mut state = self.state.borrow_mut();
        if let Some(buffer) = state.bound_array_buffer {
            if let Some(object) = state.buffers.get_mut(&buffer) {
                object.data = data.to_vec();
                object.usage = Some(usage);
            }
        }
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(Call::DeleteBuffer(buffer));
        if let Some(object) = self.state.borrow_mut().buffers.get_mut(&buffer) {
            object.deleted = true;
        }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        location: u32,
        components: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.record(Call::VertexAttribPointer {
            location,
            components,
            normalized,
            stride,
            offset,
        });
        let mut state = self.state.borrow_mut();
        let (Some(vertex_array), Some(buffer)) =
            (state.bound_vertex_array, state.bound_array_buffer)
        else {
            return;
        };
        if let Some(object) = state.vertex_arrays.get_mut(&vertex_array) {
            object.attributes.insert(
                location,
                AttribPointer {
                    buffer,
                    components,
                    stride,
                    offset,
                },
            );
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        self.record(Call::EnableVertexAttribArray(location));
        let mut state = self.state.borrow_mut();
        if let Some(vertex_array) = state.bound_vertex_array {
            if let Some(object) = state.vertex_arrays.get_mut(&vertex_array) {
                object.enabled.insert(location);
            }
        }
    }

    fn draw_arrays(&self, mode: DrawMode, first: i32, count: i32) {
        self.record(Call::DrawArrays { mode, first, count });
        self.state.borrow_mut().rasterize(first, count);
    }

    fn viewport(&self, viewport: Viewport) {
        self.record(Call::Viewport(viewport));
        self.state.borrow_mut().viewport = viewport;
    }

    fn clear_color(&self, color: [f32; 4]) {
        self.record(Call::ClearColor(color));
        self.state.borrow_mut().clear_color = color;
    }

    fn clear(&self, flags: ClearFlags) {
        self.record(Call::Clear(flags));
        if flags.contains(ClearFlags::COLOR) {
            let mut state = self.state.borrow_mut();
            let [r, g, b, a] = state.clear_color;
            let color = [to_unorm(r), to_unorm(g), to_unorm(b), to_unorm(a)];
            state.pixels.fill(color);
        }
    }

    fn set_depth_test(&self, enabled: bool) {
        self.record(Call::DepthTest(enabled));
        self.state.borrow_mut().depth_test = enabled;
    }
}
