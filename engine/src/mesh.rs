use crate::{
    gl::{BufferUsage, GraphicsContext},
    Error, Result,
};
use bytemuck::{Pod, Zeroable};
use std::mem;

/// An interleaved vertex: position followed by color.
#[derive(Default, Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
#[must_use]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

const _: () = assert!(mem::size_of::<Vertex>() == 24);

impl Vertex {
    /// Create a new `Vertex` instance.
    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }
}

/// A single float attribute within an interleaved vertex.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    /// Byte offset from the start of a vertex.
    pub offset: i32,
}

/// How an interleaved vertex buffer is laid out in memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub struct VertexLayout {
    /// Bytes between consecutive vertices.
    pub stride: i32,
    pub attributes: [VertexAttribute; 2],
}

impl VertexLayout {
    /// Position in slot 0, color in slot 1, matching [`Vertex`].
    pub const POSITION_COLOR: Self = Self {
        stride: mem::size_of::<Vertex>() as i32,
        attributes: [
            VertexAttribute {
                location: 0,
                components: 3,
                offset: 0,
            },
            VertexAttribute {
                location: 1,
                components: 3,
                offset: mem::size_of::<[f32; 3]>() as i32,
            },
        ],
    };

    #[inline]
    #[must_use]
    pub const fn floats_per_vertex(&self) -> usize {
        self.stride as usize / mem::size_of::<f32>()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::triangle()
    }
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// A triangle spanning the viewport: red at the top, green bottom-left, blue bottom-right.
    pub fn triangle() -> Self {
        Self::new(vec![
            Vertex::new([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
            Vertex::new([-1.0, -1.0, 0.0], [0.0, 1.0, 0.0]),
            Vertex::new([1.0, -1.0, 0.0], [0.0, 0.0, 1.0]),
        ])
    }

    /// Vertex data as packed floats.
    #[inline]
    #[must_use]
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// A vertex array ready to be drawn. Immutable after upload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct Drawable<V> {
    pub(crate) vertex_array: V,
    pub(crate) vertex_count: i32,
}

impl<V: Copy> Drawable<V> {
    #[inline]
    pub fn vertex_array(&self) -> V {
        self.vertex_array
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }
}

/// Uploads interleaved vertex data once into a GPU buffer and describes its layout.
#[derive(Debug)]
#[must_use]
pub struct StaticMeshUploader<'a, C> {
    gl: &'a C,
    layout: VertexLayout,
}

impl<'a, C: GraphicsContext> StaticMeshUploader<'a, C> {
    pub fn new(gl: &'a C) -> Self {
        Self {
            gl,
            layout: VertexLayout::POSITION_COLOR,
        }
    }

    pub fn upload_mesh(&self, mesh: &Mesh) -> Result<Drawable<C::VertexArray>> {
        self.upload(mesh.as_floats(), mesh.vertices.len())
    }

    /// Upload `vertex_count` vertices of packed floats.
    pub fn upload(
        &self,
        vertices: &[f32],
        vertex_count: usize,
    ) -> Result<Drawable<C::VertexArray>> {
        let expected = vertex_count.saturating_mul(self.layout.floats_per_vertex());
        let count = i32::try_from(vertex_count).ok().filter(|&count| count > 0);
        let Some(count) = count.filter(|_| vertices.len() == expected) else {
            return Err(Error::InvalidVertexData {
                vertex_count,
                expected,
                found: vertices.len(),
            });
        };

        tracing::debug!("uploading mesh with {vertex_count} vertices");

        let gl = self.gl;
        let vertex_array = gl
            .create_vertex_array()
            .map_err(|reason| Error::ResourceAllocation {
                resource: "vertex array",
                reason,
            })?;
        let buffer = match gl.create_buffer() {
            Ok(buffer) => buffer,
            Err(reason) => {
                gl.delete_vertex_array(vertex_array);
                return Err(Error::ResourceAllocation {
                    resource: "vertex buffer",
                    reason,
                });
            }
        };

        gl.bind_vertex_array(Some(vertex_array));
        gl.bind_array_buffer(Some(buffer));
        gl.array_buffer_data(bytemuck::cast_slice(vertices), BufferUsage::StaticDraw);

        let stride = self.layout.stride;
        for attribute in &self.layout.attributes {
            gl.vertex_attrib_pointer_f32(
                attribute.location,
                attribute.components,
                false,
                stride,
                attribute.offset,
            );
        }
        for attribute in &self.layout.attributes {
            gl.enable_vertex_attrib_array(attribute.location);
        }

        // The vertex array keeps the buffer referenced once unbound.
        gl.bind_array_buffer(None);
        gl.bind_vertex_array(None);

        tracing::debug!("uploaded mesh successfully");

        Ok(Drawable {
            vertex_array,
            vertex_count: count,
        })
    }
}
