use std::rc::Rc;

use anyhow::anyhow;
use bytemuck::{Pod, Zeroable};
use glow::HasContext;

use crate::graphics::{POSITION_SLOT, TEX_COORD_SLOT, lowlevel::GlowDevice};

/// One float attribute inside a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// The attribute slot the program binds this to.
    pub slot: u32,
    /// Number of `f32` components.
    pub components: i32,
    /// Byte offset from the start of the vertex.
    pub offset: i32,
}

/// A trait for types that can be used as buffer layouts.
///
/// # Safety
/// The implementor must ensure that `STRIDE` and `ATTRIBUTES` correctly describe the memory layout of the type.
pub unsafe trait VertexLayout: Pod + Zeroable {
    const STRIDE: i32;
    const ATTRIBUTES: &'static [VertexAttribute];

    const _ASSERT: () = {
        assert!(
            Self::STRIDE as usize == std::mem::size_of::<Self>(),
            "VertexLayout stride does not match size of type"
        );
    };
}

/// A full-screen quad vertex: clip-space position plus texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

unsafe impl VertexLayout for QuadVertex {
    const STRIDE: i32 = std::mem::size_of::<QuadVertex>() as i32;
    const ATTRIBUTES: &'static [VertexAttribute] = &[
        VertexAttribute {
            slot: POSITION_SLOT,
            components: 3,
            offset: 0,
        },
        VertexAttribute {
            slot: TEX_COORD_SLOT,
            components: 2,
            offset: 3 * std::mem::size_of::<f32>() as i32,
        },
    ];
}

impl QuadVertex {
    pub const fn new(position: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            tex_coord,
        }
    }
}

/// Corners of clip space, UVs spanning [0, 1].
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex::new([1.0, 1.0, 0.0], [1.0, 1.0]),
    QuadVertex::new([-1.0, 1.0, 0.0], [0.0, 1.0]),
    QuadVertex::new([1.0, -1.0, 0.0], [1.0, 0.0]),
    QuadVertex::new([-1.0, -1.0, 0.0], [0.0, 0.0]),
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

/// The full-screen quad, uploaded once and drawn every frame.
#[derive(Debug)]
pub struct QuadMesh {
    device: Rc<GlowDevice>,
    vao: glow::VertexArray,
    vertex_buffer: glow::Buffer,
    index_buffer: glow::Buffer,
}

impl QuadMesh {
    /// Uploads the quad and records its attribute layout in a vertex array.
    pub fn new(device: Rc<GlowDevice>) -> anyhow::Result<Self> {
        let () = QuadVertex::_ASSERT;

        let gl = device.gl();
        unsafe {
            let vao = gl
                .create_vertex_array()
                .map_err(|e| anyhow!("Failed to create vertex array: {e}"))?;
            gl.bind_vertex_array(Some(vao));

            let vertex_buffer = gl
                .create_buffer()
                .map_err(|e| anyhow!("Failed to create vertex buffer: {e}"))?;
            let index_buffer = gl
                .create_buffer()
                .map_err(|e| anyhow!("Failed to create index buffer: {e}"))?;

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES),
                glow::STATIC_DRAW,
            );

            for attribute in QuadVertex::ATTRIBUTES {
                gl.enable_vertex_attrib_array(attribute.slot);
                gl.vertex_attrib_pointer_f32(
                    attribute.slot,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    QuadVertex::STRIDE,
                    attribute.offset,
                );
            }

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_INDICES),
                glow::STATIC_DRAW,
            );

            gl.bind_vertex_array(None);

            Ok(Self {
                device,
                vao,
                vertex_buffer,
                index_buffer,
            })
        }
    }

    /// Draws the quad with whatever program is active.
    pub fn draw(&self) {
        let gl = self.device.gl();
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_elements(
                glow::TRIANGLES,
                QUAD_INDICES.len() as i32,
                glow::UNSIGNED_INT,
                0,
            );
            gl.bind_vertex_array(None);
        }
    }
}

impl Drop for QuadMesh {
    fn drop(&mut self) {
        let gl = self.device.gl();
        unsafe {
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vertex_buffer);
            gl.delete_buffer(self.index_buffer);
        }
    }
}
