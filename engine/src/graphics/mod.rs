//! Graphics device seam and typed GPU handles.
//!
//! Everything that talks to the driver goes through [`GraphicsDevice`]. The engine only ever
//! sees [`StageHandle`]s and [`ProgramHandle`]s, so a vertex stage can't end up where a
//! fragment stage or a program is expected.

use std::{fmt, marker::PhantomData};

use glam::Vec2;

#[cfg(test)]
pub(crate) mod headless;
pub mod lowlevel;

/// Attribute slot the quad's positions are fed through.
pub const POSITION_SLOT: u32 = 0;
/// Attribute slot the quad's texture coordinates are fed through.
pub const TEX_COORD_SLOT: u32 = 1;

/// Fixed attribute bindings applied to every program before linking.
pub const ATTRIBUTE_BINDINGS: [(u32, &str); 2] =
    [(POSITION_SLOT, "position"), (TEX_COORD_SLOT, "texCoord")];

/// Runtime tag for a shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Compile-time tag for a shader stage.
pub trait Stage: 'static {
    const KIND: StageKind;
}

/// Marker for the vertex stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vertex;

/// Marker for the fragment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment;

impl Stage for Vertex {
    const KIND: StageKind = StageKind::Vertex;
}

impl Stage for Fragment {
    const KIND: StageKind = StageKind::Fragment;
}

/// A value that can be pushed to a uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
}

/// The driver operations the shader lifecycle needs.
///
/// Implementations are single threaded: every call happens on the thread that owns the
/// context. Failure reporting is left to the driver's status queries and info logs, the
/// same way the underlying API works, so the protocol around them lives in one place.
pub trait GraphicsDevice {
    type Shader: Copy + fmt::Debug + PartialEq;
    type Program: Copy + fmt::Debug + PartialEq;
    type UniformLocation: Clone + fmt::Debug;

    /// Allocates an empty shader object for the given stage.
    fn create_shader(&self, stage: StageKind) -> Result<Self::Shader, String>;
    /// Uploads `source` and compiles it. Returns the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn bind_attrib_location(&self, program: Self::Program, slot: u32, name: &str);
    /// Links the program. Returns the link status.
    fn link_program(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);

    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;
    /// Makes `program` the one the next draw call rasterizes with.
    fn use_program(&self, program: Self::Program);
    /// Uploads to a uniform of the currently used program.
    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue);
}

/// A raw shader stage handle, tagged with its stage.
pub struct StageHandle<D: GraphicsDevice, S: Stage> {
    raw: D::Shader,
    _stage: PhantomData<S>,
}

impl<D: GraphicsDevice, S: Stage> StageHandle<D, S> {
    pub(crate) fn new(raw: D::Shader) -> Self {
        Self {
            raw,
            _stage: PhantomData,
        }
    }

    pub fn raw(&self) -> D::Shader {
        self.raw
    }

    pub fn kind(&self) -> StageKind {
        S::KIND
    }
}

impl<D: GraphicsDevice, S: Stage> fmt::Debug for StageHandle<D, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StageHandle<{}>({:?})", S::KIND, self.raw)
    }
}

impl<D: GraphicsDevice, S: Stage> PartialEq for StageHandle<D, S> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

/// A raw linked program handle.
pub struct ProgramHandle<D: GraphicsDevice> {
    raw: D::Program,
}

impl<D: GraphicsDevice> ProgramHandle<D> {
    pub(crate) fn new(raw: D::Program) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> D::Program {
        self.raw
    }
}

impl<D: GraphicsDevice> Clone for ProgramHandle<D> {
    fn clone(&self) -> Self {
        Self { raw: self.raw }
    }
}

impl<D: GraphicsDevice> Copy for ProgramHandle<D> {}

impl<D: GraphicsDevice> fmt::Debug for ProgramHandle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgramHandle({:?})", self.raw)
    }
}

impl<D: GraphicsDevice> PartialEq for ProgramHandle<D> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
