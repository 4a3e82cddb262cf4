use std::{fmt, rc::Rc};

use log::info;

use crate::{
    builtins::{
        DEFAULT_FRAGMENT_LABEL, DEFAULT_FRAGMENT_SHADER, ERROR_FRAGMENT_LABEL,
        ERROR_FRAGMENT_SHADER, VERTEX_LABEL, VERTEX_SHADER,
    },
    diagnostics::Diagnostics,
    graphics::{
        Fragment, GraphicsDevice, Stage, Vertex,
        lowlevel::{
            program::ShaderProgram,
            shader::{ShaderSource, ShaderUnit, StageRef},
        },
    },
};

/// The embedded stages, compiled once and shared read-only for the engine's lifetime.
pub struct BuiltinPool<D: GraphicsDevice> {
    vertex: Rc<ShaderUnit<D, Vertex>>,
    default_fragment: Rc<ShaderUnit<D, Fragment>>,
    error_fragment: Rc<ShaderUnit<D, Fragment>>,
}

impl<D: GraphicsDevice> BuiltinPool<D> {
    /// Compiles all three builtins. Any failure is fatal.
    pub fn compile(device: &Rc<D>) -> Result<Self, Diagnostics> {
        let pool = Self {
            vertex: compile_builtin(device, VERTEX_SHADER, VERTEX_LABEL)?,
            default_fragment: compile_builtin(
                device,
                DEFAULT_FRAGMENT_SHADER,
                DEFAULT_FRAGMENT_LABEL,
            )?,
            error_fragment: compile_builtin(device, ERROR_FRAGMENT_SHADER, ERROR_FRAGMENT_LABEL)?,
        };
        info!("Compiled built-in shaders");
        Ok(pool)
    }

    /// A shared reference to the builtin vertex stage.
    pub fn vertex(&self) -> StageRef<D, Vertex> {
        StageRef::Builtin(self.vertex.clone())
    }

    /// Links builtin vertex + default fragment.
    pub fn default_program(&self, device: &Rc<D>) -> Result<ShaderProgram<D>, Diagnostics> {
        ShaderProgram::link(
            device,
            self.vertex(),
            StageRef::Builtin(self.default_fragment.clone()),
        )
    }

    /// Links builtin vertex + error fragment.
    pub fn error_program(&self, device: &Rc<D>) -> Result<ShaderProgram<D>, Diagnostics> {
        ShaderProgram::link(
            device,
            self.vertex(),
            StageRef::Builtin(self.error_fragment.clone()),
        )
    }
}

fn compile_builtin<D: GraphicsDevice, S: Stage>(
    device: &Rc<D>,
    text: &str,
    label: &str,
) -> Result<Rc<ShaderUnit<D, S>>, Diagnostics> {
    ShaderUnit::compile(device, ShaderSource::Embedded { text, label })
        .map(Rc::new)
        .map_err(|e| Diagnostics::fatal(format!("{label} failed to compile"), e))
}

impl<D: GraphicsDevice> fmt::Debug for BuiltinPool<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinPool")
            .field("vertex", &self.vertex)
            .field("default_fragment", &self.default_fragment)
            .field("error_fragment", &self.error_fragment)
            .finish()
    }
}
