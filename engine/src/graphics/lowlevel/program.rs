//! Linked vertex + fragment programs.

use std::{fmt, rc::Rc};

use log::{debug, error};
use rustc_hash::FxHashMap;

use crate::{
    diagnostics::Diagnostics,
    graphics::{
        ATTRIBUTE_BINDINGS, Fragment, GraphicsDevice, ProgramHandle, UniformValue, Vertex,
        lowlevel::shader::StageRef,
    },
};

/// Uniforms the engine feeds every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Uniform {
    /// Seconds since startup, `float`.
    Time,
    /// Framebuffer size in pixels, `vec2`.
    Resolution,
    /// Cursor position in pixels from the top-left corner, `vec2`.
    Mouse,
}

impl Uniform {
    pub const ALL: [Uniform; 3] = [Uniform::Time, Uniform::Resolution, Uniform::Mouse];

    pub fn name(&self) -> &'static str {
        match self {
            Uniform::Time => "time",
            Uniform::Resolution => "resolution",
            Uniform::Mouse => "mouse",
        }
    }

    /// Shadertoy-style name, tried when [`Uniform::name`] isn't declared.
    pub fn alias(&self) -> &'static str {
        match self {
            Uniform::Time => "iTime",
            Uniform::Resolution => "iResolution",
            Uniform::Mouse => "iMouse",
        }
    }
}

/// A linked program together with the stages it was linked from.
///
/// Only successfully linked programs exist; a failed link releases the program object and
/// drops any owned stage before returning the diagnostic.
pub struct ShaderProgram<D: GraphicsDevice> {
    device: Rc<D>,
    handle: ProgramHandle<D>,
    /// `None` marks a uniform the shader doesn't declare.
    uniforms: FxHashMap<Uniform, Option<D::UniformLocation>>,
    vertex: StageRef<D, Vertex>,
    fragment: StageRef<D, Fragment>,
}

impl<D: GraphicsDevice> ShaderProgram<D> {
    /// Attaches both stages, binds the fixed attribute slots and links.
    pub fn link(
        device: &Rc<D>,
        vertex: StageRef<D, Vertex>,
        fragment: StageRef<D, Fragment>,
    ) -> Result<Self, Diagnostics> {
        let link_failure = |log: String| Diagnostics::LinkFailure {
            vertex: vertex.origin().to_string(),
            fragment: fragment.origin().to_string(),
            log,
        };

        let raw = device.create_program().map_err(link_failure)?;
        device.attach_shader(raw, vertex.handle().raw());
        device.attach_shader(raw, fragment.handle().raw());
        for (slot, name) in ATTRIBUTE_BINDINGS {
            device.bind_attrib_location(raw, slot, name);
        }

        if !device.link_program(raw) {
            let log = device.program_info_log(raw);
            device.delete_program(raw);
            error!(
                "Failed to link program '{}' + '{}'",
                vertex.origin(),
                fragment.origin()
            );
            error!("{}", log);
            return Err(link_failure(log));
        }

        let uniforms = Uniform::ALL
            .into_iter()
            .map(|uniform| {
                let location = device
                    .uniform_location(raw, uniform.name())
                    .or_else(|| device.uniform_location(raw, uniform.alias()));
                (uniform, location)
            })
            .collect::<FxHashMap<_, _>>();

        debug!(
            "Linked program {:?} ('{}' + '{}'), uniforms: {:?}",
            raw,
            vertex.origin(),
            fragment.origin(),
            uniforms
                .iter()
                .filter(|(_, l)| l.is_some())
                .map(|(u, _)| u.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            device: device.clone(),
            handle: ProgramHandle::new(raw),
            uniforms,
            vertex,
            fragment,
        })
    }

    /// Makes this the program the next draw call uses.
    pub fn activate(&self) {
        self.device.use_program(self.handle.raw());
    }

    /// Uploads `value` if the shader declares `uniform`. Returns whether it did.
    ///
    /// The program must be active.
    pub fn set_uniform(&self, uniform: Uniform, value: UniformValue) -> bool {
        match self.uniform_location(uniform) {
            Some(location) => {
                self.device.set_uniform(location, value);
                true
            }
            None => false,
        }
    }

    pub fn uniform_location(&self, uniform: Uniform) -> Option<&D::UniformLocation> {
        self.uniforms.get(&uniform).and_then(Option::as_ref)
    }

    pub fn has_uniform(&self, uniform: Uniform) -> bool {
        self.uniform_location(uniform).is_some()
    }

    /// The engine uniforms this program declares, in [`Uniform::ALL`] order.
    pub fn resolved_uniforms(&self) -> Vec<Uniform> {
        Uniform::ALL
            .into_iter()
            .filter(|u| self.has_uniform(*u))
            .collect()
    }

    pub fn handle(&self) -> ProgramHandle<D> {
        self.handle
    }

    pub fn vertex(&self) -> &StageRef<D, Vertex> {
        &self.vertex
    }

    pub fn fragment(&self) -> &StageRef<D, Fragment> {
        &self.fragment
    }
}

impl<D: GraphicsDevice> Drop for ShaderProgram<D> {
    // Runs before the fields drop, so the program goes before any owned stage.
    fn drop(&mut self) {
        self.device.delete_program(self.handle.raw());
    }
}

impl<D: GraphicsDevice> fmt::Debug for ShaderProgram<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle)
            .field("vertex", &self.vertex)
            .field("fragment", &self.fragment)
            .field("uniforms", &self.resolved_uniforms())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::{
        DiagnosticKind,
        graphics::{
            Stage,
            headless::HeadlessDevice,
            lowlevel::shader::{Ownership, ShaderSource, ShaderUnit},
        },
    };

    const VERTEX: &str = "#version 330 core\nin vec3 position;\nin vec2 texCoord;\nvoid main() { gl_Position = vec4(position, 1.0); }\n";

    fn unit<S: Stage>(device: &Rc<HeadlessDevice>, text: &str) -> ShaderUnit<HeadlessDevice, S> {
        ShaderUnit::compile(
            device,
            ShaderSource::Embedded {
                text,
                label: "<test>",
            },
        )
        .unwrap()
    }

    #[test]
    fn link_binds_fixed_attribute_slots() {
        let device = Rc::new(HeadlessDevice::new());
        let vertex = Rc::new(unit::<Vertex>(&device, VERTEX));
        let fragment = unit::<Fragment>(&device, "void main() {}");

        let program =
            ShaderProgram::link(&device, StageRef::Builtin(vertex), StageRef::Owned(fragment))
                .unwrap();

        assert_eq!(
            device.attribute_bindings(program.handle().raw()),
            vec![(0, "position".to_string()), (1, "texCoord".to_string())]
        );
    }

    #[test]
    fn absent_uniforms_are_not_errors() {
        let device = Rc::new(HeadlessDevice::new());
        let vertex = Rc::new(unit::<Vertex>(&device, VERTEX));
        let fragment = unit::<Fragment>(
            &device,
            "uniform float time;\nuniform vec2 iMouse;\nvoid main() {}",
        );

        let program =
            ShaderProgram::link(&device, StageRef::Builtin(vertex), StageRef::Owned(fragment))
                .unwrap();

        assert_eq!(
            program.resolved_uniforms(),
            vec![Uniform::Time, Uniform::Mouse]
        );
        program.activate();
        assert!(program.set_uniform(Uniform::Time, UniformValue::Float(2.5)));
        assert!(!program.set_uniform(Uniform::Resolution, UniformValue::Vec2(Vec2::ONE)));
        assert_eq!(
            device.uniform_value("time"),
            Some(UniformValue::Float(2.5))
        );
        assert_eq!(device.uniform_value("resolution"), None);
    }

    #[test]
    fn link_failure_releases_program_and_owned_stage() {
        let device = Rc::new(HeadlessDevice::new());
        let vertex = Rc::new(unit::<Vertex>(&device, VERTEX));
        let fragment = unit::<Fragment>(&device, "// no entry point\n");

        let err = ShaderProgram::link(
            &device,
            StageRef::Builtin(vertex.clone()),
            StageRef::Owned(fragment),
        )
        .unwrap_err();

        assert_eq!(err.kind(), DiagnosticKind::LinkFailure);
        assert!(err.log().unwrap().contains("main"));
        assert_eq!(device.live_programs(), 0);
        // Only the shared vertex stage survives.
        assert_eq!(device.live_shaders(), 1);
        assert_eq!(device.invalid_releases(), 0);
    }

    #[test]
    fn drop_releases_owned_stage_but_not_builtin() {
        let device = Rc::new(HeadlessDevice::new());
        let vertex = Rc::new(unit::<Vertex>(&device, VERTEX));
        let fragment = unit::<Fragment>(&device, "void main() {}");

        let program = ShaderProgram::link(
            &device,
            StageRef::Builtin(vertex.clone()),
            StageRef::Owned(fragment),
        )
        .unwrap();
        assert_eq!(program.vertex().ownership(), Ownership::Builtin);
        assert_eq!(program.fragment().ownership(), Ownership::Owned);
        assert_eq!(device.live_programs(), 1);
        assert_eq!(device.live_shaders(), 2);

        drop(program);
        assert_eq!(device.live_programs(), 0);
        assert_eq!(device.live_shaders(), 1);

        drop(vertex);
        assert_eq!(device.live_shaders(), 0);
        assert_eq!(device.invalid_releases(), 0);
    }
}
