use std::{ffi::c_void, fmt::Debug};

use glow::HasContext;
use log::debug;

use crate::graphics::{GraphicsDevice, StageKind, UniformValue};

pub mod buf;
pub mod program;
pub mod shader;

/// OpenGL implementation of [`GraphicsDevice`] on top of `glow`.
pub struct GlowDevice {
    gl: glow::Context,
}

impl GlowDevice {
    /// Loads the GL function pointers through `loader`.
    ///
    /// # Safety
    /// The context `loader` resolves against must be current on the calling thread, and must
    /// stay current (and alive) for as long as the device and everything created through it.
    pub unsafe fn from_loader(loader: impl FnMut(&str) -> *const c_void) -> Self {
        let gl = unsafe { glow::Context::from_loader_function(loader) };
        Self { gl }
    }

    /// The raw `glow` context.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Returns the `(GL_VERSION, GL_SHADING_LANGUAGE_VERSION)` strings.
    pub fn version_info(&self) -> (String, String) {
        unsafe {
            (
                self.gl.get_parameter_string(glow::VERSION),
                self.gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION),
            )
        }
    }

    pub fn viewport(&self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) };
    }

    pub fn clear(&self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }
}

impl Debug for GlowDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowDevice").finish_non_exhaustive()
    }
}

impl GraphicsDevice for GlowDevice {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: StageKind) -> Result<Self::Shader, String> {
        let shader_type = match stage {
            StageKind::Vertex => glow::VERTEX_SHADER,
            StageKind::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(shader_type) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            self.gl.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        debug!("glDeleteShader({:?})", shader);
        unsafe { self.gl.delete_shader(shader) };
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) };
    }

    fn bind_attrib_location(&self, program: Self::Program, slot: u32, name: &str) {
        unsafe { self.gl.bind_attrib_location(program, slot, name) };
    }

    fn link_program(&self, program: Self::Program) -> bool {
        unsafe {
            self.gl.link_program(program);
            self.gl.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        debug!("glDeleteProgram({:?})", program);
        unsafe { self.gl.delete_program(program) };
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn use_program(&self, program: Self::Program) {
        unsafe { self.gl.use_program(Some(program)) };
    }

    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue) {
        unsafe {
            match value {
                UniformValue::Float(v) => self.gl.uniform_1_f32(Some(location), v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(Some(location), v.x, v.y),
            }
        }
    }
}
