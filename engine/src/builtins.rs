//! Shaders embedded in the binary.
//!
//! These are compiled once at startup. If any of them fails to compile the installation is
//! broken and the engine refuses to start.

pub const VERTEX_LABEL: &str = "<built-in vertex>";
pub const DEFAULT_FRAGMENT_LABEL: &str = "<built-in default fragment>";
pub const ERROR_FRAGMENT_LABEL: &str = "<built-in error fragment>";

/// Pass-through vertex stage for the full-screen quad.
pub const VERTEX_SHADER: &str = r"#version 330 core
in vec3 position;
in vec2 texCoord;
out vec2 Frag_UV;

void main() {
    Frag_UV = texCoord;
    gl_Position = vec4(position, 1.0);
}
";

/// Shown when no shader file is given: the UV gradient.
pub const DEFAULT_FRAGMENT_SHADER: &str = r"#version 330 core
in vec2 Frag_UV;
out vec4 Out_Color;

void main() {
    Out_Color = vec4(Frag_UV, 0.0, 1.0);
}
";

/// Fill colour of the error fallback.
pub const ERROR_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

/// Shown while the user's shader is broken: a flat magenta fill.
pub const ERROR_FRAGMENT_SHADER: &str = r"#version 330 core
in vec2 Frag_UV;
out vec4 Out_Color;

void main() {
    Out_Color = vec4(1.0, 0.0, 1.0, 1.0);
}
";
