//! Shader lifecycle engine for the `shade` previewer.
//!
//! Compiles and links GLSL programs through a [`graphics::GraphicsDevice`], watches the
//! user's fragment shader for changes and swaps the active program without ever exposing
//! a half-built one to the render loop.

use std::sync::Arc;

/// A read-only string type.
pub type ReadOnlyString = Arc<str>;

pub mod builtins;
pub mod debug;
pub mod diagnostics;
pub mod graphics;
pub mod input;
pub mod reload;
pub mod watch;
pub mod window;

pub use diagnostics::{DiagnosticKind, Diagnostics};
pub use reload::{EngineConfig, EngineState, ReloadEngine};
