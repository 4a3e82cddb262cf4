//! Structured failure information for shader loading.

use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::graphics::StageKind;

/// Failure category, shown in the overlay status and used by callers that only care about the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    ReadFailure,
    CompileFailure,
    LinkFailure,
    FatalInitFailure,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::ReadFailure => "read failure",
            DiagnosticKind::CompileFailure => "compile failure",
            DiagnosticKind::LinkFailure => "link failure",
            DiagnosticKind::FatalInitFailure => "fatal init failure",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error)]
pub enum Diagnostics {
    /// The shader file is missing, unreadable or empty.
    #[error("couldn't read from file '{}': {reason}", path.display())]
    ReadFailure { path: PathBuf, reason: String },

    /// The driver rejected a shader stage.
    #[error("failed to compile {stage} shader '{label}':\n{log}")]
    CompileFailure {
        stage: StageKind,
        label: String,
        log: String,
    },

    /// The driver refused to link a vertex/fragment pair.
    #[error("failed to link program ({vertex} + {fragment}):\n{log}")]
    LinkFailure {
        vertex: String,
        fragment: String,
        log: String,
    },

    /// The embedded shaders or the graphics context are broken. Not recoverable.
    #[error("initialization failed: {message}")]
    FatalInitFailure {
        message: String,
        #[source]
        source: Option<Box<Diagnostics>>,
    },
}

impl Diagnostics {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostics::ReadFailure { .. } => DiagnosticKind::ReadFailure,
            Diagnostics::CompileFailure { .. } => DiagnosticKind::CompileFailure,
            Diagnostics::LinkFailure { .. } => DiagnosticKind::LinkFailure,
            Diagnostics::FatalInitFailure { .. } => DiagnosticKind::FatalInitFailure,
        }
    }

    /// The compiler or linker log, if the driver produced one.
    pub fn log(&self) -> Option<&str> {
        match self {
            Diagnostics::CompileFailure { log, .. } | Diagnostics::LinkFailure { log, .. } => {
                Some(log)
            }
            Diagnostics::FatalInitFailure {
                source: Some(source),
                ..
            } => source.log(),
            _ => None,
        }
    }

    /// Wraps a builtin failure as fatal.
    pub fn fatal(message: impl Into<String>, source: Diagnostics) -> Self {
        Diagnostics::FatalInitFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
