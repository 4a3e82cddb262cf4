//! Compiled shader stages.

use std::{
    fmt::{self, Debug, Display},
    ops::Deref,
    path::{Path, PathBuf},
    rc::Rc,
};

use log::{debug, error};

use crate::{
    ReadOnlyString,
    diagnostics::Diagnostics,
    graphics::{GraphicsDevice, Stage, StageHandle, StageKind},
};

/// Where a stage's source text comes from.
#[derive(Debug, Clone, Copy)]
pub enum ShaderSource<'a> {
    /// Source embedded in the binary. `label` names it in diagnostics.
    Embedded { text: &'a str, label: &'a str },
    /// Source read in full from disk.
    File(&'a Path),
}

/// Records the origin of a compiled stage, for diagnostics and the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderOrigin {
    Embedded(ReadOnlyString),
    File(PathBuf),
}

impl Display for ShaderOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderOrigin::Embedded(label) => f.write_str(label),
            ShaderOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One successfully compiled shader stage.
///
/// There is no way to hold a unit that failed to compile: [`ShaderUnit::compile`] either
/// returns a unit with a live handle or releases whatever it allocated and returns the
/// diagnostic. The handle is released exactly once, when the unit is dropped.
pub struct ShaderUnit<D: GraphicsDevice, S: Stage> {
    device: Rc<D>,
    handle: StageHandle<D, S>,
    origin: ShaderOrigin,
}

impl<D: GraphicsDevice, S: Stage> ShaderUnit<D, S> {
    /// Compiles a stage from embedded text or from a file.
    pub fn compile(device: &Rc<D>, source: ShaderSource<'_>) -> Result<Self, Diagnostics> {
        match source {
            ShaderSource::Embedded { text, label } => {
                Self::compile_text(device, text, ShaderOrigin::Embedded(label.into()))
            }
            ShaderSource::File(path) => {
                let text = read_source(path)?;
                Self::compile_text(device, &text, ShaderOrigin::File(path.to_path_buf()))
            }
        }
    }

    fn compile_text(device: &Rc<D>, text: &str, origin: ShaderOrigin) -> Result<Self, Diagnostics> {
        let raw = device
            .create_shader(S::KIND)
            .map_err(|reason| Diagnostics::CompileFailure {
                stage: S::KIND,
                label: origin.to_string(),
                log: reason,
            })?;

        if !device.compile_shader(raw, text) {
            let log = device.shader_info_log(raw);
            device.delete_shader(raw);
            error!("Failed to compile shader '{}'", origin);
            error!("{}", log);
            return Err(Diagnostics::CompileFailure {
                stage: S::KIND,
                label: origin.to_string(),
                log,
            });
        }

        debug!("Compiled {} shader '{}' as {:?}", S::KIND, origin, raw);
        Ok(Self {
            device: device.clone(),
            handle: StageHandle::new(raw),
            origin,
        })
    }

    pub fn handle(&self) -> &StageHandle<D, S> {
        &self.handle
    }

    pub fn origin(&self) -> &ShaderOrigin {
        &self.origin
    }

    pub fn stage(&self) -> StageKind {
        S::KIND
    }
}

impl<D: GraphicsDevice, S: Stage> Drop for ShaderUnit<D, S> {
    fn drop(&mut self) {
        self.device.delete_shader(self.handle.raw());
    }
}

impl<D: GraphicsDevice, S: Stage> Debug for ShaderUnit<D, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderUnit")
            .field("handle", &self.handle)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Reads a whole shader file. Empty files are a read failure, not a compile failure.
fn read_source(path: &Path) -> Result<String, Diagnostics> {
    let read_failure = |reason: String| {
        error!("Couldn't read from file '{}': {}", path.display(), reason);
        Diagnostics::ReadFailure {
            path: path.to_path_buf(),
            reason,
        }
    };

    let bytes = std::fs::read(path).map_err(|e| read_failure(e.to_string()))?;
    if bytes.is_empty() {
        return Err(read_failure("file is empty".to_string()));
    }
    String::from_utf8(bytes).map_err(|e| read_failure(format!("not valid UTF-8: {e}")))
}

/// Who is responsible for releasing a stage a program refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Shared with the builtin pool. Program teardown never releases it.
    Builtin,
    /// Exclusively held by the program. Released with it.
    Owned,
}

/// A program's reference to one of its stages, tagged with its ownership.
pub enum StageRef<D: GraphicsDevice, S: Stage> {
    Builtin(Rc<ShaderUnit<D, S>>),
    Owned(ShaderUnit<D, S>),
}

impl<D: GraphicsDevice, S: Stage> StageRef<D, S> {
    pub fn ownership(&self) -> Ownership {
        match self {
            StageRef::Builtin(_) => Ownership::Builtin,
            StageRef::Owned(_) => Ownership::Owned,
        }
    }

    pub fn unit(&self) -> &ShaderUnit<D, S> {
        match self {
            StageRef::Builtin(unit) => unit,
            StageRef::Owned(unit) => unit,
        }
    }
}

impl<D: GraphicsDevice, S: Stage> Deref for StageRef<D, S> {
    type Target = ShaderUnit<D, S>;

    fn deref(&self) -> &Self::Target {
        self.unit()
    }
}

impl<D: GraphicsDevice, S: Stage> Debug for StageRef<D, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StageRef")
            .field(&self.ownership())
            .field(self.unit())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        DiagnosticKind,
        graphics::{Fragment, Vertex, headless::HeadlessDevice},
    };

    const GOOD: &str = "#version 330 core\nout vec4 color;\nvoid main() { color = vec4(1.0); }\n";
    const BROKEN: &str = "#version 330 core\n#error nope\nvoid main() {}\n";

    #[test]
    fn embedded_source_compiles() {
        let device = Rc::new(HeadlessDevice::new());
        let unit = ShaderUnit::<_, Fragment>::compile(
            &device,
            ShaderSource::Embedded {
                text: GOOD,
                label: "<test>",
            },
        )
        .unwrap();

        assert_eq!(unit.stage(), StageKind::Fragment);
        assert_eq!(unit.origin().to_string(), "<test>");
        assert_eq!(device.live_shaders(), 1);
    }

    #[test]
    fn compile_failure_releases_handle_and_reports_log() {
        let device = Rc::new(HeadlessDevice::new());
        let err = ShaderUnit::<_, Fragment>::compile(
            &device,
            ShaderSource::Embedded {
                text: BROKEN,
                label: "<broken>",
            },
        )
        .unwrap_err();

        assert_eq!(err.kind(), DiagnosticKind::CompileFailure);
        assert!(err.to_string().contains("<broken>"));
        assert!(err.log().unwrap().contains("nope"));
        assert_eq!(device.shaders_created(), 1);
        assert_eq!(device.live_shaders(), 0);
        assert_eq!(device.invalid_releases(), 0);
    }

    #[test]
    fn missing_and_empty_files_are_read_failures() {
        let device = Rc::new(HeadlessDevice::new());
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.frag");
        let err = ShaderUnit::<_, Fragment>::compile(&device, ShaderSource::File(&missing))
            .unwrap_err();
        assert_eq!(err.kind(), DiagnosticKind::ReadFailure);

        let empty = dir.path().join("empty.frag");
        fs::write(&empty, "").unwrap();
        let err =
            ShaderUnit::<_, Fragment>::compile(&device, ShaderSource::File(&empty)).unwrap_err();
        assert_eq!(err.kind(), DiagnosticKind::ReadFailure);
        assert!(err.to_string().contains("empty.frag"));

        // Nothing reached the driver.
        assert_eq!(device.shaders_created(), 0);
    }

    #[test]
    fn file_source_records_path_and_drop_releases_once() {
        let device = Rc::new(HeadlessDevice::new());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.vert");
        fs::write(&path, GOOD).unwrap();

        let unit = ShaderUnit::<_, Vertex>::compile(&device, ShaderSource::File(&path)).unwrap();
        assert_eq!(unit.origin(), &ShaderOrigin::File(path.clone()));
        assert_eq!(device.live_shaders(), 1);

        drop(unit);
        assert_eq!(device.live_shaders(), 0);
        assert_eq!(device.invalid_releases(), 0);
    }

    #[test]
    fn builtin_refs_do_not_release_shared_units() {
        let device = Rc::new(HeadlessDevice::new());
        let shared = Rc::new(
            ShaderUnit::<_, Fragment>::compile(
                &device,
                ShaderSource::Embedded {
                    text: GOOD,
                    label: "<shared>",
                },
            )
            .unwrap(),
        );

        let reference = StageRef::Builtin(shared.clone());
        assert_eq!(reference.ownership(), Ownership::Builtin);
        drop(reference);
        assert_eq!(device.live_shaders(), 1);

        drop(shared);
        assert_eq!(device.live_shaders(), 0);
    }
}
