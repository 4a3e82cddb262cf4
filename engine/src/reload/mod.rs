//! The reload engine: owns the active program and drives compile → link → swap.
//!
//! The render loop calls [`ReloadEngine::tick`] once per frame. Every
//! [`EngineConfig::poll_interval`] the watched file is checked; a change triggers a full
//! reload attempt. A new program only replaces the active one once it's fully linked, so a
//! failed attempt never disturbs what's on screen except by switching to the error shader.

use std::{
    fmt,
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

use glam::Vec2;
use log::{debug, error, info, warn};

use crate::{
    diagnostics::Diagnostics,
    graphics::{
        Fragment, GraphicsDevice, ProgramHandle, UniformValue,
        lowlevel::{
            program::{ShaderProgram, Uniform},
            shader::{ShaderSource, ShaderUnit, StageRef},
        },
    },
    watch::{FileChangeDetector, FileStatus, Timestamp},
};

mod pool;

pub use pool::BuiltinPool;

/// Default interval between file polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How often the watched file is checked. Independent of frame rate.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Builtins not compiled yet. Never observable on a constructed engine.
    Uninitialized,
    /// The builtin pass-through look.
    BuiltinActive,
    /// The user's fragment shader.
    UserShaderActive,
    /// The user's shader failed; the error fill is showing.
    ErrorFallbackActive,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::BuiltinActive => "built-in",
            EngineState::UserShaderActive => "ok",
            EngineState::ErrorFallbackActive => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct WatchedFile {
    path: PathBuf,
    last_seen: Timestamp,
    /// Set once a disappearance has been handled, so it falls back only once.
    missing: bool,
}

impl WatchedFile {
    fn observe(path: &Path) -> Self {
        let (last_seen, missing) = match FileChangeDetector::poll(path, Timestamp::NEVER) {
            FileStatus::Modified(ts) => (ts, false),
            FileStatus::Unchanged => (Timestamp::NEVER, false),
            FileStatus::Missing => (Timestamp::NEVER, true),
        };
        Self {
            path: path.to_path_buf(),
            last_seen,
            missing,
        }
    }
}

pub struct ReloadEngine<D: GraphicsDevice> {
    // Declared before `builtins` so it drops first.
    active: ShaderProgram<D>,
    builtins: BuiltinPool<D>,
    device: Rc<D>,
    config: EngineConfig,
    state: EngineState,
    watched: Option<WatchedFile>,
    last_poll: Duration,
    resolution: Vec2,
    last_error: Option<Diagnostics>,
    reload_count: u64,
}

impl<D: GraphicsDevice> ReloadEngine<D> {
    /// Compiles the builtins and activates the default program.
    ///
    /// Every error returned here is a [`Diagnostics::FatalInitFailure`].
    pub fn init(
        device: Rc<D>,
        config: EngineConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, Diagnostics> {
        let builtins = BuiltinPool::compile(&device)?;
        let active = builtins
            .default_program(&device)
            .map_err(|e| Diagnostics::fatal("built-in default program failed to link", e))?;
        // The fallback has to work before anything can fall back to it.
        builtins
            .error_program(&device)
            .map_err(|e| Diagnostics::fatal("built-in error program failed to link", e))?;

        info!(
            "Shader engine ready ({}x{}, polling every {:?})",
            width, height, config.poll_interval
        );

        Ok(Self {
            active,
            builtins,
            device,
            config,
            state: EngineState::BuiltinActive,
            watched: None,
            last_poll: Duration::ZERO,
            resolution: Vec2::new(width as f32, height as f32),
            last_error: None,
            reload_count: 0,
        })
    }

    /// Starts watching `path` and loads it, or reverts to the builtin shader for `None`.
    ///
    /// On failure the error shader is active and the path stays watched, so the next
    /// detected change retries. The diagnostic is returned for the caller to report.
    pub fn load_shader(&mut self, path: Option<&Path>) -> Result<(), Diagnostics> {
        match path {
            Some(path) => {
                info!("Loading fragment shader '{}'", path.display());
                self.watched = Some(WatchedFile::observe(path));
                self.reload_watched()
            }
            None => {
                if let Some(watched) = self.watched.take() {
                    info!("No longer watching '{}'", watched.path.display());
                }
                self.revert_to_builtin()
            }
        }
    }

    /// Re-runs the load protocol for the watched file right away.
    pub fn request_reload(&mut self) -> Result<(), Diagnostics> {
        match self.watched.as_ref().map(|w| w.path.clone()) {
            Some(path) => {
                info!("Reload requested for '{}'", path.display());
                self.watched = Some(WatchedFile::observe(&path));
                self.reload_watched()
            }
            None => {
                debug!("Reload requested without a shader file");
                self.revert_to_builtin()
            }
        }
    }

    /// Checks the watched file if the poll interval has passed. Returns whether a reload
    /// (or a fallback) happened.
    pub fn poll(&mut self, elapsed: Duration) -> bool {
        if elapsed.saturating_sub(self.last_poll) <= self.config.poll_interval {
            return false;
        }
        self.last_poll = elapsed;

        let Some(watched) = self.watched.as_mut() else {
            return false;
        };

        match FileChangeDetector::poll(&watched.path, watched.last_seen) {
            FileStatus::Unchanged => false,
            FileStatus::Modified(ts) => {
                info!("'{}' changed, reloading", watched.path.display());
                watched.last_seen = ts;
                watched.missing = false;
                if let Err(e) = self.reload_watched() {
                    debug!("Poll-triggered reload ended in fallback ({})", e.kind());
                }
                true
            }
            FileStatus::Missing if watched.missing => false,
            FileStatus::Missing => {
                watched.missing = true;
                // Whatever comes back next counts as a change.
                watched.last_seen = Timestamp::NEVER;
                let diagnostic = Diagnostics::ReadFailure {
                    path: watched.path.clone(),
                    reason: "file disappeared".to_string(),
                };
                self.fall_back(diagnostic);
                true
            }
        }
    }

    /// Polls, activates the current program and uploads the frame uniforms.
    ///
    /// Returns the handle of the program the caller should draw with.
    pub fn tick(&mut self, elapsed: Duration, cursor: Vec2) -> ProgramHandle<D> {
        self.poll(elapsed);

        let program = &self.active;
        program.activate();
        program.set_uniform(Uniform::Time, UniformValue::Float(elapsed.as_secs_f32()));
        program.set_uniform(Uniform::Resolution, UniformValue::Vec2(self.resolution));
        program.set_uniform(Uniform::Mouse, UniformValue::Vec2(cursor));
        program.handle()
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = Vec2::new(width as f32, height as f32);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn watched_path(&self) -> Option<&Path> {
        self.watched.as_ref().map(|w| w.path.as_path())
    }

    pub fn active_program(&self) -> &ShaderProgram<D> {
        &self.active
    }

    /// The diagnostic of the most recent failed load, cleared by the next success.
    pub fn last_error(&self) -> Option<&Diagnostics> {
        self.last_error.as_ref()
    }

    /// Short status for the overlay: the state, plus the failure kind while falling back.
    pub fn status(&self) -> String {
        match (&self.state, &self.last_error) {
            (EngineState::ErrorFallbackActive, Some(e)) => format!("{} ({})", self.state, e.kind()),
            _ => self.state.to_string(),
        }
    }

    /// Number of successful user shader activations so far.
    pub fn reload_count(&self) -> u64 {
        self.reload_count
    }

    pub fn resolution(&self) -> Vec2 {
        self.resolution
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn reload_watched(&mut self) -> Result<(), Diagnostics> {
        let Some(path) = self.watched.as_ref().map(|w| w.path.clone()) else {
            return self.revert_to_builtin();
        };

        match self.build_user_program(&path) {
            Ok(program) => {
                self.replace_active(program, EngineState::UserShaderActive);
                self.reload_count += 1;
                self.last_error = None;
                info!("Activated '{}'", path.display());
                Ok(())
            }
            Err(diagnostic) => Err(self.fall_back(diagnostic)),
        }
    }

    fn build_user_program(&self, path: &Path) -> Result<ShaderProgram<D>, Diagnostics> {
        let fragment = ShaderUnit::<D, Fragment>::compile(&self.device, ShaderSource::File(path))?;
        ShaderProgram::link(
            &self.device,
            self.builtins.vertex(),
            StageRef::Owned(fragment),
        )
    }

    fn revert_to_builtin(&mut self) -> Result<(), Diagnostics> {
        let program = self.builtins.default_program(&self.device).inspect_err(|e| {
            error!("Built-in default program failed to link, keeping the current one: {e}")
        })?;
        self.replace_active(program, EngineState::BuiltinActive);
        self.last_error = None;
        Ok(())
    }

    /// Switches to the error shader and records `diagnostic`. Returns it back for reporting.
    fn fall_back(&mut self, diagnostic: Diagnostics) -> Diagnostics {
        warn!("Falling back to the error shader: {diagnostic}");
        match self.builtins.error_program(&self.device) {
            Ok(program) => self.replace_active(program, EngineState::ErrorFallbackActive),
            Err(e) => error!("Built-in error program failed to link, keeping the current one: {e}"),
        }
        self.last_error = Some(diagnostic.clone());
        diagnostic
    }

    /// The new program is already linked; swap it in, then release the old one.
    fn replace_active(&mut self, program: ShaderProgram<D>, state: EngineState) {
        let previous = std::mem::replace(&mut self.active, program);
        debug!(
            "Replacing program {:?} with {:?}",
            previous.handle(),
            self.active.handle()
        );
        drop(previous);

        if self.state != state {
            info!("Shader state: {} -> {}", self.state, state);
        }
        self.state = state;
    }
}

impl<D: GraphicsDevice> fmt::Debug for ReloadEngine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadEngine")
            .field("state", &self.state)
            .field("watched", &self.watched)
            .field("active", &self.active)
            .field("builtins", &self.builtins)
            .field("reload_count", &self.reload_count)
            .finish_non_exhaustive()
    }
}
