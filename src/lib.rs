//! `shade`: renders a GLSL fragment shader on a full-screen quad and reloads it on save.

use std::{path::PathBuf, rc::Rc, time::Duration};

use anyhow::Context;

use engine::{
    EngineConfig, EngineState, ReloadEngine,
    debug::{DebugOverlay, DebugProvider, FpsCounter},
    graphics::lowlevel::{GlowDevice, buf::QuadMesh},
    input::Keyboard,
    window::GlfwWindow,
};
use glfw::{Key, Modifiers, WindowEvent};
use log::{info, warn};

pub mod cli;

/// Background colour behind the quad.
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Settings of one previewer run, filled in from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub width: u32,
    pub height: u32,
    pub verbose: bool,
    /// Fragment shader to watch. `None` shows the builtin shader.
    pub shader_path: Option<PathBuf>,
    pub title: String,
    /// Whether the FPS and status readout starts visible. F3 toggles it.
    pub show_fps: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            verbose: false,
            shader_path: None,
            title: "Shade".to_string(),
            show_fps: true,
        }
    }
}

/// The previewer: window, engine and the per-frame loop.
pub struct ShadeApp {
    // Drop order matters: GL objects go before the window that owns the context.
    engine: ReloadEngine<GlowDevice>,
    quad: QuadMesh,
    device: Rc<GlowDevice>,
    keyboard: Keyboard,
    overlay: DebugOverlay,
    state_stat: DebugProvider,
    fps_stat: DebugProvider,
    fps: FpsCounter,
    title: String,
    config: AppConfig,
    window: GlfwWindow,
}

impl ShadeApp {
    /// Opens the window and compiles the builtin shaders.
    pub fn new(config: AppConfig) -> anyhow::Result<ShadeApp> {
        let mut window = GlfwWindow::new(config.width, config.height, &config.title)
            .context("Failed to open the preview window")?;
        let device = Rc::new(window.create_device());

        let (gl_version, glsl_version) = device.version_info();
        info!("OpenGL version: {}", gl_version);
        info!("GLSL version: {}", glsl_version);

        let (width, height) = window.framebuffer_size();
        device.viewport(width, height);

        let engine = ReloadEngine::init(device.clone(), EngineConfig::default(), width, height)
            .context("Failed to initialize the shader engine")?;
        let quad = QuadMesh::new(device.clone()).context("Failed to upload the quad")?;

        let mut overlay = DebugOverlay::new(config.show_fps);
        let state_stat = overlay.add_statistic("shader", engine.status());
        let fps_stat = overlay.add_statistic("fps", "-");
        let fps = FpsCounter::new(window.time());

        Ok(ShadeApp {
            engine,
            quad,
            device,
            keyboard: Keyboard::new(),
            overlay,
            state_stat,
            fps_stat,
            fps,
            title: String::new(),
            config,
            window,
        })
    }

    /// Starts watching `path`. A broken shader is reported but is not an error here.
    pub fn load_fragment_shader(&mut self, path: Option<PathBuf>) {
        if let Err(e) = self.engine.load_shader(path.as_deref()) {
            warn!("{}", e);
        }
    }

    /// Runs until the window is closed.
    pub fn run(&mut self) -> anyhow::Result<()> {
        info!("Entering render loop");
        while !self.window.should_close() {
            self.window.poll_events();
            self.keyboard.update_keys();
            for event in self.window.drain_events() {
                self.handle_event(&event);
            }
            self.handle_shortcuts();
            self.render();
            self.update_overlay();
            self.window.swap_buffers();
        }
        info!("Window closed");
        Ok(())
    }

    fn handle_event(&mut self, event: &WindowEvent) {
        match *event {
            WindowEvent::Close => self.window.set_should_close(true),
            WindowEvent::FramebufferSize(width, height) => {
                let (width, height) = (width.max(0) as u32, height.max(0) as u32);
                self.device.viewport(width, height);
                self.engine.set_resolution(width, height);
            }
            _ => self.keyboard.handle_event(event),
        }
    }

    fn handle_shortcuts(&mut self) {
        if self.keyboard.is_key_pressed(Key::Escape) {
            self.window.set_should_close(true);
        }
        if self.keyboard.is_chord_pressed(Modifiers::Control, Key::R) {
            if let Err(e) = self.engine.request_reload() {
                warn!("{}", e);
            }
        }
        if self.keyboard.is_key_pressed(Key::Backspace) {
            info!("Reverting to the built-in shader");
            self.load_fragment_shader(None);
        }
        if self.keyboard.is_key_pressed(Key::F3) {
            self.overlay.toggle();
        }
    }

    fn render(&mut self) {
        let elapsed = Duration::from_secs_f64(self.window.time().max(0.0));
        let cursor = self.window.cursor_pos();

        self.device.clear(CLEAR_COLOR);
        self.engine.tick(elapsed, cursor);
        self.quad.draw();
    }

    fn update_overlay(&mut self) {
        if let Some(fps) = self.fps.frame(self.window.time()) {
            self.fps_stat.update_value(format!("{fps:.1}"));
        }
        self.state_stat.update_value(self.engine.status());

        let base = match self.engine.watched_path() {
            Some(path) => format!("{} - {}", self.config.title, path.display()),
            None => self.config.title.clone(),
        };
        let title = self.overlay.compose(&base);
        // With the readout hidden, a failure still shows up in the title.
        let failing = self.engine.state() == EngineState::ErrorFallbackActive;
        let title = match self.engine.last_error() {
            Some(e) if failing && !self.overlay.enabled => format!("{title} [{}]", e.kind()),
            _ => title,
        };

        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }
}

/// Opens the previewer for `config` and blocks until the window closes.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting shade");
    let shader_path = config.shader_path.clone();
    let mut app = ShadeApp::new(config)?;
    app.load_fragment_shader(shader_path);
    app.run()
}
