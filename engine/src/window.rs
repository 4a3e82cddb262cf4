use glfw::{Context, Glfw, GlfwReceiver, PWindow, WindowEvent};
use glam::Vec2;
use log::*;

use crate::graphics::lowlevel::GlowDevice;

#[derive(Debug)]
pub struct GlfwWindow {
    glfw: Glfw,
    /// The underlying GLFW window.
    pub window: PWindow,
    pub event_receiver: GlfwReceiver<(f64, WindowEvent)>,
}

impl GlfwWindow {
    /// Opens a fixed-size window with a current OpenGL 3.3 core context and vsync on.
    pub fn new(width: u32, height: u32, title: &str) -> anyhow::Result<Self> {
        let mut glfw = glfw::init(handle_glfw_error)
            .map_err(|e| anyhow::anyhow!("Failed to initialize GLFW: {}", e))?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(
            glfw::OpenGlProfileHint::Core,
        ));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Resizable(false));

        let (mut window, event_receiver) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or_else(|| anyhow::anyhow!("Failed to create GLFW window"))?;

        window.make_current();
        glfw.set_swap_interval(glfw::SwapInterval::Sync(1));

        window.set_key_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_close_polling(true);

        debug!("Created {}x{} window '{}'", width, height, title);

        Ok(GlfwWindow {
            glfw,
            window,
            event_receiver,
        })
    }

    /// Loads the GL function pointers for this window's context.
    pub fn create_device(&mut self) -> GlowDevice {
        // SAFETY: the context was made current in `new` and lives as long as the window.
        unsafe { GlowDevice::from_loader(|name| self.window.get_proc_address(name) as *const _) }
    }

    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    pub fn set_should_close(&mut self, value: bool) {
        self.window.set_should_close(value);
    }

    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Drains the events received since the last call.
    pub fn drain_events(&self) -> Vec<WindowEvent> {
        glfw::flush_messages(&self.event_receiver)
            .map(|(_, event)| event)
            .collect()
    }

    pub fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    /// Cursor position in pixels from the top-left corner.
    pub fn cursor_pos(&self) -> Vec2 {
        let (x, y) = self.window.get_cursor_pos();
        Vec2::new(x as f32, y as f32)
    }

    /// Size of the framebuffer in pixels. Differs from the window size on HiDPI displays.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Seconds since GLFW was initialized.
    pub fn time(&self) -> f64 {
        self.glfw.get_time()
    }
}

fn handle_glfw_error(error: glfw::Error, description: String) {
    error!("GLFW error {:?}: {}", error, description);
}
