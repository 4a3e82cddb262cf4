//! Status overlay shown in the window title.

use std::{
    cell::RefCell,
    fmt::Debug,
    rc::{Rc, Weak},
};

use log::info;

use crate::ReadOnlyString;

/// Width of the window the frame rate is averaged over, in seconds.
pub const FPS_WINDOW: f64 = 0.5;

pub struct DebugOverlay {
    pub enabled: bool,
    stats: Vec<Weak<DebugStatistic>>,
}

impl Debug for DebugOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugOverlay")
            .field("enabled", &self.enabled)
            .field("stats_count", &self.stats.len())
            .finish()
    }
}

/// A type alias for a reference-counted debug statistic.
pub type DebugProvider = Rc<DebugStatistic>;

impl DebugOverlay {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stats: Vec::new(),
        }
    }

    /// Adds a new debug statistic to be displayed.
    ///
    /// The overlay only keeps a weak reference: dropping the returned provider removes it.
    pub fn add_statistic(
        &mut self,
        label: impl Into<ReadOnlyString>,
        initial_value: impl Into<String>,
    ) -> DebugProvider {
        let stat = Rc::new(DebugStatistic::new(label, initial_value));
        self.stats.push(Rc::downgrade(&stat));
        info!("Added debug statistic: {}", stat.label);
        stat
    }

    /// Builds the window title: `base`, followed by the live statistics when enabled.
    pub fn compose(&mut self, base: &str) -> String {
        self.stats.retain(|stat| stat.strong_count() > 0);
        if !self.enabled {
            return base.to_string();
        }

        let mut title = base.to_string();
        for stat in self.stats.iter().filter_map(Weak::upgrade) {
            title.push_str(&format!(" | {}: {}", stat.label, stat.value.borrow()));
        }
        title
    }

    /// Toggles the overlay on or off.
    pub fn toggle(&mut self) {
        info!(
            "Debug overlay {}",
            if self.enabled { "disabled" } else { "enabled" }
        );
        self.enabled = !self.enabled;
    }
}

/// A structure representing a debug statistic to be displayed.
pub struct DebugStatistic {
    pub label: ReadOnlyString,
    pub value: RefCell<String>,
}

impl Debug for DebugStatistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugStatistic")
            .field("label", &self.label)
            .finish()
    }
}

impl DebugStatistic {
    /// Creates a new debug statistic with the given label and initial value.
    pub fn new(label: impl Into<ReadOnlyString>, initial_value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: RefCell::new(initial_value.into()),
        }
    }

    /// Updates the value of the debug statistic.
    pub fn update_value(&self, new_value: impl ToString) {
        *self.value.borrow_mut() = new_value.to_string();
    }
}

/// Counts frames and reports the average rate once per [`FPS_WINDOW`].
#[derive(Debug, Clone, Copy)]
pub struct FpsCounter {
    window_start: f64,
    frames: u32,
}

impl FpsCounter {
    pub fn new(now: f64) -> Self {
        Self {
            window_start: now,
            frames: 0,
        }
    }

    /// Records a frame at `now` (seconds). Returns the average once a window closes.
    pub fn frame(&mut self, now: f64) -> Option<f64> {
        self.frames += 1;
        let elapsed = now - self.window_start;
        if elapsed < FPS_WINDOW {
            return None;
        }
        let fps = f64::from(self.frames) / elapsed;
        self.window_start = now;
        self.frames = 0;
        Some(fps)
    }
}
