use glfw::{Action, Key, Modifiers, WindowEvent};
use rustc_hash::FxHashMap;

#[derive(Debug)]
pub struct Keyboard {
    states: FxHashMap<Key, KeyState>,
    modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// The key is up. e.g. not pressed.
    Up,
    /// The key was pressed this frame.
    Pressed,
    /// The key was released this frame.
    Released,
    /// The key is being held down.
    /// Specifically, the key was pressed in a previous frame and has not been released yet.
    Held,
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            states: FxHashMap::default(),
            modifiers: Modifiers::empty(),
        }
    }

    pub fn set_key_state(&mut self, key: Key, state: KeyState) {
        self.states.insert(key, state);
    }

    pub fn get_key_state(&self, key: Key) -> Option<KeyState> {
        self.states.get(&key).copied()
    }

    /// Returns true if the key was pressed this frame.
    pub fn is_key_pressed(&self, key: Key) -> bool {
        matches!(self.get_key_state(key), Some(KeyState::Pressed))
    }

    /// Returns true if the key was pressed this frame while `modifiers` were down.
    pub fn is_chord_pressed(&self, modifiers: Modifiers, key: Key) -> bool {
        self.is_key_pressed(key) && self.modifiers.contains(modifiers)
    }

    /// Returns true if the key is currently being held down.
    pub fn is_key_held(&self, key: Key) -> bool {
        matches!(self.get_key_state(key), Some(KeyState::Held))
    }

    pub fn press_key(&mut self, key: Key) {
        self.set_key_state(key, KeyState::Pressed);
    }

    pub fn release_key(&mut self, key: Key) {
        self.set_key_state(key, KeyState::Released);
    }

    /// Feeds a window event. Non-key events are ignored.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::Key(key, _, action, modifiers) = *event {
            self.modifiers = modifiers;
            match action {
                Action::Press => self.press_key(key),
                Action::Release => self.release_key(key),
                Action::Repeat => {}
            }
        }
    }

    /// Advances to the next frame: pressed keys become held, released keys become up.
    pub fn update_keys(&mut self) {
        for state in self.states.values_mut() {
            if *state == KeyState::Pressed {
                *state = KeyState::Held;
            } else if *state == KeyState::Released {
                *state = KeyState::Up;
            }
        }
    }
}
