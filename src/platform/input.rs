//! Polled keyboard state
//!
//! The simulation never sees raw events; it asks whether a logical key is
//! currently held.

use serde::{Deserialize, Serialize};

/// Logical direction keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name (arrows or WASD)
    pub fn from_dom_key(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" | "a" | "A" => Some(Key::Left),
            "ArrowRight" | "d" | "D" => Some(Key::Right),
            "ArrowUp" | "w" | "W" => Some(Key::Up),
            "ArrowDown" | "s" | "S" => Some(Key::Down),
            _ => None,
        }
    }
}

/// Anything that can report whether a key is held
pub trait InputState {
    fn is_pressed(&self, key: Key) -> bool;
}

/// Pressed/released flags for each logical key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: Key, pressed: bool) {
        match key {
            Key::Left => self.left = pressed,
            Key::Right => self.right = pressed,
            Key::Up => self.up = pressed,
            Key::Down => self.down = pressed,
        }
    }

    pub fn press(&mut self, key: Key) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: Key) {
        self.set(key, false);
    }

    /// Release everything (focus loss)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl InputState for KeyState {
    fn is_pressed(&self, key: Key) -> bool {
        match key {
            Key::Left => self.left,
            Key::Right => self.right,
            Key::Up => self.up,
            Key::Down => self.down,
        }
    }
}
