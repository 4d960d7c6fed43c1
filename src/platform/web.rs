//! Browser host (wasm32)
//!
//! Exposes the game to JavaScript. The page drives `frame` from its
//! `requestAnimationFrame` loop and draws the returned JSON snapshot; menus
//! and buttons call the control methods.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::audio::{AudioEngine, WebAudioGraph};
use crate::game::Game;
use crate::persistence::{KeyValueStore, LocalStorageStore, MemoryStore, StorageError};
use crate::platform::input::{Key, KeyState};
use crate::settings::Settings;

/// LocalStorage when the browser allows it, memory otherwise
enum BrowserStore {
    Local(LocalStorageStore),
    Memory(MemoryStore),
}

impl BrowserStore {
    fn open() -> Self {
        match LocalStorageStore::open() {
            Ok(store) => BrowserStore::Local(store),
            Err(e) => {
                log::warn!("{} - scores will not persist", e);
                BrowserStore::Memory(MemoryStore::new())
            }
        }
    }
}

impl KeyValueStore for BrowserStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            BrowserStore::Local(s) => s.read(key),
            BrowserStore::Memory(s) => s.read(key),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            BrowserStore::Local(s) => s.write(key, value),
            BrowserStore::Memory(s) => s.write(key, value),
        }
    }
}

struct Inner {
    game: Game<WebAudioGraph, BrowserStore>,
    keys: KeyState,
}

/// Game handle for the page
#[wasm_bindgen]
pub struct WebGame {
    inner: Rc<RefCell<Inner>>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        let store = BrowserStore::open();
        let settings = Settings::load(&store);

        let mut audio = AudioEngine::new(&settings);
        match WebAudioGraph::new() {
            Ok(graph) => {
                // init logs its own failure
                let _ = audio.init(graph);
            }
            Err(e) => log::warn!("Audio disabled: {}", e),
        }

        let seed = js_sys::Date::now() as u64;
        log::info!("Vapor Jump ready ({})", settings.variant.as_str());
        WebGame {
            inner: Rc::new(RefCell::new(Inner {
                game: Game::new(settings, audio, store, seed),
                keys: KeyState::new(),
            })),
        }
    }

    pub fn start(&self) {
        self.inner.borrow_mut().game.start();
    }

    pub fn restart(&self) {
        self.inner.borrow_mut().game.restart();
    }

    pub fn menu(&self) {
        self.inner.borrow_mut().game.return_to_menu();
    }

    /// Returns the new mute state
    pub fn toggle_mute(&self) -> bool {
        self.inner.borrow_mut().game.toggle_mute()
    }

    #[wasm_bindgen(getter)]
    pub fn high_score(&self) -> f64 {
        self.inner.borrow().game.high_score() as f64
    }

    /// Feed a `KeyboardEvent.key`; true if the game uses that key
    pub fn key_down(&self, key: &str) -> bool {
        set_key(&self.inner, key, true)
    }

    pub fn key_up(&self, key: &str) -> bool {
        set_key(&self.inner, key, false)
    }

    /// Release every key (window blur)
    pub fn release_keys(&self) {
        self.inner.borrow_mut().keys.clear();
    }

    /// Step once and return the snapshot as JSON
    pub fn frame(&self, time: f64) -> String {
        let mut inner = self.inner.borrow_mut();
        let Inner { game, keys } = &mut *inner;
        game.frame(&*keys, time);
        match serde_json::to_string(&game.snapshot()) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize snapshot: {}", e);
                String::from("null")
            }
        }
    }

    /// Listen for arrow/WASD keys on the window
    pub fn attach_keyboard(&self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        {
            let inner = self.inner.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if set_key(&inner, &event.key(), true) {
                    event.prevent_default();
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let inner = self.inner.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                set_key(&inner, &event.key(), false);
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let inner = self.inner.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                inner.borrow_mut().keys.clear();
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}

fn set_key(inner: &Rc<RefCell<Inner>>, name: &str, pressed: bool) -> bool {
    match Key::from_dom_key(name) {
        Some(key) => {
            inner.borrow_mut().keys.set(key, pressed);
            true
        }
        None => false,
    }
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already set: {}", e).into());
    }
    log::info!("Vapor Jump starting...");
}
