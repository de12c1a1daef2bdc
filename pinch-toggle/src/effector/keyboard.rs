//! Native key injection through `enigo`.
//!
//! Clicks (press + release) the configured key on the focused window,
//! using the platform's input API (XTest/libei on Linux, CGEvent on macOS,
//! SendInput on Windows).

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use tracing::{info, warn};

use super::{ActionEffector, KeySpec};

pub struct KeyboardEffector {
    enigo: Enigo,
    key: KeySpec,
    failures: u64,
}

impl KeyboardEffector {
    pub fn new(key: KeySpec) -> anyhow::Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow::anyhow!("keyboard injection unavailable: {:?}", e))?;
        info!("Native keyboard effector ready ({})", key.keysym_name());
        Ok(Self {
            enigo,
            key,
            failures: 0,
        })
    }
}

fn to_enigo(key: KeySpec) -> Key {
    match key {
        KeySpec::Space => Key::Space,
        KeySpec::Enter => Key::Return,
        KeySpec::Tab => Key::Tab,
        KeySpec::Escape => Key::Escape,
        KeySpec::Backspace => Key::Backspace,
        KeySpec::Char(c) => Key::Unicode(c),
    }
}

impl ActionEffector for KeyboardEffector {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn fire(&mut self) {
        if let Err(e) = self.enigo.key(to_enigo(self.key), Direction::Click) {
            self.failures += 1;
            warn!("Key click failed: {:?}", e);
        }
    }

    fn failures(&self) -> u64 {
        self.failures
    }
}
