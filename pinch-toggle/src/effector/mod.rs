//! Action effectors: what happens when the pinch fires.
//!
//! Provides:
//! - `LogEffector`: dry run, logs each fire
//! - `CommandEffector`: runs an external key-injection command
//! - `KeyboardEffector`: native key click (gated behind `keyboard` feature)

pub mod command;

#[cfg(feature = "keyboard")]
pub mod keyboard;

#[cfg(not(feature = "keyboard"))]
pub mod stub;

#[cfg(feature = "keyboard")]
pub use keyboard::KeyboardEffector;

#[cfg(not(feature = "keyboard"))]
pub use stub::KeyboardEffector;

pub use command::CommandEffector;

use tracing::info;

/// Executes the discrete action.
///
/// `fire` is infallible from the caller's point of view: backends log
/// their own failures and count them.
pub trait ActionEffector {
    /// Short backend name for logging.
    fn name(&self) -> &'static str;

    /// Perform the action once, synchronously.
    fn fire(&mut self);

    /// Number of fires the backend could not carry out.
    fn failures(&self) -> u64 {
        0
    }
}

// ── Key names ──────────────────────────────────────────────

/// The key an effector presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpec {
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Char(char),
}

impl KeySpec {
    /// Parse a key name: a named key or a single character.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "space" | "spc" => Some(Self::Space),
            "enter" | "return" | "ret" => Some(Self::Enter),
            "tab" => Some(Self::Tab),
            "escape" | "esc" => Some(Self::Escape),
            "backspace" => Some(Self::Backspace),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() && !c.is_control() => {
                        Some(Self::Char(c))
                    }
                    _ => None,
                }
            }
        }
    }

    /// Keysym name understood by X11 key injection tools.
    pub fn keysym_name(&self) -> String {
        match self {
            Self::Space => "space".to_string(),
            Self::Enter => "Return".to_string(),
            Self::Tab => "Tab".to_string(),
            Self::Escape => "Escape".to_string(),
            Self::Backspace => "BackSpace".to_string(),
            Self::Char(c) => c.to_string(),
        }
    }
}

impl std::str::FromStr for KeySpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("unknown key {s:?}: use space, enter, tab, escape, backspace, or a single character")
        })
    }
}

// ── Dry run ────────────────────────────────────────────────

/// Logs instead of pressing anything.
pub struct LogEffector {
    key: KeySpec,
    fired: u64,
}

impl LogEffector {
    pub fn new(key: KeySpec) -> Self {
        Self { key, fired: 0 }
    }
}

impl ActionEffector for LogEffector {
    fn name(&self) -> &'static str {
        "log"
    }

    fn fire(&mut self) {
        self.fired += 1;
        info!("Pinch #{}: would press {}", self.fired, self.key.keysym_name());
    }
}

// ── Selection ──────────────────────────────────────────────

/// Effector backend selector.
#[derive(Debug, Clone)]
pub enum EffectorType {
    Log,
    Command(Vec<String>),
    Keyboard,
}

/// Build the selected effector.
pub fn open(effector: EffectorType, key: KeySpec) -> anyhow::Result<Box<dyn ActionEffector>> {
    match effector {
        EffectorType::Log => Ok(Box::new(LogEffector::new(key))),
        EffectorType::Command(argv) => {
            let argv = if argv.is_empty() {
                CommandEffector::default_argv(key)
            } else {
                argv
            };
            Ok(Box::new(CommandEffector::new(argv)?))
        }
        EffectorType::Keyboard => Ok(Box::new(KeyboardEffector::new(key)?)),
    }
}
