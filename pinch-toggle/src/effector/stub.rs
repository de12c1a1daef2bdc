//! Keyboard stub, used when the `keyboard` feature is not enabled.
//!
//! Keeps `--effector keyboard` accepted on builds without native input
//! support; every fire is logged instead of injected.

use tracing::{info, warn};

use super::{ActionEffector, KeySpec};

/// Stub keyboard effector when native injection is not compiled in.
pub struct KeyboardEffector {
    key: KeySpec,
}

impl KeyboardEffector {
    pub fn new(key: KeySpec) -> anyhow::Result<Self> {
        warn!("Native keyboard injection disabled (compiled without 'keyboard' feature), logging only");
        Ok(Self { key })
    }
}

impl ActionEffector for KeyboardEffector {
    fn name(&self) -> &'static str {
        "keyboard-stub"
    }

    fn fire(&mut self) {
        info!("Pinch: {} (keyboard stub)", self.key.keysym_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_fires_without_failures() {
        let mut effector = KeyboardEffector::new(KeySpec::Space).unwrap();
        effector.fire();
        assert_eq!(effector.failures(), 0);
        assert_eq!(effector.name(), "keyboard-stub");
    }
}
