//! Key-event to intent translation.
//!
//! The session core doesn't know about keyboards; a frontend feeds raw
//! key transitions into one of these trackers and forwards the intents
//! it emits. Both trackers suppress no-op transitions (key autorepeat),
//! so an intent is only produced when the published state would actually
//! change.

use facet_geometry::GridDir;
use facet_model::{PlayerIntent, TankControls};

/// A control key for the tank variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveKey {
    Forward,
    Backward,
    Left,
    Right,
    Fire,
}

/// Held-key tracker for the tank variant.
///
/// Movement keys map to held flags; the fire key increments a
/// monotonically increasing counter on each press transition. Key
/// autorepeat never fires twice: only a release followed by a fresh
/// press counts.
#[derive(Debug, Default)]
pub struct DriveInput {
    controls: TankControls,
    fire_held: bool,
    fire_count: u64,
}

impl DriveInput {
    /// Records a key press. Returns the intent to publish, or `None`
    /// when nothing changed (autorepeat of an already-held key).
    pub fn key_down(&mut self, key: DriveKey) -> Option<PlayerIntent> {
        let changed = match key {
            DriveKey::Forward => !std::mem::replace(&mut self.controls.forward, true),
            DriveKey::Backward => !std::mem::replace(&mut self.controls.backward, true),
            DriveKey::Left => !std::mem::replace(&mut self.controls.left, true),
            DriveKey::Right => !std::mem::replace(&mut self.controls.right, true),
            DriveKey::Fire => {
                let fresh = !std::mem::replace(&mut self.fire_held, true);
                if fresh {
                    self.fire_count += 1;
                }
                fresh
            }
        };
        changed.then(|| self.intent())
    }

    /// Records a key release. A fire release publishes nothing — the
    /// counter already went out on the press.
    pub fn key_up(&mut self, key: DriveKey) -> Option<PlayerIntent> {
        let changed = match key {
            DriveKey::Forward => std::mem::replace(&mut self.controls.forward, false),
            DriveKey::Backward => std::mem::replace(&mut self.controls.backward, false),
            DriveKey::Left => std::mem::replace(&mut self.controls.left, false),
            DriveKey::Right => std::mem::replace(&mut self.controls.right, false),
            DriveKey::Fire => {
                self.fire_held = false;
                false
            }
        };
        changed.then(|| self.intent())
    }

    /// The current publishable intent.
    pub fn intent(&self) -> PlayerIntent {
        PlayerIntent::Drive {
            controls: self.controls,
            fire_count: self.fire_count,
        }
    }
}

/// Direction tracker for the snake variant. Only presses matter;
/// releasing an arrow key changes nothing.
#[derive(Debug, Default)]
pub struct SteerInput {
    current: Option<GridDir>,
}

impl SteerInput {
    /// Records an arrow press. Returns the intent to publish, or `None`
    /// when the direction is already the published one. Reversals are
    /// published as-is; the host drops them.
    pub fn key_down(&mut self, dir: GridDir) -> Option<PlayerIntent> {
        if self.current == Some(dir) {
            return None;
        }
        self.current = Some(dir);
        Some(PlayerIntent::Steer { dir })
    }
}

// =========================================================================
// Tests
// =========================================================================
