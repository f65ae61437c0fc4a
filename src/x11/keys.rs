//! Keycode ↔ keysym translation for the core keyboard mapping.
//!
//! The server hands out its mapping as one flat list with
//! `keysyms_per_keycode` entries per keycode, starting at `min_keycode`.
//! [`Keymap`] keeps that table and answers the two questions the backend
//! has: which keysym did this keycode produce (for key presses), and which
//! keycode carries this keysym (for grabbing).

use crate::event::Modifiers;

/// Lock-style modifiers a grab must be repeated for, so bindings still work
/// with CapsLock or NumLock on.
pub const LOCK_VARIANTS: [Modifiers; 4] = [
    Modifiers::NONE,
    Modifiers::LOCK,
    Modifiers::MOD2,
    Modifiers(Modifiers::LOCK.0 | Modifiers::MOD2.0),
];

/// A snapshot of the server's keyboard mapping.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    min_keycode: u8,
    per_keycode: usize,
    keysyms: Vec<u32>,
}

impl Keymap {
    pub fn new(min_keycode: u8, keysyms_per_keycode: u8, keysyms: Vec<u32>) -> Self {
        Self {
            min_keycode,
            per_keycode: keysyms_per_keycode as usize,
            keysyms,
        }
    }

    /// The unshifted keysym of `keycode`.
    ///
    /// Bindings are matched on the first column, so Shift+c still reports
    /// `c` and the Shift bit is carried by the modifiers.
    pub fn keysym(&self, keycode: u8) -> Option<u32> {
        if self.per_keycode == 0 || keycode < self.min_keycode {
            return None;
        }
        let idx = (keycode - self.min_keycode) as usize * self.per_keycode;
        self.keysyms.get(idx).copied().filter(|s| *s != 0)
    }

    /// The lowest keycode producing `keysym` in any column.
    pub fn keycode(&self, keysym: u32) -> Option<u8> {
        if self.per_keycode == 0 || keysym == 0 {
            return None;
        }
        self.keysyms
            .chunks(self.per_keycode)
            .position(|syms| syms.contains(&keysym))
            .and_then(|i| u8::try_from(i + self.min_keycode as usize).ok())
    }
}
