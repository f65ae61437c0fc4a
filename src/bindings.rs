//! The static key-binding table.

use crate::event::{Action, KeyChord, Modifiers, PrimaryModifier};

/// X keysyms for the keys madawm binds.
pub mod keysym {
    pub const RETURN: u32 = 0xff0d;
    pub const B: u32 = 0x0062;
    pub const C: u32 = 0x0063;
    pub const H: u32 = 0x0068;
    pub const L: u32 = 0x006c;
    pub const Q: u32 = 0x0071;
    /// `1`; digits `1..=9` are contiguous.
    pub const DIGIT_1: u32 = 0x0031;
}

/// Workspaces past the ninth get no key.
pub const MAX_BOUND_WORKSPACES: usize = 9;

/// Chord → action lookup table.
#[derive(Debug, Clone)]
pub struct Bindings {
    table: Vec<(KeyChord, Action)>,
}

impl Bindings {
    /// Build the default table for `modifier` and `workspaces` workspaces.
    pub fn new(modifier: PrimaryModifier, workspaces: usize) -> Self {
        let m = modifier.mask();
        let ms = m | Modifiers::SHIFT;
        let mut table = vec![
            (KeyChord::new(m, keysym::RETURN), Action::SpawnTerminal),
            (KeyChord::new(m, keysym::B), Action::SpawnBrowser),
            (KeyChord::new(m, keysym::H), Action::FocusPrev),
            (KeyChord::new(m, keysym::L), Action::FocusNext),
            (KeyChord::new(ms, keysym::C), Action::CloseFocused),
            (KeyChord::new(ms, keysym::Q), Action::Quit),
        ];
        for ws in 0..workspaces.min(MAX_BOUND_WORKSPACES) {
            table.push((
                KeyChord::new(m, keysym::DIGIT_1 + ws as u32),
                Action::SwitchWorkspace(ws),
            ));
        }
        Self { table }
    }

    /// The action bound to `chord`, if any.  Lock and NumLock are ignored.
    pub fn lookup(&self, chord: KeyChord) -> Option<Action> {
        let chord = KeyChord::new(chord.modifiers, chord.keysym);
        self.table
            .iter()
            .find(|(c, _)| *c == chord)
            .map(|(_, a)| *a)
    }

    /// Every bound chord, for grabbing.
    pub fn chords(&self) -> Vec<KeyChord> {
        self.table.iter().map(|(c, _)| *c).collect()
    }
}
