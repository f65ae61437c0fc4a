//! Events, actions and geometry types used throughout madawm.
//!
//! This module defines the vocabulary that all components share:
//! [`Event`] describes every display-server notification the manager
//! reacts to, [`Action`] every thing a key binding can trigger, and
//! [`Rect`] / [`KeyChord`] / [`ConfigureRequest`] provide the supporting
//! data types.
//!
//! Nothing here depends on a concrete protocol library; the X11 backend
//! translates its wire events into these types before the manager sees
//! them.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier of a top-level window, issued by the display server.
pub type WindowHandle = u32;

/// Index of a workspace, `0..workspace_count`.
pub type WorkspaceIndex = usize;

/// Low 16 bits of a request's sequence number, as echoed back in the
/// `sequence` field of the events that request caused.
pub type Serial = u16;

/// An axis-aligned rectangle in root-window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Shrink the rectangle so that a border of `border` pixels drawn
    /// *outside* the window still fits inside `self`.
    ///
    /// X11 borders do not count towards a window's width/height, so a
    /// window occupying this cell must be `2 * border` smaller on each
    /// axis.  The result is never smaller than 1×1.
    pub fn inset(&self, border: u32) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width.saturating_sub(2 * border).max(1),
            height: self.height.saturating_sub(2 * border).max(1),
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

//  Modifiers

/// Keyboard modifier state, using the X11 core-protocol bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(pub u16);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(1 << 0);
    pub const LOCK: Modifiers = Modifiers(1 << 1);
    pub const CONTROL: Modifiers = Modifiers(1 << 2);
    pub const MOD1: Modifiers = Modifiers(1 << 3);
    /// NumLock on virtually every keyboard layout.
    pub const MOD2: Modifiers = Modifiers(1 << 4);
    pub const MOD4: Modifiers = Modifiers(1 << 6);

    /// Only the modifier bits a binding can be made of.  Lock, NumLock
    /// and the pointer-button bits are dropped.
    pub fn clean(self) -> Modifiers {
        Modifiers(self.0 & (Self::SHIFT.0 | Self::CONTROL.0 | Self::MOD1.0 | Self::MOD4.0))
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

/// The primary modifier all bindings are built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrimaryModifier {
    Super,
    Alt,
    Control,
}

impl PrimaryModifier {
    pub fn mask(self) -> Modifiers {
        match self {
            PrimaryModifier::Super => Modifiers::MOD4,
            PrimaryModifier::Alt => Modifiers::MOD1,
            PrimaryModifier::Control => Modifiers::CONTROL,
        }
    }
}

impl Default for PrimaryModifier {
    fn default() -> Self {
        PrimaryModifier::Super
    }
}

/// Parse a modifier name (case-insensitive; accepts "super", "Mod4", "alt", "ctrl", …).
fn parse_modifier(s: &str) -> Option<PrimaryModifier> {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect();
    match normalized.as_str() {
        "super" | "mod4" | "logo" | "win" => Some(PrimaryModifier::Super),
        "alt" | "mod1" | "meta" => Some(PrimaryModifier::Alt),
        "control" | "ctrl" => Some(PrimaryModifier::Control),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for PrimaryModifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_modifier(&s).ok_or_else(|| DeError::custom(format!("invalid modifier: {:?}", s)))
    }
}

/// A key combination: modifier mask plus an X keysym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub modifiers: Modifiers,
    pub keysym: u32,
}

impl KeyChord {
    pub fn new(modifiers: Modifiers, keysym: u32) -> Self {
        Self {
            modifiers: modifiers.clean(),
            keysym,
        }
    }
}

//  Configure requests

/// Stacking mode a client may ask for in a configure request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackMode {
    Above,
    Below,
    TopIf,
    BottomIf,
    Opposite,
}

/// A client asking to move, resize or restack one of its windows.
///
/// Only the fields the client actually set are `Some`.  The requested
/// border width is carried for logging but never honoured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureRequest {
    pub window: WindowHandle,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub border_width: Option<u32>,
    pub sibling: Option<WindowHandle>,
    pub stack_mode: Option<StackMode>,
}

impl ConfigureRequest {
    /// A request that changes nothing; handy as a base for struct update syntax.
    pub fn empty(window: WindowHandle) -> Self {
        Self {
            window,
            x: None,
            y: None,
            width: None,
            height: None,
            border_width: None,
            sibling: None,
            stack_mode: None,
        }
    }
}

//  Events

/// Every display-server notification the manager distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A client wants one of its top-level windows shown.
    MapRequest { window: WindowHandle },

    /// A window was unmapped.
    ///
    /// `synthetic` is set when the notification was sent by a client via
    /// `SendEvent` rather than generated by the server.  `serial` is the
    /// last of our requests the server had processed when it was generated.
    UnmapNotify {
        window: WindowHandle,
        synthetic: bool,
        serial: Serial,
    },

    /// A window was destroyed.
    DestroyNotify { window: WindowHandle },

    /// A client asked to move/resize/restack one of its windows.
    ConfigureRequest(ConfigureRequest),

    /// The pointer entered `window`.
    EnterNotify { window: WindowHandle },

    /// A grabbed key combination was pressed.
    KeyPress(KeyChord),

    /// `WM_PROTOCOLS` of `window` was changed or deleted.
    ProtocolsChanged { window: WindowHandle },

    /// Anything the manager does not act on.
    Other,
}

//  Actions

/// Everything a key binding can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Spawn the terminal command.
    SpawnTerminal,
    /// Spawn the browser command.
    SpawnBrowser,
    /// Show workspace `n` (0-indexed).
    SwitchWorkspace(WorkspaceIndex),
    FocusPrev,
    FocusNext,
    /// Close the focused window, politely if it supports it.
    CloseFocused,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SpawnTerminal => write!(f, "spawn-terminal"),
            Action::SpawnBrowser => write!(f, "spawn-browser"),
            Action::SwitchWorkspace(ws) => write!(f, "workspace {}", ws + 1),
            Action::FocusPrev => write!(f, "focus-prev"),
            Action::FocusNext => write!(f, "focus-next"),
            Action::CloseFocused => write!(f, "close"),
            Action::Quit => write!(f, "quit"),
        }
    }
}

/// ICCCM `WM_PROTOCOLS` a client may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// `WM_DELETE_WINDOW`: the client closes itself when asked.
    DeleteWindow,
    /// `WM_TAKE_FOCUS`: the client wants to be told when it gets focus.
    TakeFocus,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::DeleteWindow => write!(f, "WM_DELETE_WINDOW"),
            Protocol::TakeFocus => write!(f, "WM_TAKE_FOCUS"),
        }
    }
}

/// The subset of [`Protocol`]s a client advertised, read once and cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Protocols {
    pub delete_window: bool,
    pub take_focus: bool,
}

impl Protocols {
    pub fn supports(&self, protocol: Protocol) -> bool {
        match protocol {
            Protocol::DeleteWindow => self.delete_window,
            Protocol::TakeFocus => self.take_focus,
        }
    }
}

impl FromIterator<Protocol> for Protocols {
    fn from_iter<I: IntoIterator<Item = Protocol>>(iter: I) -> Self {
        let mut protocols = Protocols::default();
        for p in iter {
            match p {
                Protocol::DeleteWindow => protocols.delete_window = true,
                Protocol::TakeFocus => protocols.take_focus = true,
            }
        }
        protocols
    }
}

/// `WM_CLASS` of a window: instance name and class name.
///
/// Either part may be missing when the property is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowClass {
    pub instance: Option<String>,
    pub class: Option<String>,
}

impl WindowClass {
    pub fn new(instance: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            instance: Some(instance.into()),
            class: Some(class.into()),
        }
    }
}
