//! Core traits that decouple madawm from any specific display server or
//! process-spawning mechanism.
//!
//! Every concrete backend (X11, a test harness, …) implements one of these
//! traits.  The [`Manager`](crate::manager::Manager) only depends on these
//! abstractions.

use crate::event::{
    ConfigureRequest, Event, KeyChord, Protocol, Protocols, Rect, Serial, WindowClass, WindowHandle,
};

/// Abstraction over a display-server connection.
///
/// Requests are fire-and-forget; an implementation may buffer them until
/// [`flush`](Display::flush).  Besides [`next_event`](Display::next_event),
/// only the two property reads ([`window_class`](Display::window_class)
/// and [`window_protocols`](Display::window_protocols)) wait for the
/// server, and the manager issues those only when a window is mapped or
/// its `WM_PROTOCOLS` changes.
pub trait Display {
    /// The error type produced by this display.
    type Error: std::error::Error + Send + 'static;

    /// Width and height of the (single) screen in pixels.
    fn screen_size(&self) -> (u32, u32);

    /// Block until the next event arrives.
    fn next_event(&self) -> Result<Event, Self::Error>;

    /// Grab every chord on the root window so presses reach the manager
    /// instead of the focused client.
    fn grab_keys(&self, chords: &[KeyChord]) -> Result<(), Self::Error>;

    /// Read `WM_CLASS`.  `Ok(None)` when the window has none.
    fn window_class(&self, window: WindowHandle) -> Result<Option<WindowClass>, Self::Error>;

    /// Read `WM_PROTOCOLS`.  A window without the property supports none.
    fn window_protocols(&self, window: WindowHandle) -> Result<Protocols, Self::Error>;

    /// Start managing `window`: subscribe to the events the manager needs
    /// from it and apply the manager's border width.
    fn manage(&self, window: WindowHandle, border_width: u32) -> Result<(), Self::Error>;

    /// Move and resize `window`.
    fn place(&self, window: WindowHandle, rect: Rect) -> Result<(), Self::Error>;

    fn map(&self, window: WindowHandle) -> Result<(), Self::Error>;

    /// Unmap `window`.  Returns the serial the resulting
    /// [`Event::UnmapNotify`] will carry.
    fn unmap(&self, window: WindowHandle) -> Result<Serial, Self::Error>;

    fn set_border_color(&self, window: WindowHandle, pixel: u32) -> Result<(), Self::Error>;

    /// Give input focus to `window`, or to the root window for `None`.
    fn set_input_focus(&self, window: Option<WindowHandle>) -> Result<(), Self::Error>;

    /// Raise `window` above its siblings.
    fn raise(&self, window: WindowHandle) -> Result<(), Self::Error>;

    /// Send a `WM_PROTOCOLS` client message for `protocol` to `window`.
    fn send_protocol(&self, window: WindowHandle, protocol: Protocol) -> Result<(), Self::Error>;

    /// Forcibly terminate the client owning `window`.
    fn kill_client(&self, window: WindowHandle) -> Result<(), Self::Error>;

    /// Apply a client's configure request, overriding its border width
    /// with `border_width`.
    fn grant_configure(&self, request: &ConfigureRequest, border_width: u32) -> Result<(), Self::Error>;

    /// Push buffered requests to the server.
    fn flush(&self) -> Result<(), Self::Error>;
}

/// Starts external programs.
///
/// # Contract
///
/// * [`spawn`](Launcher::spawn) returns immediately; the caller never
///   waits for the child.
/// * Failures are the launcher's business (log them); nothing is reported
///   back to the manager.
pub trait Launcher {
    /// Run `command` through the shell, detached from the manager.
    fn spawn(&self, command: &str);
}

//  Test doubles
