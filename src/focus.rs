//! Input focus and the border-color focus indicator.
//!
//! [`Focus`] holds the single piece of focus state (which client, if any,
//! has focus) and performs the protocol requests that go with changing
//! it.  Cycling never touches the layout.

use crate::event::{Protocol, WindowHandle, WorkspaceIndex};
use crate::registry::Registry;
use crate::traits::Display;
use log::{debug, info};

/// Border pixels for focused and unfocused clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderColors {
    pub focused: u32,
    pub unfocused: u32,
}

/// Pick the neighbour of `current` in `order`, wrapping around.
///
/// With no current focus (or one that is not in `order`) moving forward
/// selects the first entry and moving backward the last.
pub fn cycle(order: &[WindowHandle], current: Option<WindowHandle>, forward: bool) -> Option<WindowHandle> {
    if order.is_empty() {
        return None;
    }
    let len = order.len();
    let pos = current.and_then(|c| order.iter().position(|h| *h == c));
    let next = match (pos, forward) {
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
        (None, true) => 0,
        (None, false) => len - 1,
    };
    Some(order[next])
}

/// Focus state machine.
#[derive(Debug, Clone)]
pub struct Focus {
    current: Option<WindowHandle>,
    colors: BorderColors,
}

impl Focus {
    pub fn new(colors: BorderColors) -> Self {
        Self {
            current: None,
            colors,
        }
    }

    /// The focused client, if any.
    pub fn current(&self) -> Option<WindowHandle> {
        self.current
    }

    /// Drop `window` from the focus state without talking to the server.
    ///
    /// Used when the window is already gone.
    pub fn forget(&mut self, window: WindowHandle) {
        if self.current == Some(window) {
            debug!("focused window 0x{:x} went away", window);
            self.current = None;
        }
    }

    /// Focus `target`, or the root window for `None`.
    ///
    /// A target the registry does not know is treated as `None`.
    pub fn set<D: Display>(
        &mut self,
        display: &D,
        registry: &Registry,
        target: Option<WindowHandle>,
    ) -> Result<(), D::Error> {
        let client = target.and_then(|w| registry.find(w));
        let Some(client) = client else {
            debug!("focus → root");
            self.current = None;
            return display.set_input_focus(None);
        };

        for other in registry.clients_in(client.workspace) {
            if other.handle != client.handle {
                display.set_border_color(other.handle, self.colors.unfocused)?;
            }
        }
        display.set_border_color(client.handle, self.colors.focused)?;
        display.set_input_focus(Some(client.handle))?;
        display.raise(client.handle)?;

        if client.protocols.supports(Protocol::TakeFocus) {
            display.send_protocol(client.handle, Protocol::TakeFocus)?;
        }

        if self.current != Some(client.handle) {
            debug!("focus → 0x{:x}", client.handle);
        }
        self.current = Some(client.handle);
        Ok(())
    }

    /// Move focus to the next client of `workspace`, wrapping around.
    pub fn focus_next<D: Display>(
        &mut self,
        display: &D,
        registry: &Registry,
        workspace: WorkspaceIndex,
    ) -> Result<(), D::Error> {
        self.step(display, registry, workspace, true)
    }

    /// Move focus to the previous client of `workspace`, wrapping around.
    pub fn focus_prev<D: Display>(
        &mut self,
        display: &D,
        registry: &Registry,
        workspace: WorkspaceIndex,
    ) -> Result<(), D::Error> {
        self.step(display, registry, workspace, false)
    }

    fn step<D: Display>(
        &mut self,
        display: &D,
        registry: &Registry,
        workspace: WorkspaceIndex,
        forward: bool,
    ) -> Result<(), D::Error> {
        let order = registry.handles_in(workspace);
        match cycle(&order, self.current, forward) {
            Some(target) => self.set(display, registry, Some(target)),
            None => Ok(()),
        }
    }

    /// Close the focused client.
    ///
    /// Clients that advertised `WM_DELETE_WINDOW` are asked to close
    /// themselves; everything else is killed.  Focus state is left alone:
    /// the client's unmap/destroy notification clears it.
    pub fn close_focused<D: Display>(&self, display: &D, registry: &Registry) -> Result<(), D::Error> {
        let Some(window) = self.current else {
            debug!("close: nothing focused");
            return Ok(());
        };
        let polite = registry
            .find(window)
            .is_some_and(|c| c.protocols.supports(Protocol::DeleteWindow));
        if polite {
            info!("asking 0x{:x} to close", window);
            display.send_protocol(window, Protocol::DeleteWindow)
        } else {
            info!("killing 0x{:x} (no {})", window, Protocol::DeleteWindow);
            display.kill_client(window)
        }
    }
}
