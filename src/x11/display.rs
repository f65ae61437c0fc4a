//! [`Display`] implementation backed by an X11 connection.
//!
//! Talks to the X server through `x11rb`'s pure-Rust connection.  Requests
//! are buffered by the connection and pushed out on [`Display::flush`];
//! only the two property reads (`WM_CLASS`, `WM_PROTOCOLS`) wait for a
//! reply.

use super::keys::{Keymap, LOCK_VARIANTS};
use crate::event::{
    ConfigureRequest, Event, KeyChord, Modifiers, Protocol, Protocols, Rect, Serial, StackMode,
    WindowClass, WindowHandle,
};
use crate::traits::Display;
use log::{debug, info, warn};
use std::cell::RefCell;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::properties::WmClass;
use x11rb::protocol::xproto::{
    self, AtomEnum, ChangeWindowAttributesAux, ClientMessageData, ClientMessageEvent,
    ConfigWindow, ConfigureRequestEvent, ConfigureWindowAux, ConnectionExt as _, EventMask,
    GrabMode, InputFocus, MapState, Mapping, ModMask, NotifyDetail, NotifyMode,
    CLIENT_MESSAGE_EVENT,
};
use x11rb::protocol::Event as XEvent;
use x11rb::rust_connection::RustConnection;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        WM_TAKE_FOCUS,
    }
}

/// Set in the response type of events a client sent with `SendEvent`.
const SENT_EVENT: u8 = 0x80;

/// `AnyKey` for `UngrabKey`.
const ANY_KEY: u8 = 0;

/// Errors that can occur when talking to the X server.
#[derive(Debug, thiserror::Error)]
pub enum X11Error {
    #[error("cannot connect to X server: {0}")]
    Connect(#[from] ConnectError),
    #[error("X connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("another window manager is already running")]
    AnotherWmRunning,
}

/// X11-backed display.
pub struct X11Display {
    conn: RustConnection,
    root: xproto::Window,
    width: u16,
    height: u16,
    atoms: Atoms,
    keymap: RefCell<Keymap>,
    /// Chords to (re-)grab after a keyboard mapping change.
    grabbed: RefCell<Vec<KeyChord>>,
}

impl X11Display {
    /// Connect to `$DISPLAY` and take over window management on its
    /// default screen.
    ///
    /// Fails with [`X11Error::AnotherWmRunning`] if some other client
    /// already redirects the root window's substructure.
    pub fn connect() -> Result<Self, X11Error> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let (width, height) = (screen.width_in_pixels, screen.height_in_pixels);
        info!(
            "connected to X11, screen {}, root 0x{:x}, {}x{}",
            screen_num, root, width, height
        );

        let atoms = Atoms::new(&conn)?.reply()?;
        let keymap = fetch_keymap(&conn)?;

        let display = Self {
            conn,
            root,
            width,
            height,
            atoms,
            keymap: RefCell::new(keymap),
            grabbed: RefCell::new(Vec::new()),
        };
        display.become_wm()?;
        Ok(display)
    }

    /// Ask for the root-window events that make us the window manager.
    fn become_wm(&self) -> Result<(), X11Error> {
        let mask = EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY;
        let cookie = self
            .conn
            .change_window_attributes(self.root, &ChangeWindowAttributesAux::new().event_mask(mask))?;
        match cookie.check() {
            Ok(()) => {
                info!("registered as window manager");
                Ok(())
            }
            Err(ReplyError::X11Error(e)) => {
                debug!("substructure redirect refused: {:?}", e);
                Err(X11Error::AnotherWmRunning)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Top-level windows that were already visible before we started.
    pub fn existing_windows(&self) -> Result<Vec<WindowHandle>, X11Error> {
        let tree = self.conn.query_tree(self.root)?.reply()?;
        let mut windows = Vec::new();
        for &child in &tree.children {
            match self.conn.get_window_attributes(child)?.reply() {
                Ok(attrs) if !attrs.override_redirect && attrs.map_state == MapState::VIEWABLE => {
                    windows.push(child);
                }
                Ok(_) => {}
                Err(e) => debug!("skipping 0x{:x}: {}", child, e),
            }
        }
        debug!("{} existing windows", windows.len());
        Ok(windows)
    }

    fn protocol_atom(&self, protocol: Protocol) -> xproto::Atom {
        match protocol {
            Protocol::DeleteWindow => self.atoms.WM_DELETE_WINDOW,
            Protocol::TakeFocus => self.atoms.WM_TAKE_FOCUS,
        }
    }

    /// Drop every key grab on the root and grab the stored chords again
    /// with the current keymap.
    fn regrab(&self) -> Result<(), X11Error> {
        self.conn.ungrab_key(ANY_KEY, self.root, ModMask::ANY)?;
        let keymap = self.keymap.borrow();
        for chord in self.grabbed.borrow().iter() {
            let Some(keycode) = keymap.keycode(chord.keysym) else {
                warn!("no keycode for keysym 0x{:x}, binding disabled", chord.keysym);
                continue;
            };
            for extra in LOCK_VARIANTS {
                self.conn.grab_key(
                    true,
                    self.root,
                    ModMask::from((chord.modifiers | extra).0),
                    keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?;
            }
        }
        Ok(())
    }

    fn refresh_keymap(&self) -> Result<(), X11Error> {
        info!("keyboard mapping changed, re-grabbing keys");
        *self.keymap.borrow_mut() = fetch_keymap(&self.conn)?;
        self.regrab()?;
        self.conn.flush()?;
        Ok(())
    }

    /// Turn a wire event into the manager's vocabulary.
    fn translate(&self, event: XEvent) -> Result<Event, X11Error> {
        let event = match event {
            XEvent::MapRequest(e) => Event::MapRequest { window: e.window },
            XEvent::UnmapNotify(e) => Event::UnmapNotify {
                window: e.window,
                synthetic: e.response_type & SENT_EVENT != 0,
                serial: e.sequence,
            },
            XEvent::DestroyNotify(e) => Event::DestroyNotify { window: e.window },
            XEvent::ConfigureRequest(e) => Event::ConfigureRequest(configure_request(&e)),
            XEvent::EnterNotify(e)
                if e.mode == NotifyMode::NORMAL && e.detail != NotifyDetail::INFERIOR =>
            {
                Event::EnterNotify { window: e.event }
            }
            XEvent::KeyPress(e) => match self.keymap.borrow().keysym(e.detail) {
                Some(keysym) => Event::KeyPress(KeyChord::new(Modifiers(u16::from(e.state)), keysym)),
                None => Event::Other,
            },
            XEvent::PropertyNotify(e) if e.atom == self.atoms.WM_PROTOCOLS => {
                Event::ProtocolsChanged { window: e.window }
            }
            XEvent::MappingNotify(e) if e.request == Mapping::KEYBOARD => {
                self.refresh_keymap()?;
                Event::Other
            }
            XEvent::Error(e) => {
                debug!("X error: {:?}", e);
                Event::Other
            }
            _ => Event::Other,
        };
        Ok(event)
    }
}

fn fetch_keymap(conn: &RustConnection) -> Result<Keymap, X11Error> {
    let setup = conn.setup();
    let (min, max) = (setup.min_keycode, setup.max_keycode);
    let reply = conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;
    Ok(Keymap::new(min, reply.keysyms_per_keycode, reply.keysyms))
}

fn configure_request(e: &ConfigureRequestEvent) -> ConfigureRequest {
    let mask = u16::from(e.value_mask);
    let has = |flag: ConfigWindow| mask & u16::from(flag) != 0;
    ConfigureRequest {
        window: e.window,
        x: has(ConfigWindow::X).then_some(e.x as i32),
        y: has(ConfigWindow::Y).then_some(e.y as i32),
        width: has(ConfigWindow::WIDTH).then_some(e.width as u32),
        height: has(ConfigWindow::HEIGHT).then_some(e.height as u32),
        border_width: has(ConfigWindow::BORDER_WIDTH).then_some(e.border_width as u32),
        sibling: has(ConfigWindow::SIBLING).then_some(e.sibling),
        stack_mode: has(ConfigWindow::STACK_MODE).then(|| stack_mode_from_x(e.stack_mode)),
    }
}

fn stack_mode_from_x(mode: xproto::StackMode) -> StackMode {
    if mode == xproto::StackMode::ABOVE {
        StackMode::Above
    } else if mode == xproto::StackMode::BELOW {
        StackMode::Below
    } else if mode == xproto::StackMode::TOP_IF {
        StackMode::TopIf
    } else if mode == xproto::StackMode::BOTTOM_IF {
        StackMode::BottomIf
    } else {
        StackMode::Opposite
    }
}

fn stack_mode_to_x(mode: StackMode) -> xproto::StackMode {
    match mode {
        StackMode::Above => xproto::StackMode::ABOVE,
        StackMode::Below => xproto::StackMode::BELOW,
        StackMode::TopIf => xproto::StackMode::TOP_IF,
        StackMode::BottomIf => xproto::StackMode::BOTTOM_IF,
        StackMode::Opposite => xproto::StackMode::OPPOSITE,
    }
}

/// `WM_CLASS` parts are NUL-terminated Latin-1; an empty part means absent.
fn class_part(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(bytes).into_owned())
    }
}

//  Display implementation

impl Display for X11Display {
    type Error = X11Error;

    fn screen_size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    fn next_event(&self) -> Result<Event, Self::Error> {
        let event = self.conn.wait_for_event()?;
        self.translate(event)
    }

    fn grab_keys(&self, chords: &[KeyChord]) -> Result<(), Self::Error> {
        *self.grabbed.borrow_mut() = chords.to_vec();
        self.regrab()
    }

    fn window_class(&self, window: WindowHandle) -> Result<Option<WindowClass>, Self::Error> {
        match WmClass::get(&self.conn, window)?.reply() {
            Ok(Some(wm_class)) => Ok(Some(WindowClass {
                instance: class_part(wm_class.instance()),
                class: class_part(wm_class.class()),
            })),
            Ok(None) => Ok(None),
            Err(ReplyError::X11Error(e)) => {
                debug!("WM_CLASS of 0x{:x} unavailable: {:?}", window, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn window_protocols(&self, window: WindowHandle) -> Result<Protocols, Self::Error> {
        let reply = match self
            .conn
            .get_property(false, window, self.atoms.WM_PROTOCOLS, AtomEnum::ATOM, 0, 32)?
            .reply()
        {
            Ok(reply) => reply,
            Err(ReplyError::X11Error(e)) => {
                debug!("WM_PROTOCOLS of 0x{:x} unavailable: {:?}", window, e);
                return Ok(Protocols::default());
            }
            Err(e) => return Err(e.into()),
        };
        let Some(atoms) = reply.value32() else {
            return Ok(Protocols::default());
        };
        let advertised: Vec<xproto::Atom> = atoms.collect();
        Ok([Protocol::DeleteWindow, Protocol::TakeFocus]
            .into_iter()
            .filter(|p| advertised.contains(&self.protocol_atom(*p)))
            .collect())
    }

    fn manage(&self, window: WindowHandle, border_width: u32) -> Result<(), Self::Error> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::ENTER_WINDOW | EventMask::PROPERTY_CHANGE),
        )?;
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().border_width(border_width))?;
        Ok(())
    }

    fn place(&self, window: WindowHandle, rect: Rect) -> Result<(), Self::Error> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(rect.x)
                .y(rect.y)
                .width(rect.width)
                .height(rect.height),
        )?;
        Ok(())
    }

    fn map(&self, window: WindowHandle) -> Result<(), Self::Error> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap(&self, window: WindowHandle) -> Result<Serial, Self::Error> {
        let cookie = self.conn.unmap_window(window)?;
        // Events carry only the low 16 bits of the sequence number.
        Ok(cookie.sequence_number() as Serial)
    }

    fn set_border_color(&self, window: WindowHandle, pixel: u32) -> Result<(), Self::Error> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().border_pixel(pixel),
        )?;
        Ok(())
    }

    fn set_input_focus(&self, window: Option<WindowHandle>) -> Result<(), Self::Error> {
        self.conn.set_input_focus(
            InputFocus::POINTER_ROOT,
            window.unwrap_or(self.root),
            x11rb::CURRENT_TIME,
        )?;
        Ok(())
    }

    fn raise(&self, window: WindowHandle) -> Result<(), Self::Error> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(xproto::StackMode::ABOVE),
        )?;
        Ok(())
    }

    fn send_protocol(&self, window: WindowHandle, protocol: Protocol) -> Result<(), Self::Error> {
        let data = ClientMessageData::from([
            self.protocol_atom(protocol),
            x11rb::CURRENT_TIME,
            0u32,
            0u32,
            0u32,
        ]);
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window,
            type_: self.atoms.WM_PROTOCOLS,
            data,
        };
        self.conn
            .send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn kill_client(&self, window: WindowHandle) -> Result<(), Self::Error> {
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn grant_configure(&self, request: &ConfigureRequest, border_width: u32) -> Result<(), Self::Error> {
        let mut aux = ConfigureWindowAux::new().border_width(border_width);
        if let Some(x) = request.x {
            aux = aux.x(x);
        }
        if let Some(y) = request.y {
            aux = aux.y(y);
        }
        if let Some(width) = request.width {
            aux = aux.width(width);
        }
        if let Some(height) = request.height {
            aux = aux.height(height);
        }
        if let Some(sibling) = request.sibling {
            aux = aux.sibling(sibling);
        }
        if let Some(mode) = request.stack_mode {
            aux = aux.stack_mode(stack_mode_to_x(mode));
        }
        self.conn.configure_window(request.window, &aux)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Self::Error> {
        self.conn.flush()?;
        Ok(())
    }
}
