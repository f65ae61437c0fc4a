//! The main orchestrator that ties the registry, layout, focus and key
//! bindings together.
//!
//! [`Manager`] owns all session state and reacts to [`Event`]s by updating
//! that state and issuing calls to the [`Display`] trait.  It is the only
//! place where state changes; everything it calls is either pure
//! ([`classifier`](crate::classifier), [`layout`](crate::layout)) or
//! operates on state the manager lends out for the duration of the call
//! ([`Focus`]).

use crate::bindings::Bindings;
use crate::classifier::{Classification, Classifier};
use crate::config::Config;
use crate::event::{
    Action, ConfigureRequest, Event, KeyChord, Protocols, Serial, WindowHandle, WorkspaceIndex,
};
use crate::focus::Focus;
use crate::layout;
use crate::registry::Registry;
use crate::traits::{Display, Launcher};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// Possible errors from the manager.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// The display backend returned an error.
    #[error("display error: {0}")]
    Display(String),
}

/// Process-wide state that is not owned by a more specific component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The visible workspace.
    pub workspace: WorkspaceIndex,
    /// Number of configured workspaces; valid indices are below this.
    pub workspace_count: usize,
    /// Screen width in pixels, fixed at startup.
    pub screen_width: u32,
    /// Screen height in pixels, fixed at startup.
    pub screen_height: u32,
    /// Border width applied to every managed client.
    pub border_width: u32,
}

/// Commands the spawn bindings run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commands {
    /// Run by the spawn-terminal binding.
    pub terminal: String,
    /// Run by the spawn-browser binding.
    pub browser: String,
}

/// Event dispatcher and owner of all window-management state.
///
/// The manager is generic over any [`Display`] and [`Launcher`], making it
/// independent of X11 and of how processes are started.
///
/// # Typical usage
///
/// ```ignore
/// let display = X11Display::connect()?;
/// let mut manager = Manager::new(display, ShellLauncher::new(), &config, commands);
/// manager.start()?;
/// manager.run()?;
/// ```
pub struct Manager<D: Display, L: Launcher> {
    display: D,
    launcher: L,
    classifier: Classifier,
    bindings: Bindings,
    commands: Commands,
    registry: Registry,
    focus: Focus,
    session: Session,
    /// Clients the manager believes are currently mapped.
    mapped: HashSet<WindowHandle>,
    /// Serials of unmaps the manager itself requested and has not yet seen
    /// the notification for.
    expected_unmaps: HashMap<WindowHandle, Vec<Serial>>,
    running: bool,
}

impl<D: Display, L: Launcher> Manager<D, L> {
    /// Create a manager showing workspace 0.
    pub fn new(display: D, launcher: L, config: &Config, commands: Commands) -> Self {
        let (screen_width, screen_height) = display.screen_size();
        let session = Session {
            workspace: 0,
            workspace_count: config.workspace_count(),
            screen_width,
            screen_height,
            border_width: config.border.width,
        };
        Self {
            display,
            launcher,
            classifier: config.classifier(),
            bindings: Bindings::new(config.modifier, config.workspace_count()),
            commands,
            registry: Registry::new(),
            focus: Focus::new(config.border_colors()),
            session,
            mapped: HashSet::new(),
            expected_unmaps: HashMap::new(),
            running: true,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The focused client, if any.
    pub fn focused(&self) -> Option<WindowHandle> {
        self.focus.current()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Grab the bound keys.  Call once before [`run`](Self::run).
    pub fn start(&mut self) -> Result<(), ManagerError> {
        let chords = self.bindings.chords();
        info!("grabbing {} key bindings", chords.len());
        self.display.grab_keys(&chords).map_err(display_error)?;
        self.display.flush().map_err(display_error)
    }

    /// Take over windows that were already mapped when the manager started.
    ///
    /// Each one goes through the same policy as a fresh map request.
    pub fn adopt(&mut self, windows: &[WindowHandle]) -> Result<(), ManagerError> {
        for &window in windows {
            self.mapped.insert(window);
            if let Err(e) = self.map_request(window) {
                warn!("adopting 0x{:x}: {}", window, e);
            }
        }
        self.display.flush().map_err(display_error)
    }

    /// Process events until a quit binding fires, then tear down.
    ///
    /// Errors from individual handlers are logged and the loop continues;
    /// only a failure to receive the next event ends it early.
    pub fn run(&mut self) -> Result<(), ManagerError> {
        info!("madawm running");
        while self.running {
            let event = self.display.next_event().map_err(display_error)?;
            if let Err(e) = self.handle(event) {
                warn!("event handling failed: {}", e);
            }
        }
        self.shutdown()
    }

    /// Process a single [`Event`].
    pub fn handle(&mut self, event: Event) -> Result<(), ManagerError> {
        let result = match event {
            Event::MapRequest { window } => self.map_request(window),
            Event::UnmapNotify {
                window,
                synthetic,
                serial,
            } => self.unmap_notify(window, synthetic, serial),
            Event::DestroyNotify { window } => self.destroy_notify(window),
            Event::ConfigureRequest(request) => self.configure_request(&request),
            Event::EnterNotify { window } => self.enter_notify(window),
            Event::KeyPress(chord) => self.key_press(chord),
            Event::ProtocolsChanged { window } => self.protocols_changed(window),
            Event::Other => Ok(()),
        };
        result.map_err(display_error)?;
        self.display.flush().map_err(display_error)
    }

    /// Unmap every managed client and give focus back to the root.
    pub fn shutdown(&mut self) -> Result<(), ManagerError> {
        info!("shutting down, releasing {} clients", self.registry.len());
        let handles: Vec<WindowHandle> = self.registry.iter().map(|c| c.handle).collect();
        for handle in handles {
            if self.mapped.remove(&handle) {
                self.display.unmap(handle).map_err(display_error)?;
            }
            self.registry.remove(handle);
        }
        self.expected_unmaps.clear();
        self.focus
            .set(&self.display, &self.registry, None)
            .map_err(display_error)?;
        self.display.flush().map_err(display_error)
    }

    //  Event handlers

    fn map_request(&mut self, window: WindowHandle) -> Result<(), D::Error> {
        if self.registry.contains(window) {
            debug!("map request for managed 0x{:x} ignored", window);
            return Ok(());
        }

        let class = match self.display.window_class(window) {
            Ok(class) => class,
            Err(e) => {
                warn!("reading WM_CLASS of 0x{:x}: {}", window, e);
                None
            }
        };

        match self.classifier.classify(class.as_ref()) {
            Classification::Rejected => {
                info!("rejecting 0x{:x} ({:?})", window, class);
                self.mapped.remove(&window);
                self.display.kill_client(window)
            }
            Classification::Assigned(workspace) => {
                if let Err(e) = self.registry.add(window, workspace) {
                    debug!("{}", e);
                    return Ok(());
                }
                info!(
                    "managing 0x{:x} ({:?}) on workspace {}",
                    window,
                    class,
                    workspace + 1
                );
                let protocols = self.read_protocols(window);
                self.registry.set_protocols(window, protocols);
                self.display.manage(window, self.session.border_width)?;
                if workspace != self.session.workspace {
                    self.switch_workspace(workspace)
                } else {
                    self.arrange()
                }
            }
        }
    }

    fn unmap_notify(&mut self, window: WindowHandle, synthetic: bool, serial: Serial) -> Result<(), D::Error> {
        if synthetic {
            debug!("synthetic unmap of 0x{:x} ignored", window);
            return Ok(());
        }
        // Only the notification carrying our own request's serial is ours.
        // A client withdrawing just before our unmap reached the server
        // reports an older serial, and our unmap then produces no event.
        if let Some(pending) = self.expected_unmaps.get_mut(&window) {
            if let Some(i) = pending.iter().position(|s| *s == serial) {
                pending.remove(i);
                if pending.is_empty() {
                    self.expected_unmaps.remove(&window);
                }
                debug!("unmap of hidden 0x{:x}", window);
                return Ok(());
            }
            debug!("0x{:x} withdrew while being hidden", window);
            self.expected_unmaps.remove(&window);
        }
        self.mapped.remove(&window);
        self.unmanage(window)
    }

    fn destroy_notify(&mut self, window: WindowHandle) -> Result<(), D::Error> {
        self.expected_unmaps.remove(&window);
        self.mapped.remove(&window);
        self.unmanage(window)
    }

    fn unmanage(&mut self, window: WindowHandle) -> Result<(), D::Error> {
        if self.registry.remove(window).is_none() {
            return Ok(());
        }
        info!("unmanaging 0x{:x}", window);
        self.focus.forget(window);
        self.arrange()
    }

    fn protocols_changed(&mut self, window: WindowHandle) -> Result<(), D::Error> {
        if !self.registry.contains(window) {
            return Ok(());
        }
        let protocols = self.read_protocols(window);
        debug!("0x{:x} now advertises {:?}", window, protocols);
        self.registry.set_protocols(window, protocols);
        Ok(())
    }

    /// `WM_PROTOCOLS` of `window`; a failed read counts as none.
    fn read_protocols(&self, window: WindowHandle) -> Protocols {
        self.display.window_protocols(window).unwrap_or_else(|e| {
            warn!("reading WM_PROTOCOLS of 0x{:x}: {}", window, e);
            Protocols::default()
        })
    }

    fn configure_request(&mut self, request: &ConfigureRequest) -> Result<(), D::Error> {
        debug!("configure request {:?}", request);
        self.display
            .grant_configure(request, self.session.border_width)
    }

    fn enter_notify(&mut self, window: WindowHandle) -> Result<(), D::Error> {
        let on_screen = self
            .registry
            .find(window)
            .is_some_and(|c| c.workspace == self.session.workspace);
        if !on_screen || self.focus.current() == Some(window) {
            return Ok(());
        }
        self.focus.set(&self.display, &self.registry, Some(window))
    }

    fn key_press(&mut self, chord: KeyChord) -> Result<(), D::Error> {
        match self.bindings.lookup(chord) {
            Some(action) => self.run_action(action),
            None => {
                debug!("unbound key {:?}", chord);
                Ok(())
            }
        }
    }

    fn run_action(&mut self, action: Action) -> Result<(), D::Error> {
        info!("action: {}", action);
        let workspace = self.session.workspace;
        match action {
            Action::SpawnTerminal => {
                self.launcher.spawn(&self.commands.terminal);
                Ok(())
            }
            Action::SpawnBrowser => {
                self.launcher.spawn(&self.commands.browser);
                Ok(())
            }
            Action::SwitchWorkspace(ws) => self.switch_workspace(ws),
            Action::FocusPrev => self.focus.focus_prev(&self.display, &self.registry, workspace),
            Action::FocusNext => self.focus.focus_next(&self.display, &self.registry, workspace),
            Action::CloseFocused => self.focus.close_focused(&self.display, &self.registry),
            Action::Quit => {
                self.running = false;
                Ok(())
            }
        }
    }

    //  Workspaces and layout

    fn switch_workspace(&mut self, workspace: WorkspaceIndex) -> Result<(), D::Error> {
        if workspace >= self.session.workspace_count {
            warn!(
                "workspace index {} out of range (have {})",
                workspace, self.session.workspace_count
            );
            return Ok(());
        }
        if workspace != self.session.workspace {
            info!(
                "workspace {} → {}",
                self.session.workspace + 1,
                workspace + 1
            );
            self.session.workspace = workspace;
        }
        self.arrange()
    }

    /// Bring the screen in line with the registry: hide other workspaces,
    /// tile the current one and settle focus.
    fn arrange(&mut self) -> Result<(), D::Error> {
        let s = &self.session;
        let layout = layout::arrange(
            &self.registry,
            s.workspace,
            s.screen_width,
            s.screen_height,
            s.border_width,
        );

        for &handle in &layout.hidden {
            if self.mapped.remove(&handle) {
                let serial = self.display.unmap(handle)?;
                self.expected_unmaps.entry(handle).or_default().push(serial);
            }
        }

        for p in &layout.placements {
            self.display.place(p.handle, p.window)?;
            if self.mapped.insert(p.handle) {
                self.display.map(p.handle)?;
            }
        }

        let keep = self
            .focus
            .current()
            .filter(|f| layout.placements.iter().any(|p| p.handle == *f));
        let target = keep.or(layout.focus_candidate());
        self.focus.set(&self.display, &self.registry, target)
    }
}

fn display_error(e: impl std::fmt::Display) -> ManagerError {
    ManagerError::Display(e.to_string())
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::keysym;
    use crate::event::{Modifiers, Protocol, Rect};
    use crate::traits::mock::{Call, RecorderDisplay, RecorderLauncher};

    const A: WindowHandle = 0xa;
    const B: WindowHandle = 0xb;
    const C: WindowHandle = 0xc;
    const WEB: WindowHandle = 0xf1;

    fn make_manager() -> Manager<RecorderDisplay, RecorderLauncher> {
        let config = Config {
            border: crate::config::BorderConfig {
                width: 0,
                ..Default::default()
            },
            ..Config::default()
        };
        let display = RecorderDisplay::new(1200, 800);
        for w in [A, B, C] {
            display.set_class(w, "xterm", "XTerm");
        }
        display.set_class(WEB, "Navigator", "firefox");
        display.set_class(0xbad, "gimp", "Gimp");
        let commands = Commands {
            terminal: "kitty".into(),
            browser: "firefox".into(),
        };
        Manager::new(display, RecorderLauncher::default(), &config, commands)
    }

    fn key(m: &mut Manager<RecorderDisplay, RecorderLauncher>, mods: Modifiers, sym: u32) {
        m.handle(Event::KeyPress(KeyChord::new(Modifiers::MOD4 | mods, sym)))
            .unwrap();
    }

    fn map(m: &mut Manager<RecorderDisplay, RecorderLauncher>, window: WindowHandle) {
        m.handle(Event::MapRequest { window }).unwrap();
    }

    fn placements(calls: &[Call]) -> Vec<(WindowHandle, Rect)> {
        calls
            .iter()
            .filter_map(|c| match c {
                Call::Place(w, r) => Some((*w, *r)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn three_terminals_tile_into_equal_columns() {
        let mut m = make_manager();
        map(&mut m, A);
        map(&mut m, B);
        m.display.take_calls();
        map(&mut m, C);

        let calls = m.display.take_calls();
        assert_eq!(
            placements(&calls),
            vec![
                (A, Rect::new(0, 0, 400, 800)),
                (B, Rect::new(400, 0, 400, 800)),
                (C, Rect::new(800, 0, 400, 800)),
            ]
        );
        assert!(calls.contains(&Call::Manage(C, 0)));
        assert!(calls.contains(&Call::Map(C)));
        assert!(!calls.contains(&Call::Map(A)), "already mapped windows are not remapped");
        assert_eq!(m.focused(), Some(A));
    }

    #[test]
    fn rejected_window_is_killed_and_never_managed() {
        let mut m = make_manager();
        map(&mut m, 0xbad);
        assert_eq!(m.display.take_calls(), vec![Call::Kill(0xbad)]);
        assert!(m.registry().find(0xbad).is_none());
        for ws in 0..3 {
            assert!(m.registry().clients_in(ws).all(|c| c.handle != 0xbad));
        }
    }

    #[test]
    fn window_without_class_is_rejected() {
        let mut m = make_manager();
        map(&mut m, 0x777);
        assert_eq!(m.display.take_calls(), vec![Call::Kill(0x777)]);
        assert!(m.registry().is_empty());
    }

    #[test]
    fn duplicate_map_request_is_ignored() {
        let mut m = make_manager();
        map(&mut m, A);
        m.display.take_calls();
        map(&mut m, A);
        assert!(m.display.take_calls().is_empty());
        assert_eq!(m.registry().len(), 1);
    }

    #[test]
    fn browser_switches_to_its_workspace() {
        let mut m = make_manager();
        map(&mut m, A);
        m.display.take_calls();
        map(&mut m, WEB);

        assert_eq!(m.session().workspace, 1);
        let calls = m.display.take_calls();
        assert!(calls.contains(&Call::Unmap(A)));
        assert!(calls.contains(&Call::Map(WEB)));
        assert_eq!(placements(&calls), vec![(WEB, Rect::new(0, 0, 1200, 800))]);
        assert_eq!(m.focused(), Some(WEB));
    }

    #[test]
    fn workspace_key_hides_old_clients_and_retiles_new() {
        let mut m = make_manager();
        map(&mut m, WEB); // switches to workspace 2
        key(&mut m, Modifiers::NONE, keysym::DIGIT_1);
        map(&mut m, A);
        map(&mut m, B);
        assert_eq!(m.session().workspace, 0);
        m.display.take_calls();

        key(&mut m, Modifiers::NONE, keysym::DIGIT_1 + 1);

        let calls = m.display.take_calls();
        let unmapped: Vec<WindowHandle> = calls
            .iter()
            .filter_map(|c| match c {
                Call::Unmap(w) => Some(*w),
                _ => None,
            })
            .collect();
        assert_eq!(unmapped, vec![A, B]);
        assert!(calls.contains(&Call::Map(WEB)));
        assert_eq!(placements(&calls), vec![(WEB, Rect::new(0, 0, 1200, 800))]);
        assert_eq!(m.focused(), Some(WEB));
    }

    #[test]
    fn own_unmaps_do_not_unmanage() {
        let mut m = make_manager();
        map(&mut m, A);
        key(&mut m, Modifiers::NONE, keysym::DIGIT_1 + 2);
        // The server reports the unmap the manager asked for.
        m.handle(Event::UnmapNotify {
            window: A,
            synthetic: false,
            serial: m.display.unmap_serial(A),
        })
        .unwrap();
        assert!(m.registry().find(A).is_some());
        m.display.take_calls();

        key(&mut m, Modifiers::NONE, keysym::DIGIT_1);
        assert!(m.display.take_calls().contains(&Call::Map(A)));
        assert_eq!(m.focused(), Some(A));
    }

    #[test]
    fn client_withdrawing_while_hidden_is_unmanaged() {
        let mut m = make_manager();
        map(&mut m, A);
        map(&mut m, B);
        key(&mut m, Modifiers::NONE, keysym::DIGIT_1 + 2);
        let ours = m.display.unmap_serial(A);

        // A unmapped itself before our request was processed: the server
        // reports it with an earlier serial and our unmap is a no-op.
        m.handle(Event::UnmapNotify {
            window: A,
            synthetic: false,
            serial: ours.wrapping_sub(1),
        })
        .unwrap();
        assert!(m.registry().find(A).is_none());
        assert!(!m.expected_unmaps.contains_key(&A));

        m.handle(Event::UnmapNotify {
            window: B,
            synthetic: false,
            serial: m.display.unmap_serial(B),
        })
        .unwrap();
        assert!(m.registry().find(B).is_some());
        assert!(m.expected_unmaps.is_empty());

        m.display.take_calls();
        key(&mut m, Modifiers::NONE, keysym::DIGIT_1);
        let calls = m.display.take_calls();
        assert!(!calls.contains(&Call::Map(A)));
        assert_eq!(placements(&calls), vec![(B, Rect::new(0, 0, 1200, 800))]);
    }

    #[test]
    fn unmap_of_sole_client_clears_workspace_and_focus() {
        let mut m = make_manager();
        map(&mut m, A);
        assert_eq!(m.focused(), Some(A));
        m.display.take_calls();

        m.handle(Event::UnmapNotify {
            window: A,
            synthetic: false,
            serial: 0,
        })
        .unwrap();

        assert_eq!(m.registry().clients_in(0).count(), 0);
        assert_eq!(m.focused(), None);
        assert_eq!(m.display.take_calls(), vec![Call::Focus(None)]);
    }

    #[test]
    fn synthetic_unmap_is_ignored() {
        let mut m = make_manager();
        map(&mut m, A);
        m.display.take_calls();
        m.handle(Event::UnmapNotify {
            window: A,
            synthetic: true,
            serial: 0,
        })
        .unwrap();
        assert!(m.registry().find(A).is_some());
        assert!(m.display.take_calls().is_empty());
    }

    #[test]
    fn destroy_removes_and_retiles() {
        let mut m = make_manager();
        map(&mut m, A);
        map(&mut m, B);
        m.display.take_calls();
        m.handle(Event::DestroyNotify { window: A }).unwrap();
        assert!(m.registry().find(A).is_none());
        assert_eq!(
            placements(&m.display.take_calls()),
            vec![(B, Rect::new(0, 0, 1200, 800))]
        );
        assert_eq!(m.focused(), Some(B));
    }

    #[test]
    fn destroy_of_hidden_client_clears_pending_unmap() {
        let mut m = make_manager();
        map(&mut m, A);
        key(&mut m, Modifiers::NONE, keysym::DIGIT_1 + 1);
        m.handle(Event::DestroyNotify { window: A }).unwrap();
        assert!(m.registry().is_empty());
        assert!(m.expected_unmaps.is_empty());
    }

    #[test]
    fn unknown_window_events_are_harmless() {
        let mut m = make_manager();
        m.handle(Event::UnmapNotify {
            window: 0x999,
            synthetic: false,
            serial: 0,
        })
        .unwrap();
        m.handle(Event::DestroyNotify { window: 0x999 }).unwrap();
        m.handle(Event::EnterNotify { window: 0x999 }).unwrap();
        m.handle(Event::Other).unwrap();
        assert!(m.display.take_calls().is_empty());
    }

    #[test]
    fn configure_request_is_granted_with_manager_border() {
        let mut m = make_manager();
        let request = ConfigureRequest {
            width: Some(640),
            height: Some(480),
            border_width: Some(10),
            ..ConfigureRequest::empty(0x42)
        };
        m.handle(Event::ConfigureRequest(request.clone())).unwrap();
        assert_eq!(m.display.take_calls(), vec![Call::Grant(request, 0)]);
    }

    #[test]
    fn pointer_enter_focuses_window() {
        let mut m = make_manager();
        map(&mut m, A);
        map(&mut m, B);
        assert_eq!(m.focused(), Some(A));
        m.handle(Event::EnterNotify { window: B }).unwrap();
        assert_eq!(m.focused(), Some(B));
    }

    #[test]
    fn pointer_enter_on_hidden_workspace_is_ignored() {
        let mut m = make_manager();
        map(&mut m, A);
        map(&mut m, WEB);
        assert_eq!(m.focused(), Some(WEB));
        m.display.take_calls();

        m.handle(Event::EnterNotify { window: A }).unwrap();
        assert_eq!(m.focused(), Some(WEB));
        assert!(m.display.take_calls().is_empty());
    }

    #[test]
    fn new_window_keeps_existing_focus() {
        let mut m = make_manager();
        map(&mut m, A);
        map(&mut m, B);
        m.handle(Event::EnterNotify { window: B }).unwrap();
        assert_eq!(m.focused(), Some(B));
        m.display.take_calls();

        map(&mut m, C);
        assert_eq!(m.focused(), Some(B));
        assert!(m.display.take_calls().contains(&Call::Focus(Some(B))));
    }

    #[test]
    fn out_of_range_workspace_is_ignored() {
        let mut m = make_manager();
        map(&mut m, A);
        m.display.take_calls();
        m.switch_workspace(3).unwrap();
        m.switch_workspace(usize::MAX).unwrap();
        assert_eq!(m.session().workspace, 0);
        assert!(m.display.take_calls().is_empty());
    }

    #[test]
    fn focus_keys_cycle_without_relayout() {
        let mut m = make_manager();
        map(&mut m, A);
        map(&mut m, B);
        map(&mut m, C);
        m.display.take_calls();

        key(&mut m, Modifiers::NONE, keysym::L);
        assert_eq!(m.focused(), Some(B));
        key(&mut m, Modifiers::NONE, keysym::H);
        key(&mut m, Modifiers::NONE, keysym::H);
        assert_eq!(m.focused(), Some(C));

        assert!(placements(&m.display.take_calls()).is_empty());
    }

    #[test]
    fn close_key_uses_delete_protocol() {
        let mut m = make_manager();
        m.display.set_protocols(A, &[Protocol::DeleteWindow]);
        map(&mut m, A);
        m.display.take_calls();
        key(&mut m, Modifiers::SHIFT, keysym::C);
        assert_eq!(
            m.display.take_calls(),
            vec![Call::Send(A, Protocol::DeleteWindow)]
        );
        assert!(m.registry().find(A).is_some(), "the client decides when to go");
    }

    #[test]
    fn protocols_are_read_once_per_window() {
        let mut m = make_manager();
        map(&mut m, A);
        map(&mut m, B);
        key(&mut m, Modifiers::NONE, keysym::L);
        key(&mut m, Modifiers::NONE, keysym::H);
        m.handle(Event::EnterNotify { window: B }).unwrap();
        assert_eq!(m.display.protocol_reads.get(), 2);
    }

    #[test]
    fn protocols_change_is_picked_up() {
        let mut m = make_manager();
        map(&mut m, A);
        m.display.set_protocols(A, &[Protocol::DeleteWindow]);
        m.display.take_calls();

        key(&mut m, Modifiers::SHIFT, keysym::C);
        assert_eq!(m.display.take_calls(), vec![Call::Kill(A)]);

        m.handle(Event::ProtocolsChanged { window: A }).unwrap();
        key(&mut m, Modifiers::SHIFT, keysym::C);
        assert_eq!(
            m.display.take_calls(),
            vec![Call::Send(A, Protocol::DeleteWindow)]
        );

        m.handle(Event::ProtocolsChanged { window: 0x999 }).unwrap();
        assert_eq!(m.display.protocol_reads.get(), 2);
    }

    #[test]
    fn spawn_keys_use_configured_commands() {
        let mut m = make_manager();
        key(&mut m, Modifiers::NONE, keysym::RETURN);
        key(&mut m, Modifiers::NONE, keysym::B);
        assert_eq!(
            *m.launcher.spawned.borrow(),
            vec!["kitty".to_string(), "firefox".to_string()]
        );
    }

    #[test]
    fn unbound_keys_do_nothing() {
        let mut m = make_manager();
        map(&mut m, A);
        m.display.take_calls();
        key(&mut m, Modifiers::NONE, 0x7a);
        assert!(m.display.take_calls().is_empty());
        assert!(m.is_running());
    }

    #[test]
    fn same_workspace_key_does_not_hide_anything() {
        let mut m = make_manager();
        map(&mut m, A);
        m.display.take_calls();
        key(&mut m, Modifiers::NONE, keysym::DIGIT_1);
        let calls = m.display.take_calls();
        assert!(!calls.iter().any(|c| matches!(c, Call::Unmap(_))));
        assert_eq!(placements(&calls), vec![(A, Rect::new(0, 0, 1200, 800))]);
    }

    #[test]
    fn adopted_windows_are_not_remapped() {
        let mut m = make_manager();
        m.adopt(&[A, 0xbad, B]).unwrap();
        let calls = m.display.take_calls();
        assert!(calls.contains(&Call::Kill(0xbad)));
        assert!(!calls.contains(&Call::Map(A)));
        assert!(!calls.contains(&Call::Map(B)));
        assert_eq!(m.registry().handles_in(0), vec![A, B]);
    }

    #[test]
    fn start_grabs_every_binding() {
        let mut m = make_manager();
        m.start().unwrap();
        assert_eq!(m.display.take_calls(), vec![Call::GrabKeys(9)]);
    }

    #[test]
    fn run_quits_and_releases_clients() {
        let mut m = make_manager();
        m.display.push_event(Event::MapRequest { window: A });
        m.display.push_event(Event::MapRequest { window: WEB });
        m.display.push_event(Event::KeyPress(KeyChord::new(
            Modifiers::MOD4 | Modifiers::SHIFT,
            keysym::Q,
        )));
        m.display.push_event(Event::MapRequest { window: B });

        m.run().unwrap();

        assert!(!m.is_running());
        assert!(m.registry().is_empty());
        let calls = m.display.take_calls();
        let tail = &calls[calls.len() - 2..];
        assert_eq!(tail, &[Call::Unmap(WEB), Call::Focus(None)]);
        assert!(!calls.contains(&Call::Manage(B, 0)), "events after quit are not processed");
        assert_eq!(m.display.events.borrow().len(), 1);
    }

    #[test]
    fn run_reports_lost_connection() {
        let mut m = make_manager();
        m.display.push_event(Event::MapRequest { window: A });
        assert!(m.run().is_err());
        assert!(m.is_running());
    }
}
