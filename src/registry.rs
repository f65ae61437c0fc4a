//! The set of managed windows.
//!
//! [`Registry`] owns every [`ManagedClient`].  Lookups go through a hash
//! map keyed by window handle; a separate vector keeps insertion order,
//! which is what tiling and focus cycling walk.

use crate::event::{Protocols, WindowHandle, WorkspaceIndex};
use std::collections::HashMap;

/// A window the manager has accepted and is placing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedClient {
    pub handle: WindowHandle,
    pub workspace: WorkspaceIndex,
    /// `WM_PROTOCOLS` as last read from the client.
    pub protocols: Protocols,
}

/// Errors from registry mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The handle is already managed; nothing was changed.
    #[error("window 0x{0:x} is already managed")]
    Duplicate(WindowHandle),
}

/// Managed clients, keyed by handle, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    clients: HashMap<WindowHandle, ManagedClient>,
    order: Vec<WindowHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` on `workspace`, advertising no protocols until
    /// [`set_protocols`](Self::set_protocols) says otherwise.
    ///
    /// Returns [`RegistryError::Duplicate`] (and leaves the registry
    /// untouched) if the handle is already present.
    pub fn add(&mut self, handle: WindowHandle, workspace: WorkspaceIndex) -> Result<(), RegistryError> {
        if self.clients.contains_key(&handle) {
            return Err(RegistryError::Duplicate(handle));
        }
        self.clients.insert(
            handle,
            ManagedClient {
                handle,
                workspace,
                protocols: Protocols::default(),
            },
        );
        self.order.push(handle);
        Ok(())
    }

    /// Forget `handle`.  Returns the removed client, or `None` if it was
    /// not managed.
    pub fn remove(&mut self, handle: WindowHandle) -> Option<ManagedClient> {
        let client = self.clients.remove(&handle)?;
        self.order.retain(|h| *h != handle);
        Some(client)
    }

    /// Replace the cached protocols of `handle`.  Returns `false` if the
    /// handle is not managed.
    pub fn set_protocols(&mut self, handle: WindowHandle, protocols: Protocols) -> bool {
        match self.clients.get_mut(&handle) {
            Some(client) => {
                client.protocols = protocols;
                true
            }
            None => false,
        }
    }

    pub fn find(&self, handle: WindowHandle) -> Option<&ManagedClient> {
        self.clients.get(&handle)
    }

    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.clients.contains_key(&handle)
    }

    /// Clients on `workspace`, oldest first.
    pub fn clients_in(&self, workspace: WorkspaceIndex) -> impl Iterator<Item = &ManagedClient> + '_ {
        self.iter().filter(move |c| c.workspace == workspace)
    }

    /// Handles on `workspace`, oldest first, collected so the caller may
    /// mutate the registry afterwards.
    pub fn handles_in(&self, workspace: WorkspaceIndex) -> Vec<WindowHandle> {
        self.clients_in(workspace).map(|c| c.handle).collect()
    }

    /// Every client, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ManagedClient> + '_ {
        self.order.iter().filter_map(move |h| self.clients.get(h))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
