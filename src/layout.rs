//! Equal-width column tiling.
//!
//! [`arrange`] is a pure function from registry state to a [`Layout`]: one
//! [`Placement`] per client of the visible workspace and a list of every
//! other managed client, which must be hidden.  Applying the layout is the
//! manager's job.

use crate::event::{Rect, WindowHandle, WorkspaceIndex};
use crate::registry::Registry;

/// Where a single client goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub handle: WindowHandle,
    /// The column the client owns, border included.
    pub cell: Rect,
    /// The window geometry inside the cell, after the border inset.
    pub window: Rect,
}

/// The result of arranging one workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    /// Visible clients, left to right.
    pub placements: Vec<Placement>,
    /// Managed clients on other workspaces.
    pub hidden: Vec<WindowHandle>,
}

impl Layout {
    /// The client that should receive focus if nothing better is known:
    /// whoever sits in the first column.
    pub fn focus_candidate(&self) -> Option<WindowHandle> {
        self.placements.first().map(|p| p.handle)
    }
}

/// Split `width` into `n` columns.
///
/// Every column is `width / n` wide except the last, which absorbs the
/// remainder, so the columns tile `[0, width)` exactly.
pub fn columns(n: usize, width: u32, height: u32) -> Vec<Rect> {
    if n == 0 {
        return Vec::new();
    }
    let n32 = n as u32;
    let base = width / n32;
    (0..n32)
        .map(|i| {
            let x = i * base;
            let w = if i == n32 - 1 { width - x } else { base };
            Rect::new(x as i32, 0, w, height)
        })
        .collect()
}

/// Tile the clients of `workspace` across a `width × height` screen.
///
/// Column order follows registry order, so the oldest client is leftmost.
pub fn arrange(
    registry: &Registry,
    workspace: WorkspaceIndex,
    width: u32,
    height: u32,
    border: u32,
) -> Layout {
    let visible: Vec<WindowHandle> = registry.clients_in(workspace).map(|c| c.handle).collect();
    let placements = visible
        .iter()
        .zip(columns(visible.len(), width, height))
        .map(|(&handle, cell)| Placement {
            handle,
            cell,
            window: cell.inset(border),
        })
        .collect();
    let hidden = registry
        .iter()
        .filter(|c| c.workspace != workspace)
        .map(|c| c.handle)
        .collect();
    Layout { placements, hidden }
}
