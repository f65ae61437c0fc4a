//! **madawm**: a policy-restricted tiling window manager for X11.
//!
//! A fixed number of workspaces each carry an allow-list of application
//! classes.  A window is managed only if its `WM_CLASS` matches one of the
//! lists; it is then pinned to that workspace for its whole life.  Windows
//! nobody allowed are killed on sight.  The visible workspace is tiled as
//! equal-width full-height columns, and everything is driven from the
//! keyboard.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::Display`]: abstracts the display server so the window
//!   management logic is not coupled to X11.
//! * [`traits::Launcher`]: abstracts how spawn bindings start programs.
//!
//! [`manager::Manager`] owns all state and dispatches [`event::Event`]s.
//! The pure pieces it leans on are [`classifier`], [`layout`] and
//! [`bindings`].  The concrete X11 backend lives in [`x11`].

pub mod bindings;
pub mod classifier;
pub mod config;
pub mod event;
pub mod focus;
pub mod launcher;
pub mod layout;
pub mod manager;
pub mod registry;
pub mod traits;
pub mod x11;
