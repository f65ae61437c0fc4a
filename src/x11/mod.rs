//! X11-specific implementations.
//!
//! This module provides the concrete backend for the
//! [`Display`](crate::traits::Display) trait, powered by `x11rb`.
//!
//! Nothing outside this module should reference X11 directly.

pub mod display;
pub mod keys;
