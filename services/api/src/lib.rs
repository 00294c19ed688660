//! Tutor API Library Crate
//!
//! This library contains the web service around the dialogue core: the
//! application state, the read-only content handlers, WebSocket sessions and
//! routing. The binaries in `bin/` are thin wrappers around it.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod ws;
