//! WebSocket Session Management
//!
//! Each WebSocket connection carries exactly one dialogue session. It is
//! structured into submodules:
//!
//! - `protocol`: Defines the JSON-based message format for client-server communication.
//! - `session`: Manages the WebSocket connection lifecycle, from handshake to termination.

pub mod protocol;
pub mod session;

pub use session::ws_handler;
