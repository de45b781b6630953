//! Real-time push transport.
//!
//! Delivery is deliver-or-drop: a recipient with no live connection simply
//! misses the push and catches up from the durable stores on the next poll.

pub mod connection;
mod handler;
pub mod messages;

pub use connection::{ConnectionManager, SendError};
pub use handler::ws_handler;
pub use messages::{comments, msg_types, system, ClientMessage, ServerMessage};
