//! Client engine for a shared real-time chat room: reconciles the
//! coordinator's event stream into a local view (message log, roster,
//! typing set) and turns user actions into well-formed outbound events.

pub mod attachment;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod messages;
pub mod model;
pub mod presence;
pub mod session;
pub mod transport;
pub mod typing;

pub use error::ChatError;
pub use session::Session;
