//! p2p-session-core: peer discovery and connection session coordination
//!
//! This crate turns the unreliable, asynchronous notification stream of an
//! ambient wireless-direct transport into a consistent connection lifecycle
//! fanned out to any number of independent observers.
//!
//! ## Layer separation
//! ```text
//! application -> p2p-session-core -> TransportProvider (platform wireless API)
//! ```
//!
//! The crate focuses on:
//! - Session lifecycle management (register, discover, connect, disconnect)
//! - Routing events that arrive on arbitrary transport tasks through one
//!   critical section
//! - Observer fan-out with per-listener fault isolation
//!
//! Device discovery handshakes and pairing negotiation belong to the
//! transport provider; this crate only orchestrates state.

pub mod device;
pub mod error;
pub mod events;
pub mod session;
pub mod state;
pub mod transport;

// Public API exports
pub use device::{ConnectionInfo, DeviceDescriptor, DeviceStatus};
pub use error::{SessionError, SessionResult};
pub use events::{ListenerId, SessionListener};
pub use session::{
    ConnectConfig, ConnectTarget, PairingMode, RetryConfig, SessionConfig, SessionManager,
    SessionManagerBuilder, SessionStats,
};
pub use state::SessionState;
pub use transport::{
    ChannelHandle, FailureReason, HostContext, TransportError, TransportEvent,
    TransportEventHandler, TransportProvider,
};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
