//! Explicit construction of session managers

use std::sync::{Arc, Weak};

use super::config::SessionConfig;
use super::manager::SessionManager;
use crate::error::{SessionError, SessionResult};
use crate::transport::{HostContext, TransportProvider};

/// Builder for a session manager
///
/// Sessions are constructed and owned by the caller; independent sessions
/// can coexist against different transports or hosts.
pub struct SessionManagerBuilder {
    config: SessionConfig,
    transport: Option<Arc<dyn TransportProvider>>,
    host: Option<Weak<HostContext>>,
}

impl SessionManagerBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            transport: None,
            host: None,
        }
    }

    /// Set the transport provider the session delegates to
    pub fn transport(mut self, transport: Arc<dyn TransportProvider>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Bind the session to a host execution context
    ///
    /// Only a weak reference is kept: once the host drops its `Arc`,
    /// `register()` becomes a silent no-op.
    pub fn host(mut self, host: &Arc<HostContext>) -> Self {
        self.host = Some(Arc::downgrade(host));
        self
    }

    /// Set the session configuration
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the session manager
    pub fn build(self) -> SessionResult<Arc<SessionManager>> {
        let transport = self.transport.ok_or(SessionError::MissingConfiguration {
            field: "transport".to_string(),
        })?;
        let host = self.host.ok_or(SessionError::MissingConfiguration {
            field: "host".to_string(),
        })?;
        Ok(SessionManager::with_parts(transport, self.config, host))
    }
}

impl Default for SessionManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
