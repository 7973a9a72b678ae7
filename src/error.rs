//! Error types for the chat server
//!
//! Defines registry, handshake, and connection-level errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::ClientId;

/// Client registry errors
///
/// Every variant is contained: the engine resolves it by rejecting or
/// removing a single connection, never by aborting the event loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The table already holds the maximum number of active clients
    #[error("client table is full ({0} active)")]
    AtCapacity(usize),

    /// The active count claimed space but no free slot was found.
    /// Indicates internal inconsistency in the slot table.
    #[error("no free slot despite capacity check")]
    NoFreeSlot,

    /// No active entry matches the given client id
    #[error("no active client {0}")]
    UnknownClient(ClientId),
}

/// Handshake errors
///
/// All of these close the raw connection before it ever reaches the
/// registry; a partially-handshaken client is never visible to routing.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// Peer closed the stream before completing the name line
    #[error("disconnected before sending a name")]
    Disconnected,

    /// The name line was empty
    #[error("empty name rejected")]
    EmptyName,

    /// The name exceeds the visible-character limit
    #[error("name exceeds {0} characters")]
    NameTooLong(usize),

    /// IO error while reading the name line (fatal for this connection)
    #[error("handshake IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-connection errors surfaced by the lifecycle manager
///
/// Covers everything that can end one client session. None of these
/// affect other clients or the accept loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error on the client stream (fatal for this connection)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Handshake failed before registration
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    /// The registry rejected the registration
    #[error("registration rejected: {0}")]
    Registry(#[from] RegistryError),

    /// The engine's command channel is closed (server shutting down)
    #[error("engine unavailable")]
    EngineClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::AtCapacity(16);
        assert_eq!(err.to_string(), "client table is full (16 active)");

        let err = RegistryError::UnknownClient(ClientId(3));
        assert_eq!(err.to_string(), "no active client #3");
    }

    #[test]
    fn test_handshake_error_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = HandshakeError::from(io);
        assert!(matches!(err, HandshakeError::Io(_)));
    }
}
