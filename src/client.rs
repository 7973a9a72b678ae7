//! Client struct definition
//!
//! Represents one registered chat participant: its identity and the
//! outbound channel drained by that connection's writer task.

use tokio::sync::mpsc;

use crate::types::ClientId;

/// A connected, named participant
///
/// A `Client` exists only for a connection whose handshake completed.
/// Dropping it closes the outbound channel, which is what ends the
/// connection's writer task; the registry slot is the sole owner, so
/// the channel is closed exactly once.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Display name, assigned once at handshake, immutable afterward
    pub name: String,
    /// Printable origin address, informational only
    pub addr: String,
    /// Server -> connection outbound line channel
    sender: mpsc::Sender<String>,
}

impl Client {
    /// Create a new client with the given identity and outbound channel
    pub fn new(id: ClientId, name: String, addr: String, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            name,
            addr,
            sender,
        }
    }

    /// Queue a line for delivery to this client
    ///
    /// Fails when the connection's writer task is gone, which the engine
    /// treats as a dead recipient to deregister.
    pub async fn send(&self, line: String) -> Result<(), mpsc::error::SendError<String>> {
        self.sender.send(line).await
    }
}
