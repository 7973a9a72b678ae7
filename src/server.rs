//! ChatServer Actor implementation
//!
//! The central actor owning all mutable state: the client registry and
//! the id counter. Connection handlers talk to it through one mpsc
//! command channel, which is also the engine's single wait point - the
//! event-driven replacement for a `select()`-style watch-set, with no
//! maximum-identifier bookkeeping to maintain.
//!
//! Commands are processed one at a time, so broadcast ordering is
//! exactly command arrival order and no fan-out ever observes a registry
//! mutated mid-iteration.

use std::future::Future;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::client::Client;
use crate::error::RegistryError;
use crate::handler::handle_connection;
use crate::protocol::{route_line, Route};
use crate::registry::ClientRegistry;
use crate::types::ClientId;

/// Channel buffer size for engine commands
const COMMAND_BUFFER_SIZE: usize = 256;

/// Commands sent from connection handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// A connection completed its handshake and wants a registry slot
    Join {
        name: String,
        addr: String,
        sender: mpsc::Sender<String>,
        reply: oneshot::Sender<Result<ClientId, RegistryError>>,
    },
    /// A registered client produced one protocol line
    Message { id: ClientId, line: String },
    /// A registered client's connection ended
    Leave { id: ClientId },
}

/// The main ChatServer actor
///
/// Owns the registry and processes commands sequentially. Ids are
/// assigned from a monotonic counter in registration order.
pub struct ChatServer {
    registry: ClientRegistry,
    receiver: mpsc::Receiver<ServerCommand>,
    next_id: u64,
}

impl ChatServer {
    /// Create a new ChatServer with the default registry capacity
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            registry: ClientRegistry::new(),
            receiver,
            next_id: 1,
        }
    }

    /// Create a ChatServer with an explicit registry capacity
    pub fn with_capacity(receiver: mpsc::Receiver<ServerCommand>, capacity: usize) -> Self {
        Self {
            registry: ClientRegistry::with_capacity(capacity),
            receiver,
            next_id: 1,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders
    /// are dropped.
    pub async fn run(mut self) {
        info!("chat engine started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("chat engine shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Join {
                name,
                addr,
                sender,
                reply,
            } => {
                self.handle_join(name, addr, sender, reply);
            }
            ServerCommand::Message { id, line } => {
                self.handle_message(id, line).await;
            }
            ServerCommand::Leave { id } => {
                self.handle_leave(id);
            }
        }
    }

    /// Register a freshly handshaken connection
    ///
    /// Success is silent on the wire; the connect notice is a local log
    /// side effect only. On capacity failure existing entries are left
    /// untouched and the handler is told to close the connection.
    fn handle_join(
        &mut self,
        name: String,
        addr: String,
        sender: mpsc::Sender<String>,
        reply: oneshot::Sender<Result<ClientId, RegistryError>>,
    ) {
        let id = ClientId(self.next_id);
        let client = Client::new(id, name.clone(), addr.clone(), sender);

        let outcome = match self.registry.add(client) {
            Ok(_slot) => {
                self.next_id += 1;
                info!("client {} connected from {}", name, addr);
                Ok(id)
            }
            Err(err) => {
                warn!("rejecting {} from {}: {}", name, addr, err);
                Err(err)
            }
        };

        let registered = outcome.is_ok();
        if reply.send(outcome).is_err() && registered {
            // The handler died between handshake and reply; take the
            // entry back out so the registry never outlives the
            // connection it represents.
            self.drop_client(id);
        }
    }

    /// Route one line from a registered client
    async fn handle_message(&mut self, id: ClientId, line: String) {
        let Some(sender) = self.registry.get(id) else {
            debug!("message from already-removed client {}", id);
            return;
        };

        if line.is_empty() {
            return;
        }

        let sender_name = sender.name.clone();
        match route_line(&line) {
            Route::Broadcast => {
                let out = format!("{sender_name}: {line}\n");
                self.broadcast(&out).await;
            }
            Route::Whisper { to, body } => {
                let out = format!("{sender_name}: {body}\n");
                match self.registry.find_by_name(to) {
                    Some(dest) => self.whisper(dest, out).await,
                    // Unknown destination: drop silently, no error to
                    // the sender. Accepted policy.
                    None => debug!("whisper from {} to unknown '{}'", sender_name, to),
                }
            }
        }
    }

    /// Deliver a line to every registered client, including the sender
    ///
    /// Failed recipients are collected during the pass and deregistered
    /// only after the fan-out completes, so a failure never aborts
    /// delivery to the rest and never mutates the set being iterated.
    async fn broadcast(&mut self, line: &str) {
        let mut failed = Vec::new();

        for client in self.registry.iter_active() {
            if client.send(line.to_string()).await.is_err() {
                failed.push(client.id);
            }
        }

        for id in failed {
            self.drop_client(id);
        }
    }

    /// Deliver a line to a single client, deregistering it on failure
    async fn whisper(&mut self, dest: ClientId, line: String) {
        let Some(client) = self.registry.get(dest) else {
            return;
        };

        if client.send(line).await.is_err() {
            self.drop_client(dest);
        }
    }

    /// Handle a connection ending
    ///
    /// Idempotent: send-failure cleanup may have removed the entry
    /// before the handler's Leave arrives.
    fn handle_leave(&mut self, id: ClientId) {
        match self.registry.remove(id) {
            Ok(client) => info!("client {} disconnected", client.name),
            Err(_) => debug!("leave for already-removed client {}", id),
        }
    }

    /// Remove a client whose connection proved dead mid-delivery
    fn drop_client(&mut self, id: ClientId) {
        if let Ok(client) = self.registry.remove(id) {
            info!("client {} disconnected", client.name);
        }
    }
}

/// Run the accept loop until `shutdown` resolves
///
/// Accepts exactly one connection per readiness; an accept failure is
/// logged and the loop continues, keeping already-connected clients
/// alive. Lifted out of `main` so tests can serve on an ephemeral port.
pub async fn serve_until<F>(listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
    tokio::spawn(ChatServer::new(cmd_rx).run());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!("new connection from {}", addr);
                    let cmd_tx = cmd_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, cmd_tx).await {
                            warn!("connection from {} ended: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                }
            },
        }
    }

    Ok(())
}

/// Run the accept loop forever
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    serve_until(listener, std::future::pending()).await
}
