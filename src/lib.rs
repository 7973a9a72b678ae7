//! Line-oriented TCP chat server library
//!
//! A small chat service: clients connect over plain TCP, introduce
//! themselves with a single name line, and then exchange
//! newline-delimited text. A line is either broadcast to everyone or
//! whispered to one named recipient with `@name body`.
//!
//! # Features
//! - First-line name handshake
//! - Broadcast routing (everyone, sender included)
//! - Whisper routing (`@name body`, first name match wins)
//! - Fixed-capacity client table with slot reuse
//! - Per-connection cleanup that never disturbs other clients
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the client registry
//! - Each connection has a handler task plus a writer task
//! - No locks needed - all state access goes through message passing
//!
//! The engine's single wait point is its command channel, so there is
//! no watch-set or maximum-descriptor bookkeeping to keep in sync with
//! the registry.
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chatline::serve;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let listener = TcpListener::bind("0.0.0.0:7000").await?;
//!     serve(listener).await
//! }
//! ```

pub mod client;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use error::{HandshakeError, RegistryError, ServerError};
pub use handler::handle_connection;
pub use protocol::{parse_name, read_line_bounded, route_line, Route};
pub use registry::ClientRegistry;
pub use server::{serve, serve_until, ChatServer, ServerCommand};
pub use types::{ClientId, MAX_CLIENTS, MAX_LINE_LEN, MAX_NAME_LEN};
