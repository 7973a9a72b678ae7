//! Basic type definitions and protocol limits
//!
//! Provides the `ClientId` newtype and the size limits shared by the
//! server engine, the protocol layer, and the client binary.

/// Maximum number of simultaneously registered clients.
pub const MAX_CLIENTS: usize = 16;

/// Maximum display-name length in visible characters.
pub const MAX_NAME_LEN: usize = 256;

/// Maximum length of one protocol line in bytes, terminator excluded.
pub const MAX_LINE_LEN: usize = 1024;

/// Unique client identifier (newtype pattern)
///
/// Assigned sequentially by the engine in registration order, so later
/// joins always carry larger ids. Implements `Hash` and `Eq` for use as
/// a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
