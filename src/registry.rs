//! Fixed-capacity client registry
//!
//! Slot-based table mapping client ids to [`Client`] entries. The engine
//! owns exactly one registry; there is no shared or global state, so a
//! fresh registry can be built per unit test.

use crate::client::Client;
use crate::error::RegistryError;
use crate::types::{ClientId, MAX_CLIENTS};

/// Bounded table of active clients
///
/// Insertion takes the first free slot; iteration is deterministic in
/// slot order, which fixes both broadcast ordering and name-collision
/// resolution (first match wins).
#[derive(Debug)]
pub struct ClientRegistry {
    slots: Vec<Option<Client>>,
    active: usize,
}

impl ClientRegistry {
    /// Create a registry with the default capacity of [`MAX_CLIENTS`]
    pub fn new() -> Self {
        Self::with_capacity(MAX_CLIENTS)
    }

    /// Create a registry with an explicit capacity (used by tests)
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, active: 0 }
    }

    /// Insert a client into the first free slot
    ///
    /// Fails with `AtCapacity` when the table is full. The `NoFreeSlot`
    /// branch guards against the count and the slot table disagreeing.
    pub fn add(&mut self, client: Client) -> Result<usize, RegistryError> {
        if self.active >= self.slots.len() {
            return Err(RegistryError::AtCapacity(self.active));
        }

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(client);
                self.active += 1;
                return Ok(i);
            }
        }

        Err(RegistryError::NoFreeSlot)
    }

    /// Remove the entry for `id`, returning the owned client
    ///
    /// Dropping the returned client is what closes its outbound channel,
    /// so the caller decides when that happens.
    pub fn remove(&mut self, id: ClientId) -> Result<Client, RegistryError> {
        for slot in self.slots.iter_mut() {
            if matches!(slot, Some(c) if c.id == id) {
                if let Some(client) = slot.take() {
                    self.active -= 1;
                    return Ok(client);
                }
            }
        }
        Err(RegistryError::UnknownClient(id))
    }

    /// Look up an active client by id
    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.iter_active().find(|c| c.id == id)
    }

    /// Find the FIRST active client with the given name, in slot order
    ///
    /// Duplicate names are allowed; the earliest-registered client wins.
    /// This is documented, accepted ambiguity, not a bug.
    pub fn find_by_name(&self, name: &str) -> Option<ClientId> {
        self.iter_active().find(|c| c.name == name).map(|c| c.id)
    }

    /// Iterate over all active clients in slot order
    pub fn iter_active(&self) -> impl Iterator<Item = &Client> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Number of active clients
    pub fn len(&self) -> usize {
        self.active
    }

    /// True when no clients are registered
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Maximum number of simultaneous clients
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
