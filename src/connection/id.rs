//! Identifiers for accepted connections.

use std::{
    fmt,
    net::SocketAddr,
    sync::atomic::{AtomicU64, Ordering},
};

/// Server-assigned identifier of a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Create a new resource identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use picows::connection::ResourceId;
    ///
    /// let id = ResourceId::new(42);
    /// assert_eq!(id.as_u64(), 42);
    /// ```
    #[must_use]
    pub const fn new(value: u64) -> Self { Self(value) }

    /// Return the inner identifier value.
    #[must_use]
    pub const fn as_u64(self) -> u64 { self.0 }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self { Self(value) }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Hands out increasing resource ids, never repeating within a process.
#[derive(Debug)]
pub struct ResourceIdAllocator {
    next: AtomicU64,
}

impl Default for ResourceIdAllocator {
    fn default() -> Self { Self::new() }
}

impl ResourceIdAllocator {
    /// Start allocating at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Take the next id.
    ///
    /// # Examples
    ///
    /// ```
    /// use picows::connection::ResourceIdAllocator;
    ///
    /// let ids = ResourceIdAllocator::new();
    /// assert_ne!(ids.allocate(), ids.allocate());
    /// ```
    pub fn allocate(&self) -> ResourceId { ResourceId(self.next.fetch_add(1, Ordering::Relaxed)) }
}

/// Who is on the other end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerInfo {
    /// Identifier assigned by the listener.
    pub resource_id: ResourceId,
    /// Remote socket address, if known.
    pub remote_addr: Option<SocketAddr>,
}

impl PeerInfo {
    /// Describe a peer.
    #[must_use]
    pub const fn new(resource_id: ResourceId, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            resource_id,
            remote_addr,
        }
    }
}
