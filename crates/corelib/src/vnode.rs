//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Instead of each backend server having a single position on the ring, each
//! server has several positions (virtual nodes). This provides:
//!
//! 1. **Better Load Distribution**: more positions smooth out the arc each
//!    server owns
//! 2. **Gradual Rebalancing**: when a server joins, it takes over only the
//!    arcs between its vnodes and their ring predecessors
//!
//! # Key Derivation
//!
//! The key of vnode `i` is the partitioner applied to the normalized server
//! address immediately followed by the decimal index, with no separator:
//! `digest("http://10.0.0.1" + "0")`, `digest("http://10.0.0.1" + "1")`, ...
//!
//! # Performance Characteristics
//!
//! - **Memory**: O(v) where v = number of vnodes per server
//! - **Lookup**: O(log n) where n = total vnodes (not affected by vnode count per server)

use crate::partitioner::Partitioner;
use crate::server::Server;
use crate::token::Token;

/// Virtual nodes per server when none is configured.
pub const DEFAULT_VNODES: usize = 4;

/// A virtual node on the hash ring.
///
/// # Invariants
///
/// - Every `VirtualNode` belongs to exactly one server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualNode<T: Token> {
    /// Token position on the ring.
    pub token: T,

    /// The server that owns this virtual node.
    ///
    /// Multiple virtual nodes share the same server (that's the point!).
    pub server: Server,
}

impl<T: Token> VirtualNode<T> {
    /// Create a new virtual node.
    #[inline]
    pub fn new(token: T, server: Server) -> Self {
        Self { token, server }
    }

    /// Create a virtual node from a server and vnode index.
    ///
    /// # Example
    /// ```rust
    /// use corelib::partitioner::Sha1Partitioner;
    /// use corelib::{Server, VirtualNode};
    ///
    /// let server = Server::parse("http://10.0.0.1").unwrap();
    /// let vnode0 = VirtualNode::from_index(&Sha1Partitioner, &server, 0);
    /// let vnode1 = VirtualNode::from_index(&Sha1Partitioner, &server, 1);
    /// assert_ne!(vnode0.token, vnode1.token);
    /// ```
    pub fn from_index<P>(partitioner: &P, server: &Server, vnode_index: usize) -> Self
    where
        P: Partitioner<TokenType = T>,
    {
        let vnode_key = format!("{}{}", server.as_str(), vnode_index);
        let token = partitioner.partition(vnode_key.as_bytes());
        Self::new(token, server.clone())
    }

    /// Get the token position.
    #[inline]
    pub fn token(&self) -> &T {
        &self.token
    }

    /// Get the owning server.
    #[inline]
    pub fn server(&self) -> &Server {
        &self.server
    }
}

/// All `count` virtual nodes for `server`, in index order.
pub fn virtual_nodes<P: Partitioner>(
    partitioner: &P,
    server: &Server,
    count: usize,
) -> Vec<VirtualNode<P::TokenType>> {
    (0..count)
        .map(|i| VirtualNode::from_index(partitioner, server, i))
        .collect()
}

impl<T: Token + std::fmt::Display> std::fmt::Display for VirtualNode<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VNode(token={}, server={})", self.token, self.server)
    }
}
