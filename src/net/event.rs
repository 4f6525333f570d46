use std::net::SocketAddr;

use err::Error;
use super::{Addr, Id};

/// Lifecycle and data notifications produced by socket components.
#[derive(Debug)]
pub enum NetEvent {
    /// A listener or datagram socket is bound to `addr`.
    Ready { id: Id, addr: Addr },
    /// `server` accepted a connection from `peer`.
    Accepted { server: Id, conn: Id, peer: Addr },
    /// An outgoing connection is established.
    Connected { conn: Id, peer: Addr },
    Read { conn: Id, data: Vec<u8> },
    ReadFrom {
        id: Id,
        peer: SocketAddr,
        data: Vec<u8>,
    },
    /// Every queued byte or datagram has been handed to the OS.
    Drained { id: Id },
    /// The connection ended without a local `close`. `server` is set for
    /// accepted connections.
    Disconnected { conn: Id, server: Option<Id> },
    Closed { id: Id },
    Error { id: Id, error: Error },
}

impl NetEvent {
    /// The socket the event is about.
    pub fn id(&self) -> Id {
        match *self {
            NetEvent::Ready { id, .. }
            | NetEvent::ReadFrom { id, .. }
            | NetEvent::Drained { id }
            | NetEvent::Closed { id }
            | NetEvent::Error { id, .. } => id,
            NetEvent::Accepted { conn, .. }
            | NetEvent::Connected { conn, .. }
            | NetEvent::Read { conn, .. }
            | NetEvent::Disconnected { conn, .. } => conn,
        }
    }
}
