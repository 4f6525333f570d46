use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use err::{Error, Result};
use net::Id;
use nio::Awakener;

#[derive(Debug)]
pub(crate) enum Command {
    Write(Id, Vec<u8>),
    SendTo(Id, SocketAddr, Vec<u8>),
    Broadcast(Id, Vec<u8>),
    Close(Id),
    Stop,
}

/// Drives a `Reactor` from other threads.
///
/// Commands are queued and executed by the reactor's thread on its next
/// poll round; failures surface there as `NetEvent::Error`. Every call
/// fails with `Error::Disconnected` once the reactor is dropped.
#[derive(Clone)]
pub struct Remote {
    tx: Sender<Command>,
    awakener: Arc<Awakener>,
}

impl Remote {
    #[inline]
    pub(crate) fn new(tx: Sender<Command>, awakener: Arc<Awakener>) -> Self {
        Remote { tx, awakener }
    }

    #[inline]
    pub fn write<B: Into<Vec<u8>>>(&self, id: Id, data: B) -> Result<()> {
        self.send(Command::Write(id, data.into()))
    }

    #[inline]
    pub fn send_to<B: Into<Vec<u8>>>(&self, id: Id, peer: SocketAddr, data: B) -> Result<()> {
        self.send(Command::SendTo(id, peer, data.into()))
    }

    #[inline]
    pub fn broadcast<B: Into<Vec<u8>>>(&self, server: Id, data: B) -> Result<()> {
        self.send(Command::Broadcast(server, data.into()))
    }

    #[inline]
    pub fn close(&self, id: Id) -> Result<()> {
        self.send(Command::Close(id))
    }

    #[inline]
    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.tx.send(cmd).map_err(|_| Error::Disconnected)?;
        self.awakener.wakeup()?;
        Ok(())
    }
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Remote {{ awakener: {:?} }}", self.awakener)
    }
}
