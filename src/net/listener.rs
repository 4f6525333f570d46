use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;

use nio::{Ops, Poller, TcpListener, UnixListener};
use super::{Addr, Conn, Context, Id, NetEvent};

pub(crate) enum Acceptor {
    Tcp(TcpListener),
    Unix(UnixListener),
}

impl Acceptor {
    /// Accepted UNIX peers are usually unnamed; they get an empty path.
    fn accept(&self) -> io::Result<(Conn, Addr)> {
        match *self {
            Acceptor::Tcp(ref l) => {
                let (s, peer) = l.accept()?;
                Ok((Conn::Tcp(s), Addr::Tcp(peer)))
            }
            Acceptor::Unix(ref l) => {
                let s = l.accept()?;
                let peer = s.peer_path().unwrap_or_else(PathBuf::new);
                Ok((Conn::Unix(s), Addr::Unix(peer)))
            }
        }
    }
}

impl AsRawFd for Acceptor {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        match *self {
            Acceptor::Tcp(ref l) => l.as_raw_fd(),
            Acceptor::Unix(ref l) => l.as_raw_fd(),
        }
    }
}

impl fmt::Debug for Acceptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Acceptor::Tcp(ref l) => fmt::Debug::fmt(l, f),
            Acceptor::Unix(ref l) => fmt::Debug::fmt(l, f),
        }
    }
}

/// Server socket component. Tracks the connections it accepted so they
/// can be broadcast to and closed together.
#[derive(Debug)]
pub(crate) struct Listener {
    acceptor: Acceptor,
    addr: Addr,
    conns: BTreeSet<Id>,
}

impl Listener {
    /// `addr` is the bound address, with port 0 already resolved.
    #[inline]
    pub(crate) fn new(acceptor: Acceptor, addr: Addr) -> Self {
        Listener {
            acceptor,
            addr,
            conns: BTreeSet::new(),
        }
    }

    #[inline]
    pub(crate) fn open(&self, id: Id, poller: &Poller) -> io::Result<()> {
        poller.register(&self.acceptor, Ops::READ, id)
    }

    #[inline]
    pub(crate) fn addr(&self) -> &Addr {
        &self.addr
    }

    #[inline]
    pub(crate) fn conns(&self) -> Vec<Id> {
        self.conns.iter().cloned().collect()
    }

    #[inline]
    pub(crate) fn num_conns(&self) -> usize {
        self.conns.len()
    }

    #[inline]
    pub(crate) fn adopt(&mut self, conn: Id) {
        self.conns.insert(conn);
    }

    #[inline]
    pub(crate) fn forget(&mut self, conn: Id) {
        self.conns.remove(&conn);
    }

    /// Accepts every pending connection. Accept failures are reported as
    /// `Error` events and leave the listener open.
    pub(crate) fn ready(&mut self, id: Id, cx: &mut Context) -> Vec<(Conn, Addr)> {
        let mut accepted = Vec::new();
        loop {
            match self.acceptor.accept() {
                Ok(pair) => accepted.push(pair),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    error!("{} failed to accept: {}", self.addr, e);
                    cx.emit(NetEvent::Error {
                        id,
                        error: e.into(),
                    });
                    break;
                }
            }
        }
        accepted
    }
}

impl AsRawFd for Listener {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.acceptor.as_raw_fd()
    }
}
