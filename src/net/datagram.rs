use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};

use err::{Error, Result};
use nio::{Event, Ops, Poller, UdpSocket};
use super::{Context, Id, NetEvent, Status};

/// UDP socket component. `None` as a destination means the connected
/// peer.
#[derive(Debug)]
pub(crate) struct Datagram {
    sock: UdpSocket,
    peer: Option<SocketAddr>,
    queue: VecDeque<(Option<SocketAddr>, Vec<u8>)>,
}

impl Datagram {
    #[inline]
    pub(crate) fn new(sock: UdpSocket, peer: Option<SocketAddr>) -> Self {
        Datagram {
            sock,
            peer,
            queue: VecDeque::new(),
        }
    }

    #[inline]
    pub(crate) fn open(&self, id: Id, poller: &Poller) -> io::Result<()> {
        poller.register(&self.sock, Ops::READ, id)
    }

    #[inline]
    pub(crate) fn local_addr(&self) -> io::Result<SocketAddr> {
        self.sock.local_addr()
    }

    #[inline]
    pub(crate) fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub(crate) fn ready(&mut self, id: Id, event: &Event, cx: &mut Context) -> Status {
        if event.is_writable() {
            self.flush(id, cx);
        }
        if event.is_readable() {
            self.recv(id, cx);
        } else if event.is_error() {
            match self.sock.take_error() {
                Ok(Some(e)) | Err(e) => cx.emit(NetEvent::Error {
                    id,
                    error: e.into(),
                }),
                Ok(None) => {}
            }
        }
        Status::Alive
    }

    pub(crate) fn send_to(
        &mut self,
        id: Id,
        peer: SocketAddr,
        data: Vec<u8>,
        cx: &mut Context,
    ) -> Result<()> {
        self.enqueue(id, Some(peer), data, cx)
    }

    pub(crate) fn write(&mut self, id: Id, data: Vec<u8>, cx: &mut Context) -> Result<()> {
        if self.peer.is_none() {
            return Err(Error::Unsupported(id, "write without a connected peer"));
        }
        self.enqueue(id, None, data, cx)
    }

    /// Queued datagrams are dropped.
    pub(crate) fn close(&mut self, id: Id, cx: &mut Context) -> Status {
        if !self.queue.is_empty() {
            debug!("{} dropping {} queued datagrams", id, self.queue.len());
            self.queue.clear();
        }
        cx.emit(NetEvent::Closed { id });
        Status::Gone
    }

    fn enqueue(
        &mut self,
        id: Id,
        dest: Option<SocketAddr>,
        data: Vec<u8>,
        cx: &mut Context,
    ) -> Result<()> {
        if self.queue.is_empty() {
            cx.poller.add_writer(&self.sock, id)?;
        }
        self.queue.push_back((dest, data));
        Ok(())
    }

    fn recv(&mut self, id: Id, cx: &mut Context) {
        let mut data = vec![0; cx.read_size];
        match self.sock.recv_from(&mut data) {
            Ok((n, peer)) => {
                data.truncate(n);
                cx.emit(NetEvent::ReadFrom { id, peer, data });
            }
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => cx.emit(NetEvent::Error {
                id,
                error: e.into(),
            }),
        }
    }

    fn flush(&mut self, id: Id, cx: &mut Context) {
        while let Some((dest, data)) = self.queue.pop_front() {
            let res = match dest {
                Some(ref peer) => self.sock.send_to(&data, peer),
                None => self.sock.send(&data),
            };
            match res {
                Ok(_) => {}
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.queue.push_front((dest, data));
                    return;
                }
                Err(e) => {
                    warn!("{} dropped a datagram of {} bytes: {}", id, data.len(), e);
                    cx.emit(NetEvent::Error {
                        id,
                        error: e.into(),
                    });
                }
            }
        }
        if let Err(e) = cx.poller.remove_writer(&self.sock) {
            cx.emit(NetEvent::Error {
                id,
                error: e.into(),
            });
        }
        cx.emit(NetEvent::Drained { id });
    }
}

impl AsRawFd for Datagram {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.sock.as_raw_fd()
    }
}
