use std::fmt;
use std::io::{self, Read};
use std::net::Shutdown;
use std::os::unix::io::{AsRawFd, RawFd};

use buf::WriteBuf;
use err::{Error, Result};
use nio::{Event, IoVec, Ops, Poller, TcpStream, UnixStream, WriteV};
use super::{Addr, Context, Id, NetEvent, Status};

/// A connected TCP or UNIX stream.
pub(crate) enum Conn {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl Conn {
    pub(crate) fn local_addr(&self) -> io::Result<Addr> {
        match *self {
            Conn::Tcp(ref s) => s.local_addr().map(Addr::Tcp),
            Conn::Unix(ref s) => Ok(Addr::Unix(s.local_path().unwrap_or_default())),
        }
    }

    fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        match *self {
            Conn::Tcp(ref s) => s.shutdown(how),
            Conn::Unix(ref s) => s.shutdown(how),
        }
    }

    fn take_error(&self) -> io::Result<Option<io::Error>> {
        match *self {
            Conn::Tcp(ref s) => s.take_error(),
            Conn::Unix(ref s) => s.take_error(),
        }
    }

    /// `Ok(false)` while a non-blocking connect is still in flight.
    fn is_connected(&self) -> io::Result<bool> {
        match *self {
            Conn::Tcp(ref s) => match s.peer_addr() {
                Ok(_) => Ok(true),
                Err(ref e) if e.kind() == io::ErrorKind::NotConnected => Ok(false),
                Err(e) => Err(e),
            },
            Conn::Unix(_) => Ok(true),
        }
    }
}

impl Read for Conn {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match *self {
            Conn::Tcp(ref mut s) => s.read(buf),
            Conn::Unix(ref mut s) => s.read(buf),
        }
    }
}

impl WriteV for Conn {
    #[inline]
    fn writev(&mut self, iovs: &[IoVec]) -> io::Result<usize> {
        match *self {
            Conn::Tcp(ref mut s) => s.writev(iovs),
            Conn::Unix(ref mut s) => s.writev(iovs),
        }
    }
}

impl AsRawFd for Conn {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        match *self {
            Conn::Tcp(ref s) => s.as_raw_fd(),
            Conn::Unix(ref s) => s.as_raw_fd(),
        }
    }
}

impl fmt::Debug for Conn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Conn::Tcp(ref s) => fmt::Debug::fmt(s, f),
            Conn::Unix(ref s) => fmt::Debug::fmt(s, f),
        }
    }
}

// State transitions
// Connecting -(writable, no socket error)-> Connected
// Connecting -(writable, close requested)-> Closing
// Connecting -(socket error)-> removed, Error + Disconnected
// Connecting -(close, empty buffer)-> Closed
// Connected -(close, empty buffer)-> Closed
// Connected -(close, pending data)-> Closing
// Closing -(buffer drained)-> Closed
// Connected | Closing -(EOF or I/O error)-> removed, Disconnected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Connecting,
    Connected,
    Closing,
    Closed,
}

/// Stream socket component.
///
/// WRITE interest is registered exactly while the stream is connecting or
/// has bytes queued.
#[derive(Debug)]
pub(crate) struct Stream {
    conn: Conn,
    peer: Addr,
    server: Option<Id>,
    state: State,
    // close requested before the connect completed
    linger: bool,
    wbuf: WriteBuf,
}

impl Stream {
    #[inline]
    pub(crate) fn connecting(conn: Conn, peer: Addr) -> Self {
        Self::new(conn, peer, None, State::Connecting)
    }

    #[inline]
    pub(crate) fn connected(conn: Conn, peer: Addr, server: Option<Id>) -> Self {
        Self::new(conn, peer, server, State::Connected)
    }

    fn new(conn: Conn, peer: Addr, server: Option<Id>, state: State) -> Self {
        Stream {
            conn,
            peer,
            server,
            state,
            linger: false,
            wbuf: WriteBuf::new(),
        }
    }

    /// Registers with the interest matching the current state.
    pub(crate) fn open(&self, id: Id, poller: &Poller) -> io::Result<()> {
        let interest = match self.state {
            State::Connecting => Ops::WRITE,
            _ => Ops::READ,
        };
        poller.register(&self.conn, interest, id)
    }

    #[inline]
    pub(crate) fn conn(&self) -> &Conn {
        &self.conn
    }

    #[inline]
    pub(crate) fn peer(&self) -> &Addr {
        &self.peer
    }

    /// The listener that accepted this connection.
    #[inline]
    pub(crate) fn server(&self) -> Option<Id> {
        self.server
    }

    /// Detaches from a listener that is going away.
    #[inline]
    pub(crate) fn orphan(&mut self) {
        self.server = None;
    }

    /// Number of bytes waiting to be written.
    #[inline]
    pub(crate) fn pending(&self) -> usize {
        self.wbuf.len()
    }

    pub(crate) fn ready(&mut self, id: Id, event: &Event, cx: &mut Context) -> Status {
        match self.state {
            State::Connecting => return self.finish_connect(id, cx),
            State::Closed => return Status::Gone,
            _ => {}
        }
        if event.is_writable() && self.flush(id, cx).is_gone() {
            return Status::Gone;
        }
        match self.state {
            State::Connected if event.is_readable() || event.is_hup() => self.read(id, cx),
            State::Closing if event.is_hup() && !event.is_writable() => {
                debug!("{} peer hung up with {} bytes unsent", id, self.wbuf.len());
                self.wbuf.clear();
                self.finish_close(id, cx)
            }
            _ if event.is_error() => {
                let e = match self.conn.take_error() {
                    Ok(Some(e)) | Err(e) => e,
                    Ok(None) => return Status::Alive,
                };
                self.fail(id, e.into(), cx)
            }
            _ => Status::Alive,
        }
    }

    pub(crate) fn write(&mut self, id: Id, data: Vec<u8>, cx: &mut Context) -> Result<()> {
        match self.state {
            State::Closing | State::Closed => return Err(Error::Closing(id)),
            State::Connecting if self.linger => return Err(Error::Closing(id)),
            _ => {}
        }
        if data.is_empty() {
            return Ok(());
        }
        if self.wbuf.is_empty() && self.state == State::Connected {
            cx.poller.add_writer(&self.conn, id)?;
        }
        self.wbuf.push(data);
        Ok(())
    }

    /// Closes once every queued byte has been written. A connect still in
    /// progress is abandoned only when nothing is queued; otherwise the
    /// stream closes after the connect completes and the bytes are out.
    pub(crate) fn close(&mut self, id: Id, cx: &mut Context) -> Result<Status> {
        match self.state {
            State::Closing => Ok(Status::Alive),
            State::Closed => Ok(Status::Gone),
            State::Connecting if self.linger => Ok(Status::Alive),
            State::Connecting => {
                if self.wbuf.is_empty() {
                    return Ok(self.finish_close(id, cx));
                }
                debug!("{} closing after connect with {} bytes pending", id, self.wbuf.len());
                self.linger = true;
                Ok(Status::Alive)
            }
            State::Connected => {
                if self.wbuf.is_empty() {
                    return Ok(self.finish_close(id, cx));
                }
                debug!("{} closing with {} bytes pending", id, self.wbuf.len());
                cx.poller.remove_reader(&self.conn)?;
                self.state = State::Closing;
                Ok(Status::Alive)
            }
        }
    }

    fn finish_connect(&mut self, id: Id, cx: &mut Context) -> Status {
        match self.conn.take_error() {
            Ok(None) => {}
            Ok(Some(e)) | Err(e) => return self.fail(id, e.into(), cx),
        }
        match self.conn.is_connected() {
            Ok(true) => {}
            Ok(false) => return Status::Alive,
            Err(e) => return self.fail(id, e.into(), cx),
        }
        let interest = match (self.linger, self.wbuf.is_empty()) {
            (true, _) => Ops::WRITE,
            (false, true) => Ops::READ,
            (false, false) => Ops::READ | Ops::WRITE,
        };
        if let Err(e) = cx.poller.reregister(&self.conn, interest, id) {
            return self.fail(id, e.into(), cx);
        }
        self.state = match self.linger {
            true => State::Closing,
            false => State::Connected,
        };
        debug!("{} connected to {}", id, self.peer);
        cx.emit(NetEvent::Connected {
            conn: id,
            peer: self.peer.clone(),
        });
        Status::Alive
    }

    fn read(&mut self, id: Id, cx: &mut Context) -> Status {
        let mut data = vec![0; cx.read_size];
        match self.conn.read(&mut data) {
            Ok(0) => {
                debug!("{} disconnected by {}", id, self.peer);
                self.state = State::Closed;
                cx.emit(NetEvent::Disconnected {
                    conn: id,
                    server: self.server,
                });
                Status::Gone
            }
            Ok(n) => {
                data.truncate(n);
                cx.emit(NetEvent::Read { conn: id, data });
                Status::Alive
            }
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                Status::Alive
            }
            Err(e) => self.fail(id, e.into(), cx),
        }
    }

    fn flush(&mut self, id: Id, cx: &mut Context) -> Status {
        match self.wbuf.flush_to(&mut self.conn) {
            Ok(true) => {}
            Ok(false) => return Status::Alive,
            Err(e) => return self.fail(id, e.into(), cx),
        }
        if self.state == State::Closing {
            return self.finish_close(id, cx);
        }
        if let Err(e) = cx.poller.remove_writer(&self.conn) {
            return self.fail(id, e.into(), cx);
        }
        cx.emit(NetEvent::Drained { id });
        Status::Alive
    }

    fn finish_close(&mut self, id: Id, cx: &mut Context) -> Status {
        if let Err(e) = self.conn.shutdown(Shutdown::Both) {
            if e.kind() != io::ErrorKind::NotConnected {
                debug!("{} shutdown: {}", id, e);
            }
        }
        self.state = State::Closed;
        cx.emit(NetEvent::Closed { id });
        Status::Gone
    }

    fn fail(&mut self, id: Id, error: Error, cx: &mut Context) -> Status {
        debug!("{} failed: {}", id, error);
        self.state = State::Closed;
        self.wbuf.clear();
        cx.emit(NetEvent::Error { id, error });
        cx.emit(NetEvent::Disconnected {
            conn: id,
            server: self.server,
        });
        Status::Gone
    }
}

impl AsRawFd for Stream {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.conn.as_raw_fd()
    }
}
