//! The event loop: a poller plus a registry of socket components.

mod config;
pub use self::config::Config;

mod remote;
pub use self::remote::Remote;
use self::remote::Command;

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use err::{Error, Result};
use net::{Acceptor, Addr, Conn, Context, Datagram, Id, Listener, NetEvent, Status, Stream};
use nio::{self, Awakener, Event, Events, Ops, Poller, TcpListener, TcpStream, UdpSocket,
          UnixListener, UnixStream};
use service::Handler;
use slab::Slab;

const AWAKENER: usize = ::std::usize::MAX - 1;

#[derive(Debug)]
enum Socket {
    Stream(Stream),
    Listener(Listener),
    Datagram(Datagram),
}

impl AsRawFd for Socket {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        match *self {
            Socket::Stream(ref s) => s.as_raw_fd(),
            Socket::Listener(ref l) => l.as_raw_fd(),
            Socket::Datagram(ref d) => d.as_raw_fd(),
        }
    }
}

/// Owns a `Poller` and every socket component registered with it.
///
/// A reactor is driven by one thread: either step by step with `poll` and
/// `next_event`, or with `run`, which hands every event to a `Handler`.
/// Other threads talk to it through a `Remote`.
pub struct Reactor {
    poller: Poller,
    events: Events,
    sockets: Slab<Socket, Id>,
    queue: VecDeque<NetEvent>,
    removed: HashSet<Id>,
    config: Config,
    awakener: Arc<Awakener>,
    tx: Sender<Command>,
    rx: Receiver<Command>,
    stopped: bool,
}

impl Reactor {
    #[inline]
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let poller = Poller::with_kind(config.poller)?;
        let awakener = Arc::new(Awakener::new()?);
        poller.register(&*awakener, Ops::READ, AWAKENER.into())?;
        let (tx, rx) = mpsc::channel();
        Ok(Reactor {
            events: Events::with_capacity(config.events_capacity),
            poller,
            sockets: Slab::new(),
            queue: VecDeque::new(),
            removed: HashSet::new(),
            config,
            awakener,
            tx,
            rx,
            stopped: false,
        })
    }

    /// Binds a TCP or UNIX listener, or a UDP socket, and queues `Ready`.
    pub fn listen(&mut self, addr: &Addr) -> Result<Id> {
        let (socket, local) = match *addr {
            Addr::Tcp(ref sa) => {
                let listener = TcpListener::builder()
                    .addr(*sa)
                    .backlog(self.config.backlog)
                    .ttl(self.config.ttl)
                    .only_v6(self.config.only_v6)
                    .reuse_address(self.config.reuse_address)
                    .build()?;
                let local = Addr::Tcp(listener.local_addr()?);
                let socket = Listener::new(Acceptor::Tcp(listener), local.clone());
                (Socket::Listener(socket), local)
            }
            Addr::Unix(ref path) => {
                let listener = UnixListener::bind(path)?;
                let socket = Listener::new(Acceptor::Unix(listener), addr.clone());
                (Socket::Listener(socket), addr.clone())
            }
            Addr::Udp(ref sa) => {
                let sock = UdpSocket::bind(sa, self.config.reuse_address, self.config.broadcast)?;
                if let Some(ttl) = self.config.ttl {
                    sock.set_ttl(ttl)?;
                }
                let local = Addr::Udp(sock.local_addr()?);
                (Socket::Datagram(Datagram::new(sock, None)), local)
            }
        };
        let id = self.insert(socket)?;
        info!("{} listening on {}", id, local);
        self.emit(NetEvent::Ready { id, addr: local });
        Ok(id)
    }

    /// Starts connecting to `addr`. Stream connections queue `Connected`
    /// once established; UDP sockets bind an ephemeral port and queue
    /// `Ready` and `Connected` right away.
    pub fn connect(&mut self, addr: &Addr) -> Result<Id> {
        match *addr {
            Addr::Tcp(ref sa) => {
                let (sock, connected) = TcpStream::connect(sa)?;
                if self.config.nodelay {
                    sock.set_nodelay(true)?;
                }
                let stream = match connected {
                    true => Stream::connected(Conn::Tcp(sock), addr.clone(), None),
                    false => Stream::connecting(Conn::Tcp(sock), addr.clone()),
                };
                let id = self.insert(Socket::Stream(stream))?;
                debug!("{} connecting to {}", id, addr);
                if connected {
                    self.emit(NetEvent::Connected {
                        conn: id,
                        peer: addr.clone(),
                    });
                }
                Ok(id)
            }
            Addr::Unix(ref path) => {
                let sock = UnixStream::connect(path)?;
                let stream = Stream::connected(Conn::Unix(sock), addr.clone(), None);
                let id = self.insert(Socket::Stream(stream))?;
                debug!("{} connected to {}", id, addr);
                self.emit(NetEvent::Connected {
                    conn: id,
                    peer: addr.clone(),
                });
                Ok(id)
            }
            Addr::Udp(ref sa) => {
                let sock = UdpSocket::bind(&nio::unspecified_like(sa), false, self.config.broadcast)?;
                sock.connect(sa)?;
                let local = Addr::Udp(sock.local_addr()?);
                let id = self.insert(Socket::Datagram(Datagram::new(sock, Some(*sa))))?;
                debug!("{} bound {} for {}", id, local, addr);
                self.emit(NetEvent::Ready { id, addr: local });
                self.emit(NetEvent::Connected {
                    conn: id,
                    peer: addr.clone(),
                });
                Ok(id)
            }
        }
    }

    /// Queues `data` on a stream, or sends it to a connected UDP peer.
    pub fn write<B: Into<Vec<u8>>>(&mut self, id: Id, data: B) -> Result<()> {
        let data = data.into();
        let (sockets, mut cx) = self.split();
        match sockets.get_mut(id) {
            Some(&mut Socket::Stream(ref mut s)) => s.write(id, data, &mut cx),
            Some(&mut Socket::Datagram(ref mut d)) => d.write(id, data, &mut cx),
            Some(&mut Socket::Listener(_)) => Err(Error::Unsupported(id, "write")),
            None => Err(Error::UnknownSocket(id)),
        }
    }

    pub fn send_to<B: Into<Vec<u8>>>(&mut self, id: Id, peer: SocketAddr, data: B) -> Result<()> {
        let data = data.into();
        let (sockets, mut cx) = self.split();
        match sockets.get_mut(id) {
            Some(&mut Socket::Datagram(ref mut d)) => d.send_to(id, peer, data, &mut cx),
            Some(_) => Err(Error::Unsupported(id, "send_to")),
            None => Err(Error::UnknownSocket(id)),
        }
    }

    /// Writes `data` to every live connection of `server` and returns how
    /// many took it. Connections that are already closing are skipped.
    pub fn broadcast<B: Into<Vec<u8>>>(&mut self, server: Id, data: B) -> Result<usize> {
        let conns = match self.sockets.get(server) {
            Some(&Socket::Listener(ref l)) => l.conns(),
            Some(_) => return Err(Error::Unsupported(server, "broadcast")),
            None => return Err(Error::UnknownSocket(server)),
        };
        let data = data.into();
        let mut n = 0;
        for conn in conns {
            match self.write(conn, data.clone()) {
                Ok(()) => n += 1,
                Err(Error::Closing(_)) => {}
                Err(e) => self.emit(NetEvent::Error { id: conn, error: e }),
            }
        }
        Ok(n)
    }

    /// Closes a socket. Streams flush their queued bytes first; listeners
    /// close every connection they accepted, then themselves.
    pub fn close(&mut self, id: Id) -> Result<()> {
        let conns = match self.sockets.get(id) {
            Some(&Socket::Listener(ref l)) => l.conns(),
            Some(_) => Vec::new(),
            None => return Err(Error::UnknownSocket(id)),
        };
        for conn in conns {
            if let Err(e) = self.close(conn) {
                self.emit(NetEvent::Error { id: conn, error: e });
            }
            // still flushing; its listener id may be reused from here on
            if let Some(&mut Socket::Stream(ref mut s)) = self.sockets.get_mut(conn) {
                s.orphan();
            }
        }
        let status = {
            let (sockets, mut cx) = self.split();
            match sockets.get_mut(id) {
                Some(&mut Socket::Stream(ref mut s)) => s.close(id, &mut cx)?,
                Some(&mut Socket::Datagram(ref mut d)) => d.close(id, &mut cx),
                Some(&mut Socket::Listener(_)) => {
                    cx.emit(NetEvent::Closed { id });
                    Status::Gone
                }
                None => return Err(Error::UnknownSocket(id)),
            }
        };
        if status.is_gone() {
            self.remove(id);
            debug!("{} closed", id);
        }
        Ok(())
    }

    /// Waits for readiness and turns it into `NetEvent`s.
    ///
    /// Does not block while events are still queued. Returns the number of
    /// queued events.
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<usize> {
        let timeout = match self.queue.is_empty() {
            true => timeout,
            false => Some(Duration::from_millis(0)),
        };
        self.removed.clear();
        let n = self.poller.poll(&mut self.events, timeout)?;
        for i in 0..n {
            if let Some(event) = self.events.get(i) {
                self.dispatch(&event)?;
            }
        }
        Ok(self.queue.len())
    }

    #[inline]
    pub fn next_event(&mut self) -> Option<NetEvent> {
        self.queue.pop_front()
    }

    /// Polls and dispatches events to `handler` until stopped or until no
    /// socket is left.
    pub fn run<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        info!("{} started", self);
        loop {
            while !self.stopped {
                match self.queue.pop_front() {
                    Some(event) => handler.on_event(self, event),
                    None => break,
                }
            }
            if self.stopped || self.sockets.is_empty() {
                break;
            }
            let timeout = self.config.poll_timeout;
            self.poll(timeout)?;
        }
        info!("{} stopped", self);
        Ok(())
    }

    /// Makes `run` return after the event being handled.
    #[inline]
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of open sockets.
    #[inline]
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: Id) -> bool {
        self.sockets.contains(id)
    }

    /// Live connections accepted by `server`, in id order. Empty unless
    /// `server` is a listener.
    pub fn connections(&self, server: Id) -> Vec<Id> {
        match self.sockets.get(server) {
            Some(&Socket::Listener(ref l)) => l.conns(),
            _ => Vec::new(),
        }
    }

    pub fn local_addr(&self, id: Id) -> Result<Addr> {
        match self.sockets.get(id) {
            Some(&Socket::Stream(ref s)) => Ok(s.conn().local_addr()?),
            Some(&Socket::Listener(ref l)) => Ok(l.addr().clone()),
            Some(&Socket::Datagram(ref d)) => Ok(Addr::Udp(d.local_addr()?)),
            None => Err(Error::UnknownSocket(id)),
        }
    }

    pub fn peer_addr(&self, id: Id) -> Result<Addr> {
        match self.sockets.get(id) {
            Some(&Socket::Stream(ref s)) => Ok(s.peer().clone()),
            Some(&Socket::Datagram(ref d)) => match d.peer() {
                Some(peer) => Ok(Addr::Udp(peer)),
                None => Err(Error::Unsupported(id, "peer_addr")),
            },
            Some(&Socket::Listener(_)) => Err(Error::Unsupported(id, "peer_addr")),
            None => Err(Error::UnknownSocket(id)),
        }
    }

    /// Bytes queued on a stream and not yet written.
    pub fn pending(&self, id: Id) -> Result<usize> {
        match self.sockets.get(id) {
            Some(&Socket::Stream(ref s)) => Ok(s.pending()),
            Some(_) => Ok(0),
            None => Err(Error::UnknownSocket(id)),
        }
    }

    #[inline]
    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn remote(&self) -> Remote {
        Remote::new(self.tx.clone(), self.awakener.clone())
    }

    fn dispatch(&mut self, event: &Event) -> Result<()> {
        let id = event.token();
        if usize::from(id) == AWAKENER {
            self.awakener.reset()?;
            self.execute_commands();
            return Ok(());
        }
        if self.removed.contains(&id) {
            trace!("{:?} ignored, {} is gone", event, id);
            return Ok(());
        }
        let mut accepted = Vec::new();
        let status = {
            let (sockets, mut cx) = self.split();
            match sockets.get_mut(id) {
                Some(&mut Socket::Stream(ref mut s)) => s.ready(id, event, &mut cx),
                Some(&mut Socket::Datagram(ref mut d)) => d.ready(id, event, &mut cx),
                Some(&mut Socket::Listener(ref mut l)) => {
                    accepted = l.ready(id, &mut cx);
                    Status::Alive
                }
                None => {
                    trace!("{:?} ignored, {} is unknown", event, id);
                    Status::Alive
                }
            }
        };
        if status.is_gone() {
            self.remove(id);
        }
        for (conn, peer) in accepted {
            self.adopt(id, conn, peer);
        }
        Ok(())
    }

    fn adopt(&mut self, server: Id, conn: Conn, peer: Addr) {
        let num_conns = match self.sockets.get(server) {
            Some(&Socket::Listener(ref l)) => l.num_conns(),
            _ => return,
        };
        if let Some(max) = self.config.max_connections {
            if num_conns >= max {
                warn!(
                    "{} drops {} to not exceed max_connections {}",
                    server, peer, max
                );
                return;
            }
        }
        if let Conn::Tcp(ref s) = conn {
            if self.config.nodelay {
                if let Err(e) = s.set_nodelay(true) {
                    warn!("{} failed to set TCP_NODELAY on {}: {}", server, peer, e);
                }
            }
        }
        let stream = Stream::connected(conn, peer.clone(), Some(server));
        let id = match self.insert(Socket::Stream(stream)) {
            Ok(id) => id,
            Err(e) => {
                self.emit(NetEvent::Error {
                    id: server,
                    error: e,
                });
                return;
            }
        };
        if let Some(&mut Socket::Listener(ref mut l)) = self.sockets.get_mut(server) {
            l.adopt(id);
        }
        debug!("{} accepted {} from {}", server, id, peer);
        self.emit(NetEvent::Accepted {
            server,
            conn: id,
            peer,
        });
    }

    fn execute_commands(&mut self) {
        while let Ok(cmd) = self.rx.try_recv() {
            trace!("{} executing {:?}", self, cmd);
            let res = match cmd {
                Command::Write(id, data) => self.write(id, data).map_err(|e| (id, e)),
                Command::SendTo(id, peer, data) => {
                    self.send_to(id, peer, data).map_err(|e| (id, e))
                }
                Command::Broadcast(id, data) => self.broadcast(id, data)
                    .map(|_| ())
                    .map_err(|e| (id, e)),
                Command::Close(id) => self.close(id).map_err(|e| (id, e)),
                Command::Stop => {
                    self.stop();
                    Ok(())
                }
            };
            if let Err((id, error)) = res {
                self.emit(NetEvent::Error { id, error });
            }
        }
    }

    fn insert(&mut self, socket: Socket) -> Result<Id> {
        let id = self.sockets.insert(socket);
        let res = match self.sockets[id] {
            Socket::Stream(ref s) => s.open(id, &self.poller),
            Socket::Listener(ref l) => l.open(id, &self.poller),
            Socket::Datagram(ref d) => d.open(id, &self.poller),
        };
        if let Err(e) = res {
            self.sockets.remove(id);
            return Err(e.into());
        }
        Ok(id)
    }

    fn remove(&mut self, id: Id) {
        let socket = match self.sockets.remove(id) {
            Some(socket) => socket,
            None => return,
        };
        if let Err(e) = self.poller.discard(&socket) {
            warn!("{} failed to deregister {}: {}", self, id, e);
        }
        if let Socket::Stream(ref s) = socket {
            if let Some(server) = s.server() {
                if let Some(&mut Socket::Listener(ref mut l)) = self.sockets.get_mut(server) {
                    l.forget(id);
                }
            }
        }
        self.removed.insert(id);
    }

    #[inline]
    fn emit(&mut self, event: NetEvent) {
        trace!("emit {:?}", event);
        self.queue.push_back(event);
    }

    #[inline]
    fn split(&mut self) -> (&mut Slab<Socket, Id>, Context) {
        (
            &mut self.sockets,
            Context {
                poller: &self.poller,
                events: &mut self.queue,
                read_size: self.config.read_size,
            },
        )
    }
}

impl fmt::Display for Reactor {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Reactor({})", self.poller.kind())
    }
}

impl fmt::Debug for Reactor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Reactor {{ poller: {:?}, sockets: {}, queued: {}, stopped: {} }}",
            self.poller,
            self.sockets.len(),
            self.queue.len(),
            self.stopped
        )
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        for (id, socket) in self.sockets.iter() {
            if let Err(e) = self.poller.discard(socket) {
                error!("{} failed to deregister {}: {}", self, id, e);
            }
        }
    }
}
