use std::fmt;
use std::time::Duration;

use err::Result;
use net::{Addr, Id, NetEvent};
use reactor::{Config, Reactor};
use service::Handler;

/// One outgoing connection driven by its own reactor.
pub struct Client {
    reactor: Reactor,
    id: Id,
    peer: Addr,
}

impl Client {
    #[inline]
    pub fn connect(addr: &Addr) -> Result<Self> {
        Self::with_config(addr, Config::default())
    }

    pub fn with_config(addr: &Addr, config: Config) -> Result<Self> {
        let mut reactor = Reactor::with_config(config)?;
        let id = reactor.connect(addr)?;
        Ok(Client {
            reactor,
            id,
            peer: addr.clone(),
        })
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn peer_addr(&self) -> &Addr {
        &self.peer
    }

    #[inline]
    pub fn write<B: Into<Vec<u8>>>(&mut self, data: B) -> Result<()> {
        self.reactor.write(self.id, data)
    }

    #[inline]
    pub fn close(&mut self) -> Result<()> {
        self.reactor.close(self.id)
    }

    /// False once the connection is closed, disconnected or failed.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.reactor.contains(self.id)
    }

    #[inline]
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<usize> {
        self.reactor.poll(timeout)
    }

    #[inline]
    pub fn next_event(&mut self) -> Option<NetEvent> {
        self.reactor.next_event()
    }

    /// Runs until the connection is gone or the reactor is stopped.
    #[inline]
    pub fn run<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        self.reactor.run(handler)
    }

    #[inline]
    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    #[inline]
    pub fn reactor_mut(&mut self) -> &mut Reactor {
        &mut self.reactor
    }
}

impl fmt::Display for Client {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Client({})", self.peer)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Client {{ id: {}, peer: {}, reactor: {:?} }}",
            self.id, self.peer, self.reactor
        )
    }
}
