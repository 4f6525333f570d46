use std::fmt;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use err::{Error, Result};
use net::{Addr, Id, NetEvent};
use reactor::{Config, Reactor, Remote};
use service::Handler;

/// A listener and the connections it accepts, driven by one reactor.
pub struct Server {
    reactor: Reactor,
    id: Id,
    local_addr: Addr,
}

impl Server {
    #[inline]
    pub fn bind(addr: &Addr) -> Result<Self> {
        Self::with_config(addr, Config::default())
    }

    pub fn with_config(addr: &Addr, config: Config) -> Result<Self> {
        let mut reactor = Reactor::with_config(config)?;
        let id = reactor.listen(addr)?;
        let local_addr = reactor.local_addr(id)?;
        Ok(Server {
            reactor,
            id,
            local_addr,
        })
    }

    /// Runs a server on its own thread.
    ///
    /// The reactor is built inside the thread; binding errors are returned
    /// here. Dropping the returned handle stops the server and waits for
    /// the thread.
    pub fn spawn<H>(addr: Addr, config: Config, mut handler: H) -> Result<ServerHandle>
    where
        H: Handler + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let join_handle = thread::Builder::new()
            .name(format!("nexio-server-{}", addr))
            .spawn(move || {
                let mut server = match Server::with_config(&addr, config) {
                    Ok(server) => server,
                    Err(e) => {
                        tx.send(Err(e)).ok();
                        return Ok(());
                    }
                };
                let started = (server.local_addr.clone(), server.remote());
                if tx.send(Ok(started)).is_err() {
                    return Ok(());
                }
                server.run(&mut handler)
            })?;
        let (local_addr, remote) = match rx.recv() {
            Ok(Ok(started)) => started,
            Ok(Err(e)) => {
                join_handle.join().ok();
                return Err(e);
            }
            Err(_) => {
                join_handle.join().ok();
                return Err(Error::Disconnected);
            }
        };
        Ok(ServerHandle {
            local_addr,
            remote,
            join_handle: Some(join_handle),
        })
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// The bound address; a requested port 0 is resolved.
    #[inline]
    pub fn local_addr(&self) -> &Addr {
        &self.local_addr
    }

    #[inline]
    pub fn write<B: Into<Vec<u8>>>(&mut self, conn: Id, data: B) -> Result<()> {
        self.reactor.write(conn, data)
    }

    #[inline]
    pub fn broadcast<B: Into<Vec<u8>>>(&mut self, data: B) -> Result<usize> {
        self.reactor.broadcast(self.id, data)
    }

    #[inline]
    pub fn close(&mut self, conn: Id) -> Result<()> {
        self.reactor.close(conn)
    }

    #[inline]
    pub fn connections(&self) -> Vec<Id> {
        self.reactor.connections(self.id)
    }

    #[inline]
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<usize> {
        self.reactor.poll(timeout)
    }

    #[inline]
    pub fn next_event(&mut self) -> Option<NetEvent> {
        self.reactor.next_event()
    }

    #[inline]
    pub fn run<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        self.reactor.run(handler)
    }

    #[inline]
    pub fn remote(&self) -> Remote {
        self.reactor.remote()
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

impl fmt::Display for Server {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Server({})", self.local_addr)
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Server {{ id: {}, local_addr: {}, reactor: {:?} }}",
            self.id, self.local_addr, self.reactor
        )
    }
}

/// A server running on its own thread.
pub struct ServerHandle {
    local_addr: Addr,
    remote: Remote,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl ServerHandle {
    #[inline]
    pub fn local_addr(&self) -> &Addr {
        &self.local_addr
    }

    #[inline]
    pub fn remote(&self) -> Remote {
        self.remote.clone()
    }

    /// Asks the server to stop. `Ok` also when it already stopped.
    pub fn stop(&self) -> Result<()> {
        match self.remote.stop() {
            Err(Error::Disconnected) => Ok(()),
            res => res,
        }
    }

    /// Waits for the server thread and returns how its loop ended.
    pub fn join(mut self) -> Result<()> {
        self.wait()
    }

    fn wait(&mut self) -> Result<()> {
        match self.join_handle.take() {
            Some(join_handle) => match join_handle.join() {
                Ok(res) => res,
                Err(_) => {
                    error!("server thread of {} panicked", self.local_addr);
                    Err(Error::Disconnected)
                }
            },
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.join_handle.is_none() {
            return;
        }
        if let Err(e) = self.stop() {
            error!("failed to stop server on {}: {}", self.local_addr, e);
        }
        if let Err(e) = self.wait() {
            error!("server on {} ended with {}", self.local_addr, e);
        }
    }
}

impl fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ServerHandle {{ local_addr: {} }}", self.local_addr)
    }
}
