use std::net::SocketAddr;

use err::Error;
use net::{Addr, Id, NetEvent};
use reactor::Reactor;

/// Application callbacks driven by `Reactor::run`.
///
/// Every callback gets the reactor, so it can write, close or stop from
/// inside the loop. Only `on_error` does something by default: it logs.
pub trait Handler {
    fn on_ready(&mut self, _reactor: &mut Reactor, _id: Id, _addr: &Addr) {}

    fn on_accept(&mut self, _reactor: &mut Reactor, _server: Id, _conn: Id, _peer: &Addr) {}

    fn on_connect(&mut self, _reactor: &mut Reactor, _conn: Id, _peer: &Addr) {}

    fn on_read(&mut self, _reactor: &mut Reactor, _conn: Id, _data: Vec<u8>) {}

    fn on_read_from(
        &mut self,
        _reactor: &mut Reactor,
        _id: Id,
        _peer: SocketAddr,
        _data: Vec<u8>,
    ) {
    }

    fn on_drain(&mut self, _reactor: &mut Reactor, _id: Id) {}

    fn on_disconnect(&mut self, _reactor: &mut Reactor, _conn: Id, _server: Option<Id>) {}

    fn on_close(&mut self, _reactor: &mut Reactor, _id: Id) {}

    fn on_error(&mut self, _reactor: &mut Reactor, id: Id, error: Error) {
        error!("{}: {}", id, error);
    }

    /// Routes `event` to the matching callback.
    fn on_event(&mut self, reactor: &mut Reactor, event: NetEvent) {
        match event {
            NetEvent::Ready { id, addr } => self.on_ready(reactor, id, &addr),
            NetEvent::Accepted { server, conn, peer } => {
                self.on_accept(reactor, server, conn, &peer)
            }
            NetEvent::Connected { conn, peer } => self.on_connect(reactor, conn, &peer),
            NetEvent::Read { conn, data } => self.on_read(reactor, conn, data),
            NetEvent::ReadFrom { id, peer, data } => self.on_read_from(reactor, id, peer, data),
            NetEvent::Drained { id } => self.on_drain(reactor, id),
            NetEvent::Disconnected { conn, server } => self.on_disconnect(reactor, conn, server),
            NetEvent::Closed { id } => self.on_close(reactor, id),
            NetEvent::Error { id, error } => self.on_error(reactor, id, error),
        }
    }
}

impl<'a, H: Handler + ?Sized> Handler for &'a mut H {
    fn on_ready(&mut self, reactor: &mut Reactor, id: Id, addr: &Addr) {
        (**self).on_ready(reactor, id, addr)
    }

    fn on_accept(&mut self, reactor: &mut Reactor, server: Id, conn: Id, peer: &Addr) {
        (**self).on_accept(reactor, server, conn, peer)
    }

    fn on_connect(&mut self, reactor: &mut Reactor, conn: Id, peer: &Addr) {
        (**self).on_connect(reactor, conn, peer)
    }

    fn on_read(&mut self, reactor: &mut Reactor, conn: Id, data: Vec<u8>) {
        (**self).on_read(reactor, conn, data)
    }

    fn on_read_from(&mut self, reactor: &mut Reactor, id: Id, peer: SocketAddr, data: Vec<u8>) {
        (**self).on_read_from(reactor, id, peer, data)
    }

    fn on_drain(&mut self, reactor: &mut Reactor, id: Id) {
        (**self).on_drain(reactor, id)
    }

    fn on_disconnect(&mut self, reactor: &mut Reactor, conn: Id, server: Option<Id>) {
        (**self).on_disconnect(reactor, conn, server)
    }

    fn on_close(&mut self, reactor: &mut Reactor, id: Id) {
        (**self).on_close(reactor, id)
    }

    fn on_error(&mut self, reactor: &mut Reactor, id: Id, error: Error) {
        (**self).on_error(reactor, id, error)
    }

    fn on_event(&mut self, reactor: &mut Reactor, event: NetEvent) {
        (**self).on_event(reactor, event)
    }
}
