//! Socket components: one OS channel each, turning readiness events into
//! buffered I/O and `NetEvent`s.

mod addr;
pub use self::addr::{Addr, AddrParseError};

mod event;
pub use self::event::NetEvent;

mod stream;
pub(crate) use self::stream::{Conn, Stream};

mod listener;
pub(crate) use self::listener::{Acceptor, Listener};

mod datagram;
pub(crate) use self::datagram::Datagram;

use std::collections::VecDeque;

use nio::{Poller, Token};

/// Identifies a socket component within its reactor. It doubles as the
/// component's poller token.
pub type Id = Token;

/// What a component borrows from its reactor while handling a call.
pub(crate) struct Context<'a> {
    pub(crate) poller: &'a Poller,
    pub(crate) events: &'a mut VecDeque<NetEvent>,
    pub(crate) read_size: usize,
}

impl<'a> Context<'a> {
    #[inline]
    pub(crate) fn emit(&mut self, event: NetEvent) {
        trace!("emit {:?}", event);
        self.events.push_back(event);
    }
}

/// Whether a component survived the call. `Gone` components are removed
/// from the reactor right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Alive,
    Gone,
}

impl Status {
    #[inline]
    pub(crate) fn is_gone(self) -> bool {
        self == Status::Gone
    }
}
