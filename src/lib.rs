//! Networking components: non-blocking sockets and pollers for building
//! client and server network applications.
//!
//! The crate is layered leaf-first:
//!
//! * [`nio`](nio/index.html): the `Poller` over select/poll/epoll/kqueue,
//!   non-blocking channels and the cross-thread `Awakener`.
//! * [`reactor`](reactor/index.html): a poller plus a registry of socket
//!   components turning readiness into `NetEvent`s.
//! * [`service`](service/index.html): `Client` and `Server` wrappers that
//!   drive a reactor and dispatch events to a `Handler`.

#[macro_use]
extern crate log;

#[cfg(unix)]
extern crate libc;

#[macro_use]
extern crate bitflags;

#[macro_use]
extern crate failure;

extern crate net2;

use std::time::Duration;

pub fn into_millis(dur: Duration) -> u64 {
    const NANOS_PER_MILLI: u32 = 1_000_000;
    const MILLIS_PER_SEC: u64 = 1_000;

    let millis = (dur.subsec_nanos() + NANOS_PER_MILLI - 1) / NANOS_PER_MILLI;
    dur.as_secs()
        .saturating_mul(MILLIS_PER_SEC)
        .saturating_add(millis as u64)
}

mod err;
pub use self::err::{Error, Result};

pub mod slab;

mod sys;

pub mod buf;
pub mod nio;
pub mod net;
pub mod reactor;
pub mod service;

pub use net::{Addr, Id, NetEvent};
pub use reactor::{Config, Reactor, Remote};
pub use service::{Client, Handler, Server, ServerHandle};
