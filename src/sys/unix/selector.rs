use std::fmt;
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use nio::{Event, Ops, PollerKind};

#[cfg(any(target_os = "linux", target_os = "android"))]
use super::epoll;
#[cfg(any(target_os = "dragonfly", target_os = "freebsd", target_os = "ios",
          target_os = "macos", target_os = "netbsd", target_os = "openbsd"))]
use super::kqueue;
use super::{poll, select};

pub(crate) enum Selector {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Epoll(epoll::Selector),
    #[cfg(any(target_os = "dragonfly", target_os = "freebsd", target_os = "ios",
              target_os = "macos", target_os = "netbsd", target_os = "openbsd"))]
    Kqueue(kqueue::Selector),
    Poll(poll::Selector),
    Select(select::Selector),
}

macro_rules! dispatch {
    ($selector:expr, $inner:ident => $call:expr) => {
        match *$selector {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Selector::Epoll(ref $inner) => $call,
            #[cfg(any(target_os = "dragonfly", target_os = "freebsd", target_os = "ios",
                      target_os = "macos", target_os = "netbsd", target_os = "openbsd"))]
            Selector::Kqueue(ref $inner) => $call,
            Selector::Poll(ref $inner) => $call,
            Selector::Select(ref $inner) => $call,
        }
    };
}

impl Selector {
    pub(crate) fn new(kind: PollerKind) -> io::Result<Self> {
        match kind {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            PollerKind::Epoll => Ok(Selector::Epoll(epoll::Selector::new()?)),
            #[cfg(any(target_os = "dragonfly", target_os = "freebsd", target_os = "ios",
                      target_os = "macos", target_os = "netbsd", target_os = "openbsd"))]
            PollerKind::Kqueue => Ok(Selector::Kqueue(kqueue::Selector::new()?)),
            PollerKind::Poll => Ok(Selector::Poll(poll::Selector::new()?)),
            PollerKind::Select => Ok(Selector::Select(select::Selector::new()?)),
            #[allow(unreachable_patterns)]
            _ => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("unsupported poller: {}", kind),
            )),
        }
    }

    #[inline]
    pub(crate) fn kind(&self) -> PollerKind {
        match *self {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Selector::Epoll(..) => PollerKind::Epoll,
            #[cfg(any(target_os = "dragonfly", target_os = "freebsd", target_os = "ios",
                      target_os = "macos", target_os = "netbsd", target_os = "openbsd"))]
            Selector::Kqueue(..) => PollerKind::Kqueue,
            Selector::Poll(..) => PollerKind::Poll,
            Selector::Select(..) => PollerKind::Select,
        }
    }

    #[inline]
    pub(crate) fn register(&self, fd: RawFd, token: usize, interest: Ops) -> io::Result<()> {
        dispatch!(self, s => s.register(fd, token, interest))
    }

    #[inline]
    pub(crate) fn reregister(&self, fd: RawFd, token: usize, old: Ops, new: Ops) -> io::Result<()> {
        dispatch!(self, s => s.reregister(fd, token, old, new))
    }

    #[inline]
    pub(crate) fn deregister(&self, fd: RawFd, old: Ops) -> io::Result<()> {
        dispatch!(self, s => s.deregister(fd, old))
    }

    #[inline]
    pub(crate) fn select(
        &self,
        events: &mut Vec<Event>,
        cap: usize,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        dispatch!(self, s => s.select(events, cap, timeout))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        dispatch!(self, s => s.fmt(f))
    }
}
