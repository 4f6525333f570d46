use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::slice;
use std::time::Duration;

use sys;

bitflags! {
    /// Interest in, or readiness for, read and write operations.
    pub struct Ops: u8 {
        const READ  = 0b01;
        const WRITE = 0b10;
    }
}

impl Ops {
    #[inline]
    pub fn contains_read(self) -> bool {
        self.contains(Ops::READ)
    }

    #[inline]
    pub fn contains_write(self) -> bool {
        self.contains(Ops::WRITE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token {
    val: usize,
}

impl From<usize> for Token {
    #[inline]
    fn from(val: usize) -> Self {
        Token { val }
    }
}

impl From<Token> for usize {
    #[inline]
    fn from(token: Token) -> Self {
        token.val
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.val)
    }
}

/// Anything backed by a file descriptor can be watched by a `Poller`.
pub trait Pollable: AsRawFd + fmt::Debug {}

impl<T: AsRawFd + fmt::Debug> Pollable for T {}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Event {
    token: Token,
    ready_ops: Ops,
    hup: bool,
    error: bool,
}

impl Event {
    #[inline]
    pub(crate) fn new(token: usize, ready_ops: Ops, hup: bool, error: bool) -> Self {
        Event {
            token: Token::from(token),
            ready_ops,
            hup,
            error,
        }
    }

    #[inline]
    pub fn token(&self) -> Token {
        self.token
    }

    #[inline]
    pub fn ready_ops(&self) -> Ops {
        self.ready_ops
    }

    #[inline]
    pub fn is_readable(&self) -> bool {
        self.ready_ops.contains_read()
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.ready_ops.contains_write()
    }

    /// The peer hung up, or the channel was shut down for reading.
    #[inline]
    pub fn is_hup(&self) -> bool {
        self.hup
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.error
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Event {{ {:?}, {:?}", self.token, self.ready_ops)?;
        if self.hup {
            write!(f, ", hup")?;
        }
        if self.error {
            write!(f, ", error")?;
        }
        write!(f, " }}")
    }
}

#[derive(Debug)]
pub struct Events {
    inner: Vec<Event>,
    cap: usize,
}

impl Events {
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        let cap = if cap == 0 { 1 } else { cap };
        Events {
            inner: Vec::with_capacity(cap),
            cap,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Maximum number of events a single poll may return.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<Event> {
        self.inner.get(idx).cloned()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<Event> {
        self.inner.iter()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<'a> IntoIterator for &'a Events {
    type Item = &'a Event;
    type IntoIter = slice::Iter<'a, Event>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// The OS readiness-notification mechanism behind a `Poller`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollerKind {
    Select,
    Poll,
    Epoll,
    Kqueue,
}

impl PollerKind {
    /// The most scalable mechanism of this platform.
    #[inline]
    pub fn best() -> Self {
        sys::BEST_POLLER
    }

    #[inline]
    pub fn available() -> &'static [PollerKind] {
        sys::AVAILABLE_POLLERS
    }

    #[inline]
    pub fn is_available(self) -> bool {
        Self::available().contains(&self)
    }
}

impl Default for PollerKind {
    #[inline]
    fn default() -> Self {
        Self::best()
    }
}

impl fmt::Display for PollerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            PollerKind::Select => "select",
            PollerKind::Poll => "poll",
            PollerKind::Epoll => "epoll",
            PollerKind::Kqueue => "kqueue",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    token: Token,
    interest: Ops,
}

/// Waits for readiness on a set of registered channels.
///
/// The poller remembers every registered channel together with its token
/// and interest, so interest can be adjusted one operation at a time with
/// `add_reader`, `remove_writer` and friends. The bookkeeping only changes
/// after the kernel accepted the change.
pub struct Poller {
    selector: sys::Selector,
    registry: RefCell<HashMap<RawFd, Registration>>,
}

impl Poller {
    #[inline]
    pub fn new() -> io::Result<Self> {
        Self::with_kind(PollerKind::best())
    }

    pub fn with_kind(kind: PollerKind) -> io::Result<Self> {
        Ok(Poller {
            selector: sys::Selector::new(kind)?,
            registry: RefCell::new(HashMap::new()),
        })
    }

    #[inline]
    pub fn kind(&self) -> PollerKind {
        self.selector.kind()
    }

    #[inline]
    pub fn available_kinds() -> &'static [PollerKind] {
        PollerKind::available()
    }

    pub fn register<P>(&self, io: &P, interest: Ops, token: Token) -> io::Result<()>
    where
        P: Pollable + ?Sized,
    {
        let fd = io.as_raw_fd();
        if self.registry.borrow().contains_key(&fd) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{:?} is already registered", io),
            ));
        }
        self.selector.register(fd, token.into(), interest)?;
        self.registry
            .borrow_mut()
            .insert(fd, Registration { token, interest });
        trace!("{} registered {:?} with {:?} {:?}", self, io, token, interest);
        Ok(())
    }

    pub fn reregister<P>(&self, io: &P, interest: Ops, token: Token) -> io::Result<()>
    where
        P: Pollable + ?Sized,
    {
        let fd = io.as_raw_fd();
        let old = self.registration(io)?;
        if old.token == token && old.interest == interest {
            return Ok(());
        }
        self.selector
            .reregister(fd, token.into(), old.interest, interest)?;
        self.registry
            .borrow_mut()
            .insert(fd, Registration { token, interest });
        trace!("{} reregistered {:?} with {:?} {:?}", self, io, token, interest);
        Ok(())
    }

    pub fn deregister<P>(&self, io: &P) -> io::Result<()>
    where
        P: Pollable + ?Sized,
    {
        let fd = io.as_raw_fd();
        let old = self.registration(io)?;
        self.selector.deregister(fd, old.interest)?;
        self.registry.borrow_mut().remove(&fd);
        trace!("{} deregistered {:?}", self, io);
        Ok(())
    }

    #[inline]
    pub fn add_reader<P>(&self, io: &P, token: Token) -> io::Result<()>
    where
        P: Pollable + ?Sized,
    {
        self.add_interest(io, Ops::READ, token)
    }

    #[inline]
    pub fn add_writer<P>(&self, io: &P, token: Token) -> io::Result<()>
    where
        P: Pollable + ?Sized,
    {
        self.add_interest(io, Ops::WRITE, token)
    }

    #[inline]
    pub fn remove_reader<P>(&self, io: &P) -> io::Result<()>
    where
        P: Pollable + ?Sized,
    {
        self.remove_interest(io, Ops::READ)
    }

    #[inline]
    pub fn remove_writer<P>(&self, io: &P) -> io::Result<()>
    where
        P: Pollable + ?Sized,
    {
        self.remove_interest(io, Ops::WRITE)
    }

    /// Forgets `io` entirely. Unknown channels are ignored.
    pub fn discard<P>(&self, io: &P) -> io::Result<()>
    where
        P: Pollable + ?Sized,
    {
        match self.is_registered(io) {
            true => self.deregister(io),
            false => Ok(()),
        }
    }

    #[inline]
    pub fn is_registered<P>(&self, io: &P) -> bool
    where
        P: Pollable + ?Sized,
    {
        self.registry.borrow().contains_key(&io.as_raw_fd())
    }

    #[inline]
    pub fn is_reading<P>(&self, io: &P) -> bool
    where
        P: Pollable + ?Sized,
    {
        self.interest(io).map_or(false, Ops::contains_read)
    }

    #[inline]
    pub fn is_writing<P>(&self, io: &P) -> bool
    where
        P: Pollable + ?Sized,
    {
        self.interest(io).map_or(false, Ops::contains_write)
    }

    #[inline]
    pub fn interest<P>(&self, io: &P) -> Option<Ops>
    where
        P: Pollable + ?Sized,
    {
        self.registry
            .borrow()
            .get(&io.as_raw_fd())
            .map(|reg| reg.interest)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.registry.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.borrow().is_empty()
    }

    /// Blocks until a registered channel is ready or `timeout` elapses.
    ///
    /// The capacity of `events` is doubled whenever the previous poll
    /// filled it up. An interrupted wait is reported as zero events.
    pub fn poll(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<usize> {
        if events.inner.len() >= events.cap {
            events.cap <<= 1;
        }
        events.inner.clear();
        let cap = events.cap;
        match self.selector.select(&mut events.inner, cap, timeout) {
            Ok(()) => Ok(events.inner.len()),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                events.inner.clear();
                Ok(0)
            }
            Err(e) => {
                events.inner.clear();
                Err(e)
            }
        }
    }

    fn add_interest<P>(&self, io: &P, ops: Ops, token: Token) -> io::Result<()>
    where
        P: Pollable + ?Sized,
    {
        match self.interest(io) {
            Some(interest) => self.reregister(io, interest | ops, token),
            None => self.register(io, ops, token),
        }
    }

    fn remove_interest<P>(&self, io: &P, ops: Ops) -> io::Result<()>
    where
        P: Pollable + ?Sized,
    {
        let fd = io.as_raw_fd();
        let reg = match self.registry.borrow().get(&fd) {
            Some(reg) => *reg,
            None => return Ok(()),
        };
        self.reregister(io, reg.interest - ops, reg.token)
    }

    fn registration<P>(&self, io: &P) -> io::Result<Registration>
    where
        P: Pollable + ?Sized,
    {
        match self.registry.borrow().get(&io.as_raw_fd()) {
            Some(reg) => Ok(*reg),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{:?} is not registered", io),
            )),
        }
    }
}

impl fmt::Display for Poller {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Poller({})", self.kind())
    }
}

impl fmt::Debug for Poller {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Poller {{ kind: {}, registered: {} }}",
            self.kind(),
            self.len()
        )
    }
}
