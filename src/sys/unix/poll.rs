use std::cell::RefCell;
use std::fmt;
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use libc;

use nio::{Event, Ops};
use sys::unix::cvt;

#[inline]
fn to_poll(interest: Ops) -> libc::c_short {
    let mut bits = 0;
    if interest.contains_read() {
        bits |= libc::POLLIN | libc::POLLPRI;
    }
    if interest.contains_write() {
        bits |= libc::POLLOUT;
    }
    bits
}

/// A negative `fd` in a `pollfd` makes the kernel skip it, so channels
/// without interest stay in place but report nothing.
#[inline]
fn pollfd(fd: RawFd, interest: Ops) -> libc::pollfd {
    libc::pollfd {
        fd: if interest.is_empty() { -1 } else { fd },
        events: to_poll(interest),
        revents: 0,
    }
}

struct Inner {
    pfds: Vec<libc::pollfd>,
    fds: Vec<RawFd>,
    tokens: Vec<usize>,
}

impl Inner {
    #[inline]
    fn position(&self, fd: RawFd) -> io::Result<usize> {
        self.fds.iter().position(|&f| f == fd).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("fd {} is not polled", fd))
        })
    }
}

/// `poll(2)` keeps the whole interest set in user space and hands it to
/// the kernel on every wait.
pub(crate) struct Selector {
    inner: RefCell<Inner>,
}

impl Selector {
    #[inline]
    pub(crate) fn new() -> io::Result<Self> {
        Ok(Selector {
            inner: RefCell::new(Inner {
                pfds: Vec::new(),
                fds: Vec::new(),
                tokens: Vec::new(),
            }),
        })
    }

    pub(crate) fn register(&self, fd: RawFd, token: usize, interest: Ops) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.pfds.push(pollfd(fd, interest));
        inner.fds.push(fd);
        inner.tokens.push(token);
        Ok(())
    }

    pub(crate) fn reregister(&self, fd: RawFd, token: usize, _: Ops, new: Ops) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        let idx = inner.position(fd)?;
        inner.pfds[idx] = pollfd(fd, new);
        inner.tokens[idx] = token;
        Ok(())
    }

    pub(crate) fn deregister(&self, fd: RawFd, _: Ops) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        let idx = inner.position(fd)?;
        inner.pfds.swap_remove(idx);
        inner.fds.swap_remove(idx);
        inner.tokens.swap_remove(idx);
        Ok(())
    }

    pub(crate) fn select(
        &self,
        events: &mut Vec<Event>,
        cap: usize,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        let millis = match timeout {
            Some(dur) => ::std::cmp::min(::into_millis(dur), libc::c_int::max_value() as u64)
                as libc::c_int,
            None => -1,
        };
        let res = unsafe {
            libc::poll(
                inner.pfds.as_mut_ptr(),
                inner.pfds.len() as libc::nfds_t,
                millis,
            )
        };
        if cvt(res)? == 0 {
            return Ok(());
        }
        for (pfd, &token) in inner.pfds.iter().zip(inner.tokens.iter()) {
            if events.len() >= cap {
                break;
            }
            let revents = pfd.revents;
            if revents == 0 {
                continue;
            }
            let mut ready = Ops::empty();
            if revents & (libc::POLLIN | libc::POLLPRI | libc::POLLHUP) != 0 {
                ready |= Ops::READ;
            }
            if revents & libc::POLLOUT != 0 {
                ready |= Ops::WRITE;
            }
            let hup = revents & libc::POLLHUP != 0;
            let error = revents & (libc::POLLERR | libc::POLLNVAL) != 0;
            events.push(Event::new(token, ready, hup, error));
        }
        Ok(())
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Poll({} fds)", self.inner.borrow().fds.len())
    }
}
