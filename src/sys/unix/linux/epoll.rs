use std::cell::RefCell;
use std::fmt;
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use libc;

use nio::{Event, Ops};
use sys::unix::cvt;

#[inline]
fn to_epoll(interest: Ops) -> u32 {
    let mut bits = 0;
    if interest.contains_read() {
        bits |= libc::EPOLLIN | libc::EPOLLRDHUP;
    }
    if interest.contains_write() {
        bits |= libc::EPOLLOUT;
    }
    bits as u32
}

#[inline]
fn from_epoll(ev: &libc::epoll_event) -> Event {
    let bits = ev.events as libc::c_int;
    let token = ev.u64 as usize;
    let mut ready = Ops::empty();
    if bits & (libc::EPOLLIN | libc::EPOLLPRI) != 0 {
        ready |= Ops::READ;
    }
    if bits & libc::EPOLLOUT != 0 {
        ready |= Ops::WRITE;
    }
    let hup = bits & (libc::EPOLLHUP | libc::EPOLLRDHUP) != 0;
    let error = bits & libc::EPOLLERR != 0;
    Event::new(token, ready, hup, error)
}

pub(crate) struct Selector {
    epfd: RawFd,
    buf: RefCell<Vec<libc::epoll_event>>,
}

impl Selector {
    pub(crate) fn new() -> io::Result<Self> {
        let res = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        Ok(Selector {
            epfd: cvt(res)?,
            buf: RefCell::new(Vec::new()),
        })
    }

    #[inline]
    fn ctl(&self, op: libc::c_int, fd: RawFd, token: usize, interest: Ops) -> io::Result<()> {
        let mut ev = libc::epoll_event {
            events: to_epoll(interest),
            u64: token as u64,
        };
        let res = unsafe { libc::epoll_ctl(self.epfd, op, fd, &mut ev) };
        cvt(res).map(drop)
    }

    // epoll always reports hang-ups and errors, so a channel without
    // interest is kept out of the kernel set until it gains some.

    #[inline]
    pub(crate) fn register(&self, fd: RawFd, token: usize, interest: Ops) -> io::Result<()> {
        match interest.is_empty() {
            true => Ok(()),
            false => self.ctl(libc::EPOLL_CTL_ADD, fd, token, interest),
        }
    }

    pub(crate) fn reregister(&self, fd: RawFd, token: usize, old: Ops, new: Ops) -> io::Result<()> {
        match (old.is_empty(), new.is_empty()) {
            (true, true) => Ok(()),
            (true, false) => self.ctl(libc::EPOLL_CTL_ADD, fd, token, new),
            (false, true) => self.deregister(fd, old),
            (false, false) => self.ctl(libc::EPOLL_CTL_MOD, fd, token, new),
        }
    }

    #[inline]
    pub(crate) fn deregister(&self, fd: RawFd, old: Ops) -> io::Result<()> {
        if old.is_empty() {
            return Ok(());
        }
        // Kernels before 2.6.9 require a non-null event even for EPOLL_CTL_DEL.
        self.ctl(libc::EPOLL_CTL_DEL, fd, 0, Ops::empty())
    }

    pub(crate) fn select(
        &self,
        events: &mut Vec<Event>,
        cap: usize,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        let mut buf = self.buf.borrow_mut();
        buf.clear();
        buf.reserve(cap);
        let millis = match timeout {
            Some(dur) => ::std::cmp::min(::into_millis(dur), libc::c_int::max_value() as u64)
                as libc::c_int,
            None => -1,
        };
        let res = unsafe {
            libc::epoll_wait(self.epfd, buf.as_mut_ptr(), cap as libc::c_int, millis)
        };
        let n = cvt(res)? as usize;
        unsafe { buf.set_len(n) };
        events.extend(buf.iter().map(from_epoll));
        Ok(())
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Epoll({})", self.epfd)
    }
}

impl Drop for Selector {
    fn drop(&mut self) {
        let res = unsafe { libc::close(self.epfd) };
        cvt(res)
            .map(drop)
            .unwrap_or_else(|e| error!("Failed to close {:?}: {}", self, e));
    }
}
