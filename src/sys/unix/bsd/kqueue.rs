use std::cell::RefCell;
use std::fmt;
use std::io;
use std::mem;
use std::os::unix::io::RawFd;
use std::ptr;
use std::time::Duration;

use libc;

use nio::{Event, Ops};
use sys::unix::cvt;

#[derive(Debug, Clone, Copy)]
enum Filter {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Add,
    Delete,
}

pub(crate) struct Selector {
    kq: RawFd,
    buf: RefCell<Vec<libc::kevent>>,
}

// `libc::kevent` carries a raw `udata` pointer, which only ever holds a token.
unsafe impl Send for Selector {}

impl Selector {
    pub(crate) fn new() -> io::Result<Self> {
        let kq = cvt(unsafe { libc::kqueue() })?;
        if let Err(e) = cvt(unsafe { libc::fcntl(kq, libc::F_SETFD, libc::FD_CLOEXEC) }) {
            unsafe { libc::close(kq) };
            return Err(e);
        }
        Ok(Selector {
            kq,
            buf: RefCell::new(Vec::new()),
        })
    }

    fn change(&self, fd: RawFd, filter: Filter, action: Action, token: usize) -> io::Result<()> {
        let mut ev: libc::kevent = unsafe { mem::zeroed() };
        ev.ident = fd as libc::uintptr_t;
        ev.filter = match filter {
            Filter::Read => libc::EVFILT_READ,
            Filter::Write => libc::EVFILT_WRITE,
        };
        ev.flags = match action {
            Action::Add => libc::EV_ADD,
            Action::Delete => libc::EV_DELETE,
        };
        ev.udata = token as _;
        let res = unsafe { libc::kevent(self.kq, &ev, 1, ptr::null_mut(), 0, ptr::null()) };
        match (cvt(res), action) {
            (Ok(_), _) => Ok(()),
            // Deleting a filter that was never added.
            (Err(ref e), Action::Delete) if e.raw_os_error() == Some(libc::ENOENT) => Ok(()),
            (Err(e), _) => Err(e),
        }
    }

    fn apply(&self, fd: RawFd, token: usize, add: Ops, delete: Ops) -> io::Result<()> {
        if add.contains_read() {
            self.change(fd, Filter::Read, Action::Add, token)?;
        }
        if add.contains_write() {
            self.change(fd, Filter::Write, Action::Add, token)?;
        }
        if delete.contains_read() {
            self.change(fd, Filter::Read, Action::Delete, token)?;
        }
        if delete.contains_write() {
            self.change(fd, Filter::Write, Action::Delete, token)?;
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn register(&self, fd: RawFd, token: usize, interest: Ops) -> io::Result<()> {
        self.apply(fd, token, interest, Ops::empty())
    }

    #[inline]
    pub(crate) fn reregister(&self, fd: RawFd, token: usize, old: Ops, new: Ops) -> io::Result<()> {
        // EV_ADD on an existing filter updates its token.
        self.apply(fd, token, new, old - new)
    }

    #[inline]
    pub(crate) fn deregister(&self, fd: RawFd, old: Ops) -> io::Result<()> {
        self.apply(fd, 0, Ops::empty(), old)
    }

    pub(crate) fn select(
        &self,
        events: &mut Vec<Event>,
        cap: usize,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        let to = timeout.map(|dur| libc::timespec {
            tv_sec: ::std::cmp::min(dur.as_secs(), libc::time_t::max_value() as u64)
                as libc::time_t,
            tv_nsec: dur.subsec_nanos() as libc::c_long,
        });
        let to_ptr = match to.as_ref() {
            Some(ts) => ts as *const libc::timespec,
            None => ptr::null(),
        };
        let mut buf = self.buf.borrow_mut();
        buf.clear();
        buf.reserve(cap);
        let res = unsafe {
            libc::kevent(
                self.kq,
                ptr::null(),
                0,
                buf.as_mut_ptr(),
                cap as libc::c_int,
                to_ptr,
            )
        };
        let n = cvt(res)? as usize;
        unsafe { buf.set_len(n) };
        for ev in buf.iter() {
            let mut ready = Ops::empty();
            if ev.filter == libc::EVFILT_READ {
                ready |= Ops::READ;
            } else if ev.filter == libc::EVFILT_WRITE {
                ready |= Ops::WRITE;
            }
            let hup = ev.flags & libc::EV_EOF != 0;
            let error = ev.flags & libc::EV_ERROR != 0;
            events.push(Event::new(ev.udata as usize, ready, hup, error));
        }
        Ok(())
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Kqueue({})", self.kq)
    }
}

impl Drop for Selector {
    fn drop(&mut self) {
        let res = unsafe { libc::close(self.kq) };
        cvt(res)
            .map(drop)
            .unwrap_or_else(|e| error!("Failed to close {:?}: {}", self, e));
    }
}
