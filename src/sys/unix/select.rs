use std::cell::RefCell;
use std::cmp;
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
struct Entry {
    fd: RawFd,
    token: usize,
    interest: Ops,
}

pub(crate) struct Selector {
    entries: RefCell<Vec<Entry>>,
}

#[inline]
fn empty_set() -> libc::fd_set {
    let mut set: libc::fd_set = unsafe { mem::zeroed() };
    unsafe { libc::FD_ZERO(&mut set) };
    set
}

impl Selector {
    #[inline]
    pub(crate) fn new() -> io::Result<Self> {
        Ok(Selector {
            entries: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn register(&self, fd: RawFd, token: usize, interest: Ops) -> io::Result<()> {
        if fd < 0 || fd as usize >= libc::FD_SETSIZE as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("fd {} exceeds FD_SETSIZE", fd),
            ));
        }
        self.entries.borrow_mut().push(Entry {
            fd,
            token,
            interest,
        });
        Ok(())
    }

    pub(crate) fn reregister(&self, fd: RawFd, token: usize, _: Ops, new: Ops) -> io::Result<()> {
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|e| e.fd == fd) {
            Some(entry) => {
                entry.token = token;
                entry.interest = new;
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("fd {} is not selected", fd),
            )),
        }
    }

    pub(crate) fn deregister(&self, fd: RawFd, _: Ops) -> io::Result<()> {
        let mut entries = self.entries.borrow_mut();
        match entries.iter().position(|e| e.fd == fd) {
            Some(idx) => {
                entries.swap_remove(idx);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("fd {} is not selected", fd),
            )),
        }
    }

    pub(crate) fn select(
        &self,
        events: &mut Vec<Event>,
        cap: usize,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        let entries = self.entries.borrow();
        let mut rset = empty_set();
        let mut wset = empty_set();
        let mut nfds = 0;
        for entry in entries.iter() {
            if entry.interest.contains_read() {
                unsafe { libc::FD_SET(entry.fd, &mut rset) };
            }
            if entry.interest.contains_write() {
                unsafe { libc::FD_SET(entry.fd, &mut wset) };
            }
            if !entry.interest.is_empty() {
                nfds = cmp::max(nfds, entry.fd + 1);
            }
        }
        let mut tv = timeout.map(|dur| libc::timeval {
            tv_sec: cmp::min(dur.as_secs(), libc::time_t::max_value() as u64) as libc::time_t,
            tv_usec: dur.subsec_micros() as libc::suseconds_t,
        });
        let tv_ptr = match tv.as_mut() {
            Some(tv) => tv as *mut libc::timeval,
            None => ptr::null_mut(),
        };
        let res = unsafe { libc::select(nfds, &mut rset, &mut wset, ptr::null_mut(), tv_ptr) };
        if cvt(res)? == 0 {
            return Ok(());
        }
        for entry in entries.iter() {
            if events.len() >= cap {
                break;
            }
            let mut ready = Ops::empty();
            if entry.interest.contains_read() && unsafe { libc::FD_ISSET(entry.fd, &rset) } {
                ready |= Ops::READ;
            }
            if entry.interest.contains_write() && unsafe { libc::FD_ISSET(entry.fd, &wset) } {
                ready |= Ops::WRITE;
            }
            if !ready.is_empty() {
                events.push(Event::new(entry.token, ready, false, false));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Select({} fds)", self.entries.borrow().len())
    }
}
