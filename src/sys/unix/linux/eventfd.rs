use std::fmt;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use libc;

use sys::unix::cvt;

pub(crate) struct AwakenerImp {
    event_fd: RawFd,
}

impl AwakenerImp {
    #[inline]
    pub(crate) fn new() -> io::Result<Self> {
        let res = unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) };
        Ok(AwakenerImp {
            event_fd: cvt(res)?,
        })
    }

    pub(crate) fn wakeup(&self) -> io::Result<()> {
        let data = 1u64;
        let res = unsafe { libc::write(self.event_fd, &data as *const _ as *const _, 8) };
        match cvt(res) {
            Ok(8) => Ok(()),
            Ok(n) => {
                error!("Error to wakeup {:?}, written: {}", self, n);
                Ok(())
            }
            // The counter is saturated, so the poller is awake anyway.
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn reset(&self) -> io::Result<()> {
        let mut buf = 0u64;
        let res = unsafe { libc::read(self.event_fd, &mut buf as *mut _ as *mut _, 8) };
        match cvt(res) {
            Ok(_) => Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl AsRawFd for AwakenerImp {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.event_fd
    }
}

impl fmt::Debug for AwakenerImp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EventFd({})", self.event_fd)
    }
}

impl Drop for AwakenerImp {
    fn drop(&mut self) {
        let res = unsafe { libc::close(self.event_fd) };
        cvt(res)
            .map(drop)
            .unwrap_or_else(|e| error!("Failed to close {:?}: {}", self, e));
    }
}
