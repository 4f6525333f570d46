use std::fmt;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use libc;

use sys::unix::cvt;
use sys::unix::syscall::pipe;

/// Self-pipe wake-up: the read end is polled, the write end is poked.
pub(crate) struct AwakenerImp {
    reader: RawFd,
    writer: RawFd,
}

impl AwakenerImp {
    #[inline]
    pub(crate) fn new() -> io::Result<Self> {
        let (reader, writer) = pipe()?;
        Ok(AwakenerImp { reader, writer })
    }

    pub(crate) fn wakeup(&self) -> io::Result<()> {
        let data = 1u8;
        let res = unsafe { libc::write(self.writer, &data as *const _ as *const _, 1) };
        match cvt(res) {
            Ok(_) => Ok(()),
            // The pipe is full, so the poller is awake anyway.
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn reset(&self) -> io::Result<()> {
        let mut buf = [0u8; 128];
        loop {
            let res = unsafe {
                libc::read(self.reader, buf.as_mut_ptr() as *mut _, buf.len())
            };
            match cvt(res) {
                Ok(0) => return Ok(()),
                Ok(_) => continue,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl AsRawFd for AwakenerImp {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.reader
    }
}

impl fmt::Debug for AwakenerImp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pipe({}, {})", self.reader, self.writer)
    }
}

impl Drop for AwakenerImp {
    fn drop(&mut self) {
        for &fd in &[self.reader, self.writer] {
            let res = unsafe { libc::close(fd) };
            cvt(res)
                .map(drop)
                .unwrap_or_else(|e| error!("Failed to close {:?}: {}", self, e));
        }
    }
}
