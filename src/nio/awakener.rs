use std::fmt;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};

use sys;

/// Interrupts a `Poller` blocked in another thread.
///
/// Register it for `Ops::READ`; once its token fires, the polling thread
/// must call `reset` before waiting again. Wake-ups between two resets are
/// coalesced into one.
pub struct Awakener {
    inner: sys::AwakenerImp,
    need_wakeup: AtomicBool,
}

impl Awakener {
    #[inline]
    pub fn new() -> io::Result<Self> {
        Ok(Awakener {
            inner: sys::AwakenerImp::new()?,
            need_wakeup: AtomicBool::new(true),
        })
    }

    pub fn wakeup(&self) -> io::Result<()> {
        // Callers publish their command before waking, so the polling
        // thread sees it once it observes the flag.
        if self.need_wakeup.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.inner.wakeup() {
                self.need_wakeup.store(true, Ordering::SeqCst);
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn reset(&self) -> io::Result<()> {
        // Commands queued by a wakeup that lost the race with this store
        // are drained by the caller right after reset.
        if !self.need_wakeup.load(Ordering::SeqCst) {
            self.inner.reset()?;
            self.need_wakeup.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl AsRawFd for Awakener {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl fmt::Debug for Awakener {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Awakener {{ inner: {:?}, need_wakeup: {:?} }}",
            self.inner,
            self.need_wakeup.load(Ordering::Relaxed)
        )
    }
}
