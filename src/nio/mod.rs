//! Non-blocking channels and the poller that watches them.

mod poll;
pub use self::poll::{Event, Events, Ops, Pollable, Poller, PollerKind, Token};

mod awakener;
pub use self::awakener::Awakener;

use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::ops::Deref;
use std::slice;

use libc;

/// A borrowed buffer laid out as the platform's `iovec`.
#[repr(transparent)]
pub struct IoVec<'a> {
    inner: libc::iovec,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> IoVec<'a> {
    #[inline]
    pub fn from(buf: &'a [u8]) -> Self {
        IoVec {
            inner: libc::iovec {
                iov_base: buf.as_ptr() as *mut libc::c_void,
                iov_len: buf.len(),
            },
            _marker: PhantomData,
        }
    }
}

impl<'a> Deref for IoVec<'a> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.inner.iov_base as *const u8, self.inner.iov_len) }
    }
}

impl<'a> fmt::Debug for IoVec<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "IoVec {{ iov_base: {:p}, iov_len: {} }}",
            self.inner.iov_base, self.inner.iov_len
        )
    }
}

pub trait WriteV {
    fn writev(&mut self, iovs: &[IoVec]) -> io::Result<usize>;
}

impl<'a, W: WriteV> WriteV for &'a mut W {
    #[inline]
    fn writev(&mut self, iovs: &[IoVec]) -> io::Result<usize> {
        WriteV::writev(*self, iovs)
    }
}

mod tcp;
pub use self::tcp::*;

mod udp;
pub use self::udp::*;

mod unix;
pub use self::unix::*;
