//! Outgoing byte queues.

use std::collections::VecDeque;
use std::io;

use nio::{IoVec, WriteV};

/// Maximum number of chunks handed to one vectored write.
const MAX_IOVS: usize = 64;

/// Ordered queue of bytes waiting to be written to a non-blocking channel.
///
/// Chunks are kept as pushed; `pos` is the read offset into the front
/// chunk, so a partial write never copies the remainder.
#[derive(Debug, Default)]
pub struct WriteBuf {
    chunks: VecDeque<Vec<u8>>,
    pos: usize,
    len: usize,
}

impl WriteBuf {
    #[inline]
    pub fn new() -> Self {
        WriteBuf::default()
    }

    pub fn push(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.len += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Number of bytes still pending.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pending bytes, front first.
    pub fn chunks(&self) -> Chunks {
        Chunks {
            inner: self.chunks.iter(),
            pos: self.pos,
        }
    }

    /// Issues a single vectored write and consumes what `w` accepted.
    pub fn write_to<W: WriteV>(&mut self, w: &mut W) -> io::Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        let n = {
            let iovs: Vec<IoVec> = self.chunks().take(MAX_IOVS).map(IoVec::from).collect();
            w.writev(&iovs)?
        };
        self.consume(n);
        Ok(n)
    }

    /// Writes until the queue is empty or `w` would block.
    ///
    /// Returns `Ok(true)` once everything has been written.
    pub fn flush_to<W: WriteV>(&mut self, w: &mut W) -> io::Result<bool> {
        while !self.is_empty() {
            match self.write_to(w) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(_) => {}
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.pos = 0;
        self.len = 0;
    }

    fn consume(&mut self, mut n: usize) {
        debug_assert!(n <= self.len);
        self.len -= n;
        while n > 0 {
            let remaining = match self.chunks.front() {
                Some(front) => front.len() - self.pos,
                None => break,
            };
            if n < remaining {
                self.pos += n;
                return;
            }
            n -= remaining;
            self.chunks.pop_front();
            self.pos = 0;
        }
    }
}

pub struct Chunks<'a> {
    inner: ::std::collections::vec_deque::Iter<'a, Vec<u8>>,
    pos: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<&'a [u8]> {
        let chunk = self.inner.next()?;
        let pos = self.pos;
        self.pos = 0;
        Some(&chunk[pos..])
    }
}
