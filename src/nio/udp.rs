use std::fmt;
use std::io;
use std::net::{self, SocketAddr};
use std::os::unix::io::{AsRawFd, RawFd};

use net2::UdpBuilder;

pub struct UdpSocket {
    inner: net::UdpSocket,
}

impl UdpSocket {
    /// Binds a non-blocking datagram socket.
    pub fn bind(addr: &SocketAddr, reuse_address: bool, broadcast: bool) -> io::Result<Self> {
        let builder = match *addr {
            SocketAddr::V4(..) => UdpBuilder::new_v4()?,
            SocketAddr::V6(..) => UdpBuilder::new_v6()?,
        };
        builder.reuse_address(reuse_address)?;
        let inner = builder.bind(addr)?;
        if broadcast {
            inner.set_broadcast(true)?;
        }
        inner.set_nonblocking(true)?;
        Ok(UdpSocket { inner })
    }

    #[inline]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    #[inline]
    pub fn connect(&self, addr: &SocketAddr) -> io::Result<()> {
        self.inner.connect(addr)
    }

    #[inline]
    pub fn send_to(&self, buf: &[u8], target: &SocketAddr) -> io::Result<usize> {
        self.inner.send_to(buf, target)
    }

    #[inline]
    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf)
    }

    /// Sends to the connected peer.
    #[inline]
    pub fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.send(buf)
    }

    #[inline]
    pub fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.recv(buf)
    }

    #[inline]
    pub fn set_ttl(&self, ttl: u32) -> io::Result<()> {
        self.inner.set_ttl(ttl)
    }

    #[inline]
    pub fn broadcast(&self) -> io::Result<bool> {
        self.inner.broadcast()
    }

    #[inline]
    pub fn take_error(&self) -> io::Result<Option<io::Error>> {
        self.inner.take_error()
    }
}

impl AsRawFd for UdpSocket {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl fmt::Debug for UdpSocket {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}
