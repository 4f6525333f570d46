use std::fmt;
use std::io::{self, Read, Write};
use std::net::{self, IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr};
use std::os::unix::io::{AsRawFd, RawFd};

use net2::{TcpBuilder, TcpStreamExt};

use super::{IoVec, WriteV};
use sys;

pub struct TcpListener {
    inner: net::TcpListener,
}

pub struct TcpListenerBuilder {
    addr: SocketAddr,
    backlog: i32,
    ttl: Option<u32>,
    only_v6: Option<bool>,
    reuse_address: bool,
}

impl Default for TcpListenerBuilder {
    #[inline]
    fn default() -> Self {
        TcpListenerBuilder {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 0),
            backlog: 5000,
            ttl: None,
            only_v6: None,
            reuse_address: true,
        }
    }
}

impl TcpListenerBuilder {
    #[inline]
    pub fn addr(&mut self, addr: SocketAddr) -> &mut Self {
        self.addr = addr;
        self
    }

    #[inline]
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.addr.set_port(port);
        self
    }

    #[inline]
    pub fn backlog(&mut self, backlog: i32) -> &mut Self {
        self.backlog = backlog;
        self
    }

    #[inline]
    pub fn ttl(&mut self, ttl: Option<u32>) -> &mut Self {
        self.ttl = ttl;
        self
    }

    #[inline]
    pub fn only_v6(&mut self, only_v6: Option<bool>) -> &mut Self {
        self.only_v6 = only_v6;
        self
    }

    #[inline]
    pub fn reuse_address(&mut self, reuse_address: bool) -> &mut Self {
        self.reuse_address = reuse_address;
        self
    }

    pub fn build(&self) -> io::Result<TcpListener> {
        let builder = match self.addr {
            SocketAddr::V4(..) => TcpBuilder::new_v4()?,
            SocketAddr::V6(..) => {
                let builder = TcpBuilder::new_v6()?;
                if let Some(only_v6) = self.only_v6 {
                    builder.only_v6(only_v6)?;
                }
                builder
            }
        };
        if let Some(ttl) = self.ttl {
            builder.ttl(ttl)?;
        }
        builder.reuse_address(self.reuse_address)?;
        builder.bind(&self.addr)?;
        let inner = builder.listen(self.backlog)?;
        inner.set_nonblocking(true)?;
        Ok(TcpListener { inner })
    }
}

impl TcpListener {
    #[inline]
    pub fn builder() -> TcpListenerBuilder {
        TcpListenerBuilder::default()
    }

    #[inline]
    pub fn bind(addr: &SocketAddr) -> io::Result<Self> {
        Self::builder().addr(*addr).build()
    }

    #[inline]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    #[inline]
    pub fn ttl(&self) -> io::Result<u32> {
        self.inner.ttl()
    }

    #[inline]
    pub fn take_error(&self) -> io::Result<Option<io::Error>> {
        self.inner.take_error()
    }

    /// Accepts one pending connection; the stream is switched to
    /// non-blocking mode.
    pub fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let (sock, addr) = self.inner.accept()?;
        sock.set_nonblocking(true)?;
        Ok((TcpStream::from(sock), addr))
    }
}

impl AsRawFd for TcpListener {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl fmt::Debug for TcpListener {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

pub struct TcpStream {
    inner: net::TcpStream,
}

impl From<net::TcpStream> for TcpStream {
    #[inline]
    fn from(inner: net::TcpStream) -> Self {
        TcpStream { inner }
    }
}

impl TcpStream {
    /// Starts a non-blocking connect. The flag tells whether the
    /// connection is already established; otherwise the stream becomes
    /// writable once the attempt finished, successfully or not.
    pub fn connect(addr: &SocketAddr) -> io::Result<(Self, bool)> {
        let builder = match *addr {
            SocketAddr::V4(..) => TcpBuilder::new_v4()?,
            SocketAddr::V6(..) => TcpBuilder::new_v6()?,
        };
        let sock = builder.to_tcp_stream()?;
        sock.set_nonblocking(true)?;
        let connected = sys::connect(sock.as_raw_fd(), addr)?;
        Ok((Self::from(sock), connected))
    }

    #[inline]
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.peer_addr()
    }

    #[inline]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    #[inline]
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        self.inner.shutdown(how)
    }

    #[inline]
    pub fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        self.inner.set_nodelay(nodelay)
    }

    #[inline]
    pub fn nodelay(&self) -> io::Result<bool> {
        self.inner.nodelay()
    }

    #[inline]
    pub fn set_keepalive_ms(&self, keepalive: Option<u32>) -> io::Result<()> {
        TcpStreamExt::set_keepalive_ms(&self.inner, keepalive)
    }

    #[inline]
    pub fn set_ttl(&self, ttl: u32) -> io::Result<()> {
        self.inner.set_ttl(ttl)
    }

    #[inline]
    pub fn take_error(&self) -> io::Result<Option<io::Error>> {
        self.inner.take_error()
    }
}

impl AsRawFd for TcpStream {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl fmt::Debug for TcpStream {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl io::Read for TcpStream {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl io::Write for TcpStream {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl WriteV for TcpStream {
    #[inline]
    fn writev(&mut self, iovs: &[IoVec]) -> io::Result<usize> {
        sys::writev(self.inner.as_raw_fd(), iovs)
    }
}

/// The unspecified address of the same family as `addr`, port 0.
#[inline]
pub(crate) fn unspecified_like(addr: &SocketAddr) -> SocketAddr {
    match *addr {
        SocketAddr::V4(..) => SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 0),
        SocketAddr::V6(..) => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 0)), 0)
        }
    }
}
