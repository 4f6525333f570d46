use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net;
use std::path::{Path, PathBuf};

use super::{IoVec, WriteV};
use sys;

/// A non-blocking UNIX domain listener that owns its socket file.
pub struct UnixListener {
    inner: net::UnixListener,
    path: PathBuf,
}

impl UnixListener {
    /// Binds to `path`. A leftover socket file is replaced; any other kind
    /// of file is left alone and reported as `AlreadyExists`.
    pub fn bind<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        match fs::symlink_metadata(path) {
            Ok(meta) => {
                if !meta.file_type().is_socket() {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} exists and is not a socket", path.display()),
                    ));
                }
                debug!("removing stale socket file {}", path.display());
                fs::remove_file(path)?;
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        let inner = net::UnixListener::bind(path)?;
        inner.set_nonblocking(true)?;
        Ok(UnixListener {
            inner,
            path: path.to_path_buf(),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn accept(&self) -> io::Result<UnixStream> {
        let (sock, _) = self.inner.accept()?;
        sock.set_nonblocking(true)?;
        Ok(UnixStream::from(sock))
    }

    #[inline]
    pub fn take_error(&self) -> io::Result<Option<io::Error>> {
        self.inner.take_error()
    }
}

impl Drop for UnixListener {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                error!("failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}

impl AsRawFd for UnixListener {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl fmt::Debug for UnixListener {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "UnixListener {{ fd: {}, path: {} }}",
            self.as_raw_fd(),
            self.path.display()
        )
    }
}

pub struct UnixStream {
    inner: net::UnixStream,
}

impl From<net::UnixStream> for UnixStream {
    #[inline]
    fn from(inner: net::UnixStream) -> Self {
        UnixStream { inner }
    }
}

impl UnixStream {
    /// Connects to `path` and switches the stream to non-blocking mode.
    /// Local sockets complete the handshake immediately.
    pub fn connect<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let inner = net::UnixStream::connect(path)?;
        inner.set_nonblocking(true)?;
        Ok(Self::from(inner))
    }

    /// A connected, non-blocking pair of streams.
    pub fn pair() -> io::Result<(Self, Self)> {
        let (a, b) = net::UnixStream::pair()?;
        a.set_nonblocking(true)?;
        b.set_nonblocking(true)?;
        Ok((Self::from(a), Self::from(b)))
    }

    #[inline]
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        self.inner.shutdown(how)
    }

    #[inline]
    pub fn take_error(&self) -> io::Result<Option<io::Error>> {
        self.inner.take_error()
    }

    /// Path of this end's socket file, if it has one.
    pub fn local_path(&self) -> Option<PathBuf> {
        self.inner
            .local_addr()
            .ok()
            .and_then(|addr| addr.as_pathname().map(Path::to_path_buf))
    }

    /// Path of the peer's socket file, if it has one.
    pub fn peer_path(&self) -> Option<PathBuf> {
        self.inner
            .peer_addr()
            .ok()
            .and_then(|addr| addr.as_pathname().map(Path::to_path_buf))
    }
}

impl AsRawFd for UnixStream {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl fmt::Debug for UnixStream {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl io::Read for UnixStream {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl io::Write for UnixStream {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl WriteV for UnixStream {
    #[inline]
    fn writev(&mut self, iovs: &[IoVec]) -> io::Result<usize> {
        sys::writev(self.inner.as_raw_fd(), iovs)
    }
}
