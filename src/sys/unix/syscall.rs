use std::io;
use std::mem;
use std::net::SocketAddr;
use std::os::unix::io::RawFd;

use libc;

use nio::IoVec;

/// Maps the `-1` convention of libc calls onto `io::Result`.
#[inline]
pub(crate) fn cvt<T: Copy + Default + PartialOrd>(res: T) -> io::Result<T> {
    if res < T::default() {
        Err(io::Error::last_os_error())
    } else {
        Ok(res)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn set_nonblocking_and_cloexec(fd: RawFd) -> io::Result<()> {
    let flags = cvt(unsafe { libc::fcntl(fd, libc::F_GETFL) })?;
    cvt(unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) })?;
    let flags = cvt(unsafe { libc::fcntl(fd, libc::F_GETFD) })?;
    cvt(unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) })?;
    Ok(())
}

/// Returns `(reader, writer)`, both non-blocking and close-on-exec.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub(crate) fn pipe() -> io::Result<(RawFd, RawFd)> {
    let mut fds = [0 as libc::c_int; 2];
    cvt(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
    for &fd in &fds {
        if let Err(e) = set_nonblocking_and_cloexec(fd) {
            unsafe {
                libc::close(fds[0]);
                libc::close(fds[1]);
            }
            return Err(e);
        }
    }
    Ok((fds[0], fds[1]))
}

#[inline]
pub(crate) fn writev(fd: RawFd, iovs: &[IoVec]) -> io::Result<usize> {
    let len = ::std::cmp::min(iovs.len(), libc::c_int::max_value() as usize);
    let res = unsafe {
        libc::writev(
            fd,
            iovs.as_ptr() as *const libc::iovec,
            len as libc::c_int,
        )
    };
    Ok(cvt(res)? as usize)
}

/// Starts connecting the non-blocking socket `fd` to `addr`.
///
/// Returns `true` when the connection completed immediately and `false`
/// when it is still in progress.
pub(crate) fn connect(fd: RawFd, addr: &SocketAddr) -> io::Result<bool> {
    let (storage, len) = into_sockaddr(addr);
    let res = unsafe {
        libc::connect(
            fd,
            &storage as *const libc::sockaddr_storage as *const libc::sockaddr,
            len,
        )
    };
    match cvt(res) {
        Ok(_) => Ok(true),
        Err(ref e) if e.raw_os_error() == Some(libc::EINPROGRESS) => Ok(false),
        Err(e) => Err(e),
    }
}

fn into_sockaddr(addr: &SocketAddr) -> (libc::sockaddr_storage, libc::socklen_t) {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let len = match *addr {
        SocketAddr::V4(ref a) => {
            let sin = unsafe { &mut *(&mut storage as *mut _ as *mut libc::sockaddr_in) };
            sin.sin_family = libc::AF_INET as libc::sa_family_t;
            sin.sin_port = a.port().to_be();
            sin.sin_addr.s_addr = u32::from(*a.ip()).to_be();
            mem::size_of::<libc::sockaddr_in>()
        }
        SocketAddr::V6(ref a) => {
            let sin6 = unsafe { &mut *(&mut storage as *mut _ as *mut libc::sockaddr_in6) };
            sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
            sin6.sin6_port = a.port().to_be();
            sin6.sin6_flowinfo = a.flowinfo();
            sin6.sin6_addr.s6_addr = a.ip().octets();
            sin6.sin6_scope_id = a.scope_id();
            mem::size_of::<libc::sockaddr_in6>()
        }
    };
    (storage, len as libc::socklen_t)
}
