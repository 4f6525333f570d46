use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A transport-qualified endpoint.
///
/// Parses from and prints as `tcp://host:port`, `udp://host:port` or
/// `unix:///path/to/socket`. A string without a scheme is taken as TCP.
/// Host names are not resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Addr {
    Tcp(SocketAddr),
    Udp(SocketAddr),
    Unix(PathBuf),
}

impl Addr {
    #[inline]
    pub fn unix<P: AsRef<Path>>(path: P) -> Self {
        Addr::Unix(path.as_ref().to_path_buf())
    }

    /// The IP endpoint of a TCP or UDP address.
    #[inline]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match *self {
            Addr::Tcp(addr) | Addr::Udp(addr) => Some(addr),
            Addr::Unix(_) => None,
        }
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        match *self {
            Addr::Unix(ref path) => Some(path),
            _ => None,
        }
    }

    #[inline]
    pub fn is_stream(&self) -> bool {
        match *self {
            Addr::Udp(_) => false,
            _ => true,
        }
    }

    #[inline]
    pub fn scheme(&self) -> &'static str {
        match *self {
            Addr::Tcp(_) => "tcp",
            Addr::Udp(_) => "udp",
            Addr::Unix(_) => "unix",
        }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Addr::Tcp(ref addr) | Addr::Udp(ref addr) => write!(f, "{}://{}", self.scheme(), addr),
            Addr::Unix(ref path) => write!(f, "unix://{}", path.display()),
        }
    }
}

#[derive(Debug, Fail)]
#[fail(display = "invalid address {:?}: {}", addr, reason)]
pub struct AddrParseError {
    addr: String,
    reason: &'static str,
}

impl FromStr for Addr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| AddrParseError {
            addr: s.to_owned(),
            reason,
        };
        let (scheme, rest) = match s.find("://") {
            Some(i) => (&s[..i], &s[i + 3..]),
            None => ("tcp", s),
        };
        if rest.is_empty() {
            return Err(err("missing endpoint"));
        }
        match scheme {
            "tcp" => rest.parse()
                .map(Addr::Tcp)
                .map_err(|_| err("expected ip:port")),
            "udp" => rest.parse()
                .map(Addr::Udp)
                .map_err(|_| err("expected ip:port")),
            "unix" => Ok(Addr::Unix(PathBuf::from(rest))),
            _ => Err(err("unknown scheme")),
        }
    }
}
