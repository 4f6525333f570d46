use std::io;
use std::result;

use nio::Token;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "unknown socket {}", _0)]
    UnknownSocket(Token),

    #[fail(display = "socket {} is closing", _0)]
    Closing(Token),

    #[fail(display = "socket {} does not support {}", _0, _1)]
    Unsupported(Token, &'static str),

    #[fail(display = "reactor is gone")]
    Disconnected,
}

pub type Result<T> = result::Result<T, Error>;

impl From<io::Error> for Error {
    #[inline]
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl Error {
    /// Returns the underlying I/O error kind, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match *self {
            Error::Io(ref e) => Some(e.kind()),
            _ => None,
        }
    }
}
