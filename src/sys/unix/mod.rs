mod syscall;
pub(crate) use self::syscall::{connect, cvt, writev};

mod poll;
mod select;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod linux;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) use self::linux::*;

#[cfg(any(target_os = "dragonfly", target_os = "freebsd", target_os = "ios",
          target_os = "macos", target_os = "netbsd", target_os = "openbsd"))]
mod bsd;
#[cfg(any(target_os = "dragonfly", target_os = "freebsd", target_os = "ios",
          target_os = "macos", target_os = "netbsd", target_os = "openbsd"))]
pub(crate) use self::bsd::*;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
mod pipe;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub(crate) use self::pipe::AwakenerImp;

mod selector;
pub(crate) use self::selector::Selector;

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "dragonfly",
              target_os = "freebsd", target_os = "ios", target_os = "macos",
              target_os = "netbsd", target_os = "openbsd")))]
mod fallback {
    use nio::PollerKind;

    pub(crate) const BEST_POLLER: PollerKind = PollerKind::Poll;

    pub(crate) static AVAILABLE_POLLERS: &'static [PollerKind] =
        &[PollerKind::Poll, PollerKind::Select];
}
#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "dragonfly",
              target_os = "freebsd", target_os = "ios", target_os = "macos",
              target_os = "netbsd", target_os = "openbsd")))]
pub(crate) use self::fallback::*;
