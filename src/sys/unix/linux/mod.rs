pub(crate) mod epoll;

mod eventfd;
pub(crate) use self::eventfd::AwakenerImp;

use nio::PollerKind;

pub(crate) const BEST_POLLER: PollerKind = PollerKind::Epoll;

pub(crate) static AVAILABLE_POLLERS: &'static [PollerKind] =
    &[PollerKind::Epoll, PollerKind::Poll, PollerKind::Select];
