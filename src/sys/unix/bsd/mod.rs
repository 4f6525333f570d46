pub(crate) mod kqueue;

use nio::PollerKind;

pub(crate) const BEST_POLLER: PollerKind = PollerKind::Kqueue;

pub(crate) static AVAILABLE_POLLERS: &'static [PollerKind] =
    &[PollerKind::Kqueue, PollerKind::Poll, PollerKind::Select];
