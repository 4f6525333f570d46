use std::time::Duration;

use nio::PollerKind;

/// Reactor settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) poller: PollerKind,
    pub(crate) events_capacity: usize,
    pub(crate) read_size: usize,
    pub(crate) backlog: i32,
    pub(crate) nodelay: bool,
    pub(crate) reuse_address: bool,
    pub(crate) only_v6: Option<bool>,
    pub(crate) ttl: Option<u32>,
    pub(crate) broadcast: bool,
    pub(crate) max_connections: Option<usize>, // per listener
    pub(crate) poll_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            poller: PollerKind::best(),
            events_capacity: 512,
            read_size: 4096,
            backlog: 5000,
            nodelay: false,
            reuse_address: true,
            only_v6: None,
            ttl: None,
            broadcast: false,
            max_connections: None,
            poll_timeout: None,
        }
    }
}

impl Config {
    #[inline]
    pub fn new() -> Self {
        Config::default()
    }

    #[inline]
    pub fn poller(&mut self, kind: PollerKind) -> &mut Self {
        self.poller = kind;
        self
    }

    #[inline]
    pub fn events_capacity(&mut self, events_capacity: usize) -> &mut Self {
        if events_capacity > 0 {
            self.events_capacity = events_capacity;
        }
        self
    }

    /// Upper bound of bytes taken from a channel per readiness event.
    #[inline]
    pub fn read_size(&mut self, read_size: usize) -> &mut Self {
        if read_size > 0 {
            self.read_size = read_size;
        }
        self
    }

    #[inline]
    pub fn backlog(&mut self, backlog: i32) -> &mut Self {
        self.backlog = backlog;
        self
    }

    #[inline]
    pub fn nodelay(&mut self, nodelay: bool) -> &mut Self {
        self.nodelay = nodelay;
        self
    }

    #[inline]
    pub fn reuse_address(&mut self, reuse_address: bool) -> &mut Self {
        self.reuse_address = reuse_address;
        self
    }

    #[inline]
    pub fn only_v6(&mut self, only_v6: Option<bool>) -> &mut Self {
        self.only_v6 = only_v6;
        self
    }

    #[inline]
    pub fn ttl(&mut self, ttl: Option<u32>) -> &mut Self {
        self.ttl = ttl;
        self
    }

    #[inline]
    pub fn broadcast(&mut self, broadcast: bool) -> &mut Self {
        self.broadcast = broadcast;
        self
    }

    /// Connections beyond the limit are accepted and dropped at once.
    #[inline]
    pub fn max_connections(&mut self, max_connections: Option<usize>) -> &mut Self {
        self.max_connections = max_connections;
        self
    }

    /// `None` blocks until an event or a wake-up.
    #[inline]
    pub fn poll_timeout(&mut self, poll_timeout: Option<Duration>) -> &mut Self {
        self.poll_timeout = poll_timeout;
        self
    }
}
