extern crate env_logger;
extern crate nexio;

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nexio::nio::{Awakener, Events, Ops, Poller, PollerKind, Token, UnixStream};

fn init_log() {
    env_logger::init().ok();
}

fn for_each_poller<F: Fn(Poller)>(f: F) {
    for &kind in PollerKind::available() {
        let poller = Poller::with_kind(kind).unwrap();
        assert_eq!(poller.kind(), kind);
        f(poller);
    }
}

#[test]
fn best_poller_is_available() {
    init_log();
    assert!(PollerKind::best().is_available());
    assert_eq!(Poller::new().unwrap().kind(), PollerKind::best());
    assert_eq!(Poller::available_kinds(), PollerKind::available());
}

#[test]
fn unavailable_poller() {
    init_log();
    let all = [
        PollerKind::Select,
        PollerKind::Poll,
        PollerKind::Epoll,
        PollerKind::Kqueue,
    ];
    for kind in all.iter().filter(|kind| !kind.is_available()) {
        let e = Poller::with_kind(*kind).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::Other);
    }
}

#[test]
fn poll_readable() {
    init_log();
    for_each_poller(|poller| {
        let (mut a, b) = UnixStream::pair().unwrap();
        poller.register(&b, Ops::READ, Token::from(7)).unwrap();
        let mut events = Events::with_capacity(8);
        assert_eq!(
            poller.poll(&mut events, Some(Duration::from_millis(10))).unwrap(),
            0,
            "{}",
            poller
        );

        a.write_all(b"ping").unwrap();
        let n = poller.poll(&mut events, Some(Duration::from_secs(1))).unwrap();
        assert_eq!(n, 1, "{}", poller);
        let event = events.get(0).unwrap();
        assert_eq!(event.token(), Token::from(7));
        assert!(event.is_readable());
        assert!(!event.is_writable());
    });
}

#[test]
fn poll_without_interest() {
    init_log();
    for_each_poller(|poller| {
        let (a, b) = UnixStream::pair().unwrap();
        poller.register(&b, Ops::empty(), Token::from(1)).unwrap();
        let mut events = Events::with_capacity(8);
        assert_eq!(
            poller.poll(&mut events, Some(Duration::from_millis(10))).unwrap(),
            0,
            "{}",
            poller
        );

        // a hang-up is not reported either
        drop(a);
        assert_eq!(
            poller.poll(&mut events, Some(Duration::from_millis(20))).unwrap(),
            0,
            "{}: {:?}",
            poller,
            events.get(0)
        );

        poller.add_writer(&b, Token::from(1)).unwrap();
        assert_eq!(
            poller.poll(&mut events, Some(Duration::from_secs(1))).unwrap(),
            1,
            "{}",
            poller
        );
        let event = events.get(0).unwrap();
        assert_eq!(event.token(), Token::from(1));
        assert!(event.is_writable() || event.is_hup(), "{:?}", event);

        poller.remove_writer(&b).unwrap();
        assert_eq!(poller.interest(&b), Some(Ops::empty()));
        assert_eq!(
            poller.poll(&mut events, Some(Duration::from_millis(20))).unwrap(),
            0,
            "{}",
            poller
        );
        poller.discard(&b).unwrap();
        assert!(!poller.is_registered(&b));
    });
}

#[test]
fn poll_peer_closed() {
    init_log();
    for_each_poller(|poller| {
        let (a, mut b) = UnixStream::pair().unwrap();
        poller.register(&b, Ops::READ, Token::from(3)).unwrap();
        drop(a);
        let mut events = Events::with_capacity(8);
        assert_eq!(
            poller.poll(&mut events, Some(Duration::from_secs(1))).unwrap(),
            1,
            "{}",
            poller
        );
        let event = events.get(0).unwrap();
        assert!(event.is_readable() || event.is_hup(), "{:?}", event);
        let mut buf = [0; 8];
        assert_eq!(b.read(&mut buf).unwrap(), 0);
    });
}

#[test]
fn poll_timeout() {
    init_log();
    for_each_poller(|poller| {
        let (_a, b) = UnixStream::pair().unwrap();
        poller.register(&b, Ops::READ, Token::from(0)).unwrap();
        let mut events = Events::with_capacity(8);
        let start = Instant::now();
        let n = poller.poll(&mut events, Some(Duration::from_millis(50))).unwrap();
        let elapsed = start.elapsed();
        assert_eq!(n, 0);
        assert!(elapsed >= Duration::from_millis(45), "{}: {:?}", poller, elapsed);
        assert!(elapsed < Duration::from_secs(2), "{}: {:?}", poller, elapsed);
    });
}

#[test]
fn events_capacity_grows() {
    init_log();
    for_each_poller(|poller| {
        let mut pairs = Vec::new();
        for i in 0..3 {
            let (mut a, b) = UnixStream::pair().unwrap();
            a.write_all(b"x").unwrap();
            poller.register(&b, Ops::READ, Token::from(i)).unwrap();
            pairs.push((a, b));
        }
        let mut events = Events::with_capacity(1);
        assert_eq!(poller.poll(&mut events, Some(Duration::from_secs(1))).unwrap(), 1);
        assert_eq!(events.capacity(), 1);
        assert_eq!(poller.poll(&mut events, Some(Duration::from_secs(1))).unwrap(), 2);
        assert_eq!(events.capacity(), 2);
        assert_eq!(poller.poll(&mut events, Some(Duration::from_secs(1))).unwrap(), 3);
        assert_eq!(events.capacity(), 4);
    });
}

#[test]
fn interest_bookkeeping() {
    init_log();
    for_each_poller(|poller| {
        let (a, b) = UnixStream::pair().unwrap();
        let token = Token::from(5);
        assert!(poller.is_empty());
        assert!(!poller.is_registered(&a));

        poller.add_reader(&a, token).unwrap();
        assert!(poller.is_reading(&a));
        assert!(!poller.is_writing(&a));
        poller.add_reader(&a, token).unwrap();
        assert_eq!(poller.len(), 1);

        poller.add_writer(&a, token).unwrap();
        assert_eq!(poller.interest(&a), Some(Ops::READ | Ops::WRITE));

        poller.remove_reader(&a).unwrap();
        assert_eq!(poller.interest(&a), Some(Ops::WRITE));
        poller.remove_writer(&a).unwrap();
        assert_eq!(poller.interest(&a), Some(Ops::empty()));
        assert!(poller.is_registered(&a));

        let e = poller.register(&a, Ops::READ, token).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::AlreadyExists);
        let e = poller.reregister(&b, Ops::READ, token).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::NotFound);
        let e = poller.deregister(&b).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::NotFound);
        poller.remove_reader(&b).unwrap();
        assert!(!poller.is_registered(&b));

        poller.discard(&a).unwrap();
        poller.discard(&a).unwrap();
        assert!(poller.is_empty());
        assert_eq!(poller.interest(&a), None);
    });
}

#[test]
fn awakener_unblocks_poll() {
    init_log();
    for_each_poller(|poller| {
        let awakener = Arc::new(Awakener::new().unwrap());
        let token = Token::from(::std::usize::MAX - 1);
        poller.register(&*awakener, Ops::READ, token).unwrap();

        let remote = awakener.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.wakeup().unwrap();
            remote.wakeup().unwrap();
        });

        let mut events = Events::with_capacity(8);
        let mut woken = false;
        let start = Instant::now();
        while !woken {
            assert!(start.elapsed() < Duration::from_secs(5), "{}", poller);
            poller.poll(&mut events, None).unwrap();
            woken = events.iter().any(|e| e.token() == token);
        }
        handle.join().unwrap();

        awakener.reset().unwrap();
        assert_eq!(
            poller.poll(&mut events, Some(Duration::from_millis(10))).unwrap(),
            0,
            "{}",
            poller
        );

        awakener.wakeup().unwrap();
        assert_eq!(
            poller.poll(&mut events, Some(Duration::from_secs(1))).unwrap(),
            1,
            "{}",
            poller
        );
        awakener.reset().unwrap();
    });
}

#[test]
fn timeouts_round_up_and_saturate() {
    init_log();
    assert_eq!(nexio::into_millis(Duration::from_millis(0)), 0);
    assert_eq!(nexio::into_millis(Duration::new(1, 1)), 1_001);
    assert_eq!(nexio::into_millis(Duration::new(2, 999_999_999)), 3_000);
    let huge = Duration::from_secs(::std::u64::MAX / 1_000 + 1);
    assert_eq!(nexio::into_millis(huge), ::std::u64::MAX);
    assert_eq!(nexio::into_millis(Duration::new(::std::u64::MAX, 5)), ::std::u64::MAX);
}
