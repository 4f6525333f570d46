extern crate env_logger;
extern crate nexio;

use std::net;
use std::time::{Duration, Instant};

use nexio::{Addr, Config, Error, Id, NetEvent, Reactor};

fn init_log() {
    env_logger::init().ok();
}

fn loopback() -> Addr {
    "tcp://127.0.0.1:0".parse().unwrap()
}

/// Polls until `done` holds for the events seen so far.
fn poll_until<F>(reactor: &mut Reactor, events: &mut Vec<NetEvent>, mut done: F)
where
    F: FnMut(&[NetEvent]) -> bool,
{
    let start = Instant::now();
    while !done(events) {
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "timed out, seen {:?}",
            events
        );
        reactor.poll(Some(Duration::from_millis(20))).unwrap();
        while let Some(event) = reactor.next_event() {
            events.push(event);
        }
    }
}

fn received(events: &[NetEvent], id: Id) -> Vec<u8> {
    let mut data = Vec::new();
    for event in events {
        if let NetEvent::Read { conn, data: ref d } = *event {
            if conn == id {
                data.extend_from_slice(d);
            }
        }
    }
    data
}

fn accepted(events: &[NetEvent]) -> Vec<Id> {
    events
        .iter()
        .filter_map(|event| match *event {
            NetEvent::Accepted { conn, .. } => Some(conn),
            _ => None,
        })
        .collect()
}

fn has_closed(events: &[NetEvent], id: Id) -> bool {
    events.iter().any(|event| match *event {
        NetEvent::Closed { id: closed } => closed == id,
        _ => false,
    })
}

fn has_disconnected(events: &[NetEvent], id: Id) -> bool {
    events.iter().any(|event| match *event {
        NetEvent::Disconnected { conn, .. } => conn == id,
        _ => false,
    })
}

#[test]
fn listen_reports_bound_port() {
    init_log();
    let mut reactor = Reactor::new().unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let local = reactor.local_addr(server).unwrap();
    assert_ne!(local.socket_addr().unwrap().port(), 0);
    match reactor.next_event() {
        Some(NetEvent::Ready { id, addr }) => {
            assert_eq!(id, server);
            assert_eq!(addr, local);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(reactor.next_event().is_none());
    assert_eq!(reactor.len(), 1);
}

#[test]
fn echo_round_trip() {
    init_log();
    let mut reactor = Reactor::new().unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let addr = reactor.local_addr(server).unwrap();
    let client = reactor.connect(&addr).unwrap();
    reactor.write(client, "hello, ").unwrap();
    reactor.write(client, &b"nexio"[..]).unwrap();
    reactor.write(client, vec![b'!']).unwrap();

    let mut events = Vec::new();
    poll_until(&mut reactor, &mut events, |events| {
        accepted(events).len() == 1 && events.iter().any(|event| match *event {
            NetEvent::Connected { conn, .. } => conn == client,
            _ => false,
        })
    });
    let conn = accepted(&events)[0];
    assert_eq!(reactor.connections(server), vec![conn]);
    assert_eq!(reactor.peer_addr(client).unwrap(), addr);

    poll_until(&mut reactor, &mut events, |events| {
        received(events, conn).len() == 13
    });
    let data = received(&events, conn);
    assert_eq!(&data[..], &b"hello, nexio!"[..]);

    reactor.write(conn, data).unwrap();
    poll_until(&mut reactor, &mut events, |events| {
        received(events, client).len() == 13
    });
    assert_eq!(&received(&events, client)[..], &b"hello, nexio!"[..]);
    assert!(events.iter().any(|event| match *event {
        NetEvent::Drained { id } => id == conn,
        _ => false,
    }));
}

#[test]
fn close_flushes_pending_data() {
    init_log();
    const LEN: usize = 4 * 1024 * 1024;

    let mut reactor = Reactor::new().unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let addr = reactor.local_addr(server).unwrap();
    let client = reactor.connect(&addr).unwrap();

    let mut events = Vec::new();
    poll_until(&mut reactor, &mut events, |events| accepted(events).len() == 1);
    let conn = accepted(&events)[0];

    let payload: Vec<u8> = (0..LEN).map(|i| (i % 251) as u8).collect();
    reactor.write(conn, payload.clone()).unwrap();
    reactor.close(conn).unwrap();
    match reactor.write(conn, "late") {
        Err(Error::Closing(id)) => assert_eq!(id, conn),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(reactor.pending(conn).unwrap(), LEN);

    poll_until(&mut reactor, &mut events, |events| {
        has_disconnected(events, client)
    });
    assert!(has_closed(&events, conn));
    assert_eq!(received(&events, client), payload);
    assert!(!reactor.contains(conn));
    assert!(!reactor.contains(client));
    assert!(reactor.connections(server).is_empty());
}

#[test]
fn peer_close_disconnects() {
    init_log();
    let mut reactor = Reactor::new().unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let addr = reactor.local_addr(server).unwrap();
    let client = reactor.connect(&addr).unwrap();

    let mut events = Vec::new();
    poll_until(&mut reactor, &mut events, |events| accepted(events).len() == 1);
    let conn = accepted(&events)[0];

    reactor.close(client).unwrap();
    assert!(!reactor.contains(client));
    poll_until(&mut reactor, &mut events, |events| has_disconnected(events, conn));
    assert!(has_closed(&events, client));
    let server_of_conn = events.iter().filter_map(|event| match *event {
        NetEvent::Disconnected { conn: c, server: s } if c == conn => Some(s),
        _ => None,
    });
    assert_eq!(server_of_conn.collect::<Vec<_>>(), vec![Some(server)]);
    assert_eq!(reactor.len(), 1);
}

#[test]
fn connect_refused() {
    init_log();
    let port = {
        let listener = net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let addr: Addr = format!("tcp://127.0.0.1:{}", port).parse().unwrap();
    let mut reactor = Reactor::new().unwrap();
    let client = match reactor.connect(&addr) {
        Ok(id) => id,
        Err(e) => {
            assert_eq!(e.io_kind(), Some(::std::io::ErrorKind::ConnectionRefused));
            return;
        }
    };

    let mut events = Vec::new();
    poll_until(&mut reactor, &mut events, |events| has_disconnected(events, client));
    match events[0] {
        NetEvent::Error { id, ref error } => {
            assert_eq!(id, client);
            assert_eq!(error.io_kind(), Some(::std::io::ErrorKind::ConnectionRefused));
        }
        ref other => panic!("unexpected {:?}", other),
    }
    match events[1] {
        NetEvent::Disconnected { conn, server } => {
            assert_eq!(conn, client);
            assert_eq!(server, None);
        }
        ref other => panic!("unexpected {:?}", other),
    }
    assert!(reactor.is_empty());
}

#[test]
fn broadcast_reaches_every_connection() {
    init_log();
    let mut reactor = Reactor::new().unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let addr = reactor.local_addr(server).unwrap();
    let clients: Vec<Id> = (0..3).map(|_| reactor.connect(&addr).unwrap()).collect();

    let mut events = Vec::new();
    poll_until(&mut reactor, &mut events, |events| accepted(events).len() == 3);
    assert_eq!(reactor.connections(server).len(), 3);
    assert_eq!(reactor.broadcast(server, "news").unwrap(), 3);

    poll_until(&mut reactor, &mut events, |events| {
        clients
            .iter()
            .all(|&client| received(events, client).len() == 4)
    });
    for &client in &clients {
        assert_eq!(&received(&events, client)[..], &b"news"[..]);
    }
}

#[test]
fn close_listener_closes_connections() {
    init_log();
    let mut reactor = Reactor::new().unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let addr = reactor.local_addr(server).unwrap();
    let clients: Vec<Id> = (0..2).map(|_| reactor.connect(&addr).unwrap()).collect();

    let mut events = Vec::new();
    poll_until(&mut reactor, &mut events, |events| accepted(events).len() == 2);
    let conns = accepted(&events);
    reactor.close(server).unwrap();
    assert!(!reactor.contains(server));
    while let Some(event) = reactor.next_event() {
        events.push(event);
    }
    for &conn in &conns {
        assert!(has_closed(&events, conn));
    }
    assert!(has_closed(&events, server));

    poll_until(&mut reactor, &mut events, |events| {
        clients.iter().all(|&client| has_disconnected(events, client))
    });
    assert!(reactor.is_empty());
}

#[test]
fn max_connections_drops_extra() {
    init_log();
    let mut config = Config::new();
    config.max_connections(Some(1)).nodelay(true);
    let mut reactor = Reactor::with_config(config).unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let addr = reactor.local_addr(server).unwrap();
    let first = reactor.connect(&addr).unwrap();

    let mut events = Vec::new();
    poll_until(&mut reactor, &mut events, |events| accepted(events).len() == 1);
    let second = reactor.connect(&addr).unwrap();
    poll_until(&mut reactor, &mut events, |events| has_disconnected(events, second));
    assert_eq!(accepted(&events).len(), 1);
    assert!(reactor.contains(first));
    assert_eq!(reactor.connections(server).len(), 1);
}

#[test]
fn unknown_and_unsupported() {
    init_log();
    let mut reactor = Reactor::new().unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let unknown = Id::from(42);

    match reactor.write(unknown, "x") {
        Err(Error::UnknownSocket(id)) => assert_eq!(id, unknown),
        other => panic!("unexpected {:?}", other),
    }
    match reactor.close(unknown) {
        Err(Error::UnknownSocket(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
    match reactor.write(server, "x") {
        Err(Error::Unsupported(id, _)) => assert_eq!(id, server),
        other => panic!("unexpected {:?}", other),
    }
    match reactor.send_to(server, "127.0.0.1:9".parse().unwrap(), "x") {
        Err(Error::Unsupported(..)) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert!(reactor.peer_addr(server).is_err());
    assert!(reactor.connections(unknown).is_empty());
}

#[test]
fn every_poller_serves_connections() {
    init_log();
    for &kind in nexio::nio::PollerKind::available() {
        let mut config = Config::new();
        config.poller(kind);
        let mut reactor = Reactor::with_config(config).unwrap();
        assert_eq!(reactor.poller().kind(), kind);
        let server = reactor.listen(&loopback()).unwrap();
        let addr = reactor.local_addr(server).unwrap();
        let client = reactor.connect(&addr).unwrap();
        reactor.write(client, "ping").unwrap();

        let mut events = Vec::new();
        poll_until(&mut reactor, &mut events, |events| accepted(events).len() == 1);
        let conn = accepted(&events)[0];
        poll_until(&mut reactor, &mut events, |events| received(events, conn).len() == 4);

        assert!(
            events.iter().any(|event| match *event {
                NetEvent::Connected { .. } => event.id() == client,
                _ => false,
            }),
            "{}: {:?}",
            kind,
            events
        );
    }
}

#[test]
fn close_while_connecting_flushes() {
    init_log();
    let mut reactor = Reactor::new().unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let addr = reactor.local_addr(server).unwrap();
    let client = reactor.connect(&addr).unwrap();
    reactor.write(client, "hello").unwrap();
    reactor.close(client).unwrap();
    assert!(reactor.contains(client));
    assert_eq!(reactor.pending(client).unwrap(), 5);
    match reactor.write(client, "late") {
        Err(Error::Closing(id)) => assert_eq!(id, client),
        other => panic!("unexpected {:?}", other),
    }

    let mut events = Vec::new();
    poll_until(&mut reactor, &mut events, |events| {
        accepted(events).len() == 1 && has_closed(events, client)
    });
    let conn = accepted(&events)[0];
    poll_until(&mut reactor, &mut events, |events| has_disconnected(events, conn));
    assert_eq!(&received(&events, conn)[..], &b"hello"[..]);
    assert!(!has_disconnected(&events, client));
    assert!(!reactor.contains(client));
}

#[test]
fn closing_connection_forgets_closed_listener() {
    init_log();
    const LEN: usize = 32 * 1024 * 1024;

    let mut reactor = Reactor::new().unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let addr = reactor.local_addr(server).unwrap();
    let peer = net::TcpStream::connect(addr.socket_addr().unwrap()).unwrap();

    let mut events = Vec::new();
    poll_until(&mut reactor, &mut events, |events| accepted(events).len() == 1);
    let conn = accepted(&events)[0];
    reactor.write(conn, vec![0; LEN]).unwrap();
    reactor.close(server).unwrap();
    assert!(!reactor.contains(server));
    assert!(reactor.contains(conn));

    // the listener's id is handed out again
    let other = reactor.listen(&loopback()).unwrap();
    assert_eq!(other, server);
    assert!(reactor.connections(other).is_empty());

    drop(peer);
    let start = Instant::now();
    while reactor.contains(conn) {
        assert!(start.elapsed() < Duration::from_secs(5), "{:?}", events);
        reactor.poll(Some(Duration::from_millis(20))).unwrap();
        while let Some(event) = reactor.next_event() {
            events.push(event);
        }
    }
    for event in &events {
        if let NetEvent::Disconnected { conn: c, server: s } = *event {
            if c == conn {
                assert_eq!(s, None);
            }
        }
    }
    assert_eq!(reactor.len(), 1);
}

#[test]
fn write_after_drain_rearms_writer() {
    init_log();
    let mut reactor = Reactor::new().unwrap();
    let server = reactor.listen(&loopback()).unwrap();
    let addr = reactor.local_addr(server).unwrap();
    let client = reactor.connect(&addr).unwrap();

    let mut events = Vec::new();
    poll_until(&mut reactor, &mut events, |events| accepted(events).len() == 1);
    let conn = accepted(&events)[0];
    for (round, msg) in ["one", "two", "three"].iter().enumerate() {
        reactor.write(conn, *msg).unwrap();
        reactor.write(conn, "").unwrap();
        assert_eq!(reactor.pending(conn).unwrap(), msg.len());
        let drained = |events: &[NetEvent]| {
            events
                .iter()
                .filter(|event| match **event {
                    NetEvent::Drained { id } => id == conn,
                    _ => false,
                })
                .count()
        };
        poll_until(&mut reactor, &mut events, |events| drained(events) == round + 1);
        assert_eq!(reactor.pending(conn).unwrap(), 0);
    }
    poll_until(&mut reactor, &mut events, |events| {
        received(events, client).len() == 11
    });
    assert_eq!(&received(&events, client)[..], &b"onetwothree"[..]);
}
