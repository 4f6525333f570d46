extern crate env_logger;
extern crate nexio;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use nexio::{Addr, Client, Config, Error, Handler, Id, Reactor, Server};

fn init_log() {
    env_logger::init().ok();
}

fn loopback() -> Addr {
    "tcp://127.0.0.1:0".parse().unwrap()
}

fn dial(addr: &Addr) -> TcpStream {
    let sock = TcpStream::connect(addr.socket_addr().unwrap()).unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    sock
}

struct Echo;

impl Handler for Echo {
    fn on_read(&mut self, reactor: &mut Reactor, conn: Id, data: Vec<u8>) {
        reactor.write(conn, data).unwrap();
    }
}

/// Reports `(server, conn)` for every accepted connection.
struct Announce {
    tx: Sender<(Id, Id)>,
}

impl Handler for Announce {
    fn on_accept(&mut self, _reactor: &mut Reactor, server: Id, conn: Id, _peer: &Addr) {
        self.tx.send((server, conn)).unwrap();
    }
}

#[test]
fn spawned_echo_server() {
    init_log();
    let handle = Server::spawn(loopback(), Config::default(), Echo).unwrap();
    let mut sock = dial(handle.local_addr());
    sock.write_all(b"hello").unwrap();
    let mut buf = [0; 5];
    sock.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"hello");

    handle.stop().unwrap();
    handle.join().unwrap();
}

#[test]
fn remote_broadcast_and_close() {
    init_log();
    let (tx, rx) = mpsc::channel();
    let handle = Server::spawn(loopback(), Config::default(), Announce { tx }).unwrap();
    let mut a = dial(handle.local_addr());
    let mut b = dial(handle.local_addr());
    let (server, conn_a) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let (_, conn_b) = rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let remote = handle.remote();
    remote.broadcast(server, "news").unwrap();
    for sock in [&mut a, &mut b].iter_mut() {
        let mut buf = [0; 4];
        sock.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"news");
    }

    remote.write(conn_b, "bye").unwrap();
    remote.close(conn_b).unwrap();
    let mut rest = Vec::new();
    b.read_to_end(&mut rest).unwrap();
    assert_eq!(&rest[..], &b"bye"[..]);

    remote.close(conn_a).unwrap();
    let mut rest = Vec::new();
    a.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn dropping_handle_stops_server() {
    init_log();
    let handle = Server::spawn(loopback(), Config::default(), Echo).unwrap();
    let addr = handle.local_addr().socket_addr().unwrap();
    let remote = handle.remote();
    drop(handle);

    match remote.stop() {
        Err(Error::Disconnected) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert!(TcpStream::connect(addr).is_err());
}

#[test]
fn spawn_reports_bind_errors() {
    init_log();
    let taken = ::std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = Config::new();
    config.reuse_address(false);
    let addr = Addr::Tcp(taken.local_addr().unwrap());
    match Server::spawn(addr, config, Echo) {
        Err(e) => assert_eq!(e.io_kind(), Some(::std::io::ErrorKind::AddrInUse)),
        Ok(_) => panic!("bound twice"),
    }
}

#[test]
fn remote_after_drop() {
    init_log();
    let reactor = Reactor::new().unwrap();
    let remote = reactor.remote();
    drop(reactor);
    match remote.write(Id::from(0), "x") {
        Err(Error::Disconnected) => {}
        other => panic!("unexpected {:?}", other),
    }
}

/// Stops the loop on the first byte it reads.
struct StopOnRead {
    read: usize,
}

impl Handler for StopOnRead {
    fn on_read(&mut self, reactor: &mut Reactor, _conn: Id, data: Vec<u8>) {
        self.read += data.len();
        reactor.stop();
    }
}

#[test]
fn handler_stops_server() {
    init_log();
    let mut server = Server::bind(&loopback()).unwrap();
    let addr = server.local_addr().socket_addr().unwrap();
    let client = thread::spawn(move || {
        let mut sock = TcpStream::connect(addr).unwrap();
        sock.write_all(b"x").unwrap();
    });

    let mut handler = StopOnRead { read: 0 };
    server.run(&mut handler).unwrap();
    assert_eq!(handler.read, 1);
    assert!(server.reactor().is_stopped());
    client.join().unwrap();
}

/// Collects what the server sends until it hangs up.
#[derive(Default)]
struct Collect {
    data: Vec<u8>,
    connected: bool,
    disconnected: bool,
}

impl Handler for Collect {
    fn on_connect(&mut self, _reactor: &mut Reactor, _conn: Id, _peer: &Addr) {
        self.connected = true;
    }

    fn on_read(&mut self, _reactor: &mut Reactor, _conn: Id, data: Vec<u8>) {
        self.data.extend(data);
    }

    fn on_disconnect(&mut self, _reactor: &mut Reactor, _conn: Id, server: Option<Id>) {
        assert_eq!(server, None);
        self.disconnected = true;
    }
}

/// Greets every connection and hangs up.
struct Greet;

impl Handler for Greet {
    fn on_accept(&mut self, reactor: &mut Reactor, _server: Id, conn: Id, _peer: &Addr) {
        reactor.write(conn, "greetings").unwrap();
        reactor.close(conn).unwrap();
    }
}

#[test]
fn client_runs_until_disconnected() {
    init_log();
    let handle = Server::spawn(loopback(), Config::default(), Greet).unwrap();
    let mut client = Client::connect(handle.local_addr()).unwrap();
    assert_eq!(client.peer_addr(), handle.local_addr());
    assert!(client.is_open());

    let mut collect = Collect::default();
    client.run(&mut collect).unwrap();
    assert!(collect.connected);
    assert!(collect.disconnected);
    assert_eq!(&collect.data[..], &b"greetings"[..]);
    assert!(!client.is_open());
}

#[test]
fn client_close_flushes() {
    init_log();
    let (tx, rx) = mpsc::channel();
    let server = thread::spawn(move || {
        let listener = ::std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        tx.send(listener.local_addr().unwrap()).unwrap();
        let (mut sock, _) = listener.accept().unwrap();
        let mut data = Vec::new();
        sock.read_to_end(&mut data).unwrap();
        data
    });
    let addr: SocketAddr = rx.recv().unwrap();

    let mut client = Client::connect(&Addr::Tcp(addr)).unwrap();
    let payload = vec![7u8; 256 * 1024];
    client.write(payload.clone()).unwrap();
    client.close().unwrap();
    while client.is_open() {
        client.poll(Some(Duration::from_millis(20))).unwrap();
    }
    let mut closed = false;
    while let Some(event) = client.next_event() {
        if let nexio::NetEvent::Closed { id } = event {
            closed = id == client.id();
        }
    }
    assert!(closed);
    assert_eq!(server.join().unwrap(), payload);
}
