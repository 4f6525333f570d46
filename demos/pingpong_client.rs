extern crate structopt;
#[macro_use]
extern crate structopt_derive;

extern crate env_logger;
#[macro_use]
extern crate log;

extern crate chrono;
extern crate nexio;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use chrono::prelude::Utc;
use env_logger::LogBuilder;
use structopt::StructOpt;

use nexio::{Addr, Config, Handler, Id, Reactor};

#[derive(StructOpt, Debug)]
#[structopt(name = "pingpong_client", about = "Ping-pong client.")]
struct Conf {
    #[structopt(short = "b", long = "bytes", help = "Number of bytes to send",
                default_value = "16384")]
    bytes: usize,

    #[structopt(short = "c", long = "connections", help = "Concurrent connections",
                default_value = "25")]
    conns: usize,

    #[structopt(short = "s", long = "seconds", help = "Seconds to run", default_value = "60")]
    secs: usize,

    #[structopt(short = "p", long = "poller", help = "epoll, kqueue, poll or select")]
    poller: Option<String>,

    #[structopt(help = "Server IP to connect to", default_value = "127.0.0.1")]
    host: Option<IpAddr>,

    #[structopt(help = "Server port to connect to", default_value = "10007")] port: Option<u16>,
}

struct PingPong {
    len: usize,
    connecting: usize,
    msgs: usize,
    bytes: usize,
}

impl Handler for PingPong {
    fn on_connect(&mut self, reactor: &mut Reactor, conn: Id, _peer: &Addr) {
        self.connecting -= 1;
        if self.connecting == 0 {
            info!("All connections are established");
        }
        if let Err(e) = reactor.write(conn, vec![0; self.len]) {
            error!("{}: {}", conn, e);
        }
    }

    fn on_read(&mut self, reactor: &mut Reactor, conn: Id, data: Vec<u8>) {
        self.msgs += 1;
        self.bytes += data.len();
        if let Err(e) = reactor.write(conn, data) {
            error!("{}: {}", conn, e);
        }
    }
}

fn run(conf: &Conf) -> nexio::Result<()> {
    info!("Start - {:?}", conf);
    let addr = Addr::Tcp(SocketAddr::new(
        conf.host.unwrap_or_else(|| IpAddr::from([127, 0, 0, 1])),
        conf.port.unwrap_or(10007),
    ));
    let mut config = Config::new();
    config.nodelay(true);
    if let Some(ref name) = conf.poller {
        let kind = nexio::nio::PollerKind::available()
            .iter()
            .find(|kind| kind.to_string() == *name)
            .cloned();
        match kind {
            Some(kind) => {
                config.poller(kind);
            }
            None => warn!("Poller {} is not available, using the default", name),
        }
    }
    let mut reactor = Reactor::with_config(config)?;
    for _ in 0..conf.conns {
        reactor.connect(&addr)?;
    }
    let mut ping_pong = PingPong {
        len: conf.bytes,
        connecting: conf.conns,
        msgs: 0,
        bytes: 0,
    };
    let deadline = Instant::now() + Duration::from_secs(conf.secs as u64);
    while Instant::now() < deadline && !reactor.is_empty() {
        reactor.poll(Some(Duration::from_millis(100)))?;
        while let Some(event) = reactor.next_event() {
            ping_pong.on_event(&mut reactor, event);
        }
    }
    info!("Total bytes read: {}", ping_pong.bytes);
    info!("Total messages read: {}", ping_pong.msgs);
    info!(
        "Average message size: {}",
        ping_pong.bytes as f64 / ping_pong.msgs as f64
    );
    info!(
        "Throughput: {} MiB/s",
        ping_pong.bytes as f64 / (conf.secs * 1024 * 1024) as f64
    );
    Ok(())
}

fn main() {
    let conf = Conf::from_args();

    let mut builder = LogBuilder::new();
    builder.format(|r| {
        format!(
            "{} {:<5} {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S.%f"),
            r.level(),
            r.args()
        )
    });
    if let Ok(v) = env::var("RUST_LOG") {
        builder.parse(&v);
    }
    builder.init().unwrap();

    if let Err(e) = run(&conf) {
        error!("{}", e);
    }
}
