#[macro_use]
extern crate log;

extern crate env_logger;

extern crate chrono;
extern crate nexio;

use chrono::prelude::Local;

use nexio::{Addr, Handler, Id, Reactor, Server};

struct DayTime;

impl Handler for DayTime {
    fn on_accept(&mut self, reactor: &mut Reactor, _server: Id, conn: Id, peer: &Addr) {
        debug!("{} asks for the time", peer);
        let time = Local::now().to_rfc2822() + "\r\n";
        let res = reactor
            .write(conn, time.into_bytes())
            .and_then(|_| reactor.close(conn));
        if let Err(e) = res {
            error!("{}: {}", conn, e);
        }
    }
}

fn main() {
    // Initialize logger
    env_logger::init().unwrap();

    let addr: Addr = "tcp://0.0.0.0:10013".parse().unwrap();
    match Server::bind(&addr) {
        Ok(mut server) => {
            if let Err(e) = server.run(&mut DayTime) {
                error!("{}", e);
            }
        }
        Err(e) => error!("{}", e),
    }
}
