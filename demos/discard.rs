extern crate env_logger;
#[macro_use]
extern crate log;

extern crate nexio;

use std::collections::HashMap;

use nexio::{Addr, Handler, Id, Reactor, Server};

#[derive(Default)]
struct Discard {
    received: HashMap<Id, usize>,
}

impl Handler for Discard {
    fn on_read(&mut self, _reactor: &mut Reactor, conn: Id, data: Vec<u8>) {
        *self.received.entry(conn).or_insert(0) += data.len();
    }

    fn on_disconnect(&mut self, _reactor: &mut Reactor, conn: Id, _server: Option<Id>) {
        let n = self.received.remove(&conn).unwrap_or(0);
        debug!("{} discarded {} bytes", conn, n);
    }
}

fn main() {
    // Initialize logger
    env_logger::init().unwrap();

    let addr: Addr = "tcp://0.0.0.0:10009".parse().unwrap();
    match Server::bind(&addr) {
        Ok(mut server) => {
            if let Err(e) = server.run(&mut Discard::default()) {
                error!("{}", e);
            }
        }
        Err(e) => error!("{}", e),
    }
}
