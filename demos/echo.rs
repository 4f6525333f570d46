#[macro_use]
extern crate log;
extern crate env_logger;

extern crate nexio;

use nexio::{Addr, Handler, Id, Reactor, Server};

struct Echo;

impl Handler for Echo {
    fn on_ready(&mut self, _reactor: &mut Reactor, _id: Id, addr: &Addr) {
        info!("Echo server listening on {}", addr);
    }

    fn on_read(&mut self, reactor: &mut Reactor, conn: Id, data: Vec<u8>) {
        // Send whatever received back to client
        if let Err(e) = reactor.write(conn, data) {
            error!("{}: {}", conn, e);
        }
    }
}

fn main() {
    // Initialize logger
    env_logger::init().unwrap();

    let addr: Addr = "tcp://0.0.0.0:10007".parse().unwrap();
    let mut config = nexio::Config::new();
    config.nodelay(true);
    match Server::with_config(&addr, config) {
        Ok(mut server) => {
            if let Err(e) = server.run(&mut Echo) {
                error!("{}", e);
            }
        }
        Err(e) => error!("{}", e),
    }
}
