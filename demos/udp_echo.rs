#[macro_use]
extern crate log;
extern crate env_logger;

extern crate nexio;

use std::net::SocketAddr;

use nexio::{Addr, Handler, Id, Reactor, Server};

struct UdpEcho;

impl Handler for UdpEcho {
    fn on_ready(&mut self, _reactor: &mut Reactor, _id: Id, addr: &Addr) {
        info!("UDP echo server bound to {}", addr);
    }

    fn on_read_from(&mut self, reactor: &mut Reactor, id: Id, peer: SocketAddr, data: Vec<u8>) {
        if let Err(e) = reactor.send_to(id, peer, data) {
            error!("{} -> {}: {}", id, peer, e);
        }
    }
}

fn main() {
    // Initialize logger
    env_logger::init().unwrap();

    let addr: Addr = "udp://0.0.0.0:10007".parse().unwrap();
    match Server::bind(&addr) {
        Ok(mut server) => {
            if let Err(e) = server.run(&mut UdpEcho) {
                error!("{}", e);
            }
        }
        Err(e) => error!("{}", e),
    }
}
