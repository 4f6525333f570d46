//! Client and server wrappers over a `Reactor`.

mod handler;
pub use self::handler::Handler;

mod client;
pub use self::client::Client;

mod server;
pub use self::server::{Server, ServerHandle};
