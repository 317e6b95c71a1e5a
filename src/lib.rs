pub mod cache;
pub mod common;
pub mod configs;
pub mod history;
pub mod player;
pub mod server;
pub mod transport;
pub mod upstream;
