pub mod draw;
pub mod runtime;
pub mod server;
pub mod session;
pub mod sink;
