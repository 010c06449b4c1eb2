pub mod macros;
pub mod protocol;

pub use protocol::{ControlCommand, DrawCode, ProtocolError, SOCKET_PATH};
