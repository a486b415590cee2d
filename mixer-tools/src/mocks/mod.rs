pub mod serial_port;
pub mod transport;
