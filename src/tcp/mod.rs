pub mod conn;
pub mod errors;
pub mod state;
pub mod tcp_flags;
pub mod tcp_header;
pub mod tcp_segment;
pub mod wrap32;
