pub mod ip_flags;
pub mod ip_header;
