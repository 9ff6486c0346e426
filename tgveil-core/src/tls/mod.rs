mod client_hello;

pub use client_hello::{is_client_hello, parse_sni};
