//! Custom Ethernet-layer request/reply tools for P4 data-plane exercises.
//!
//! `api` holds the frame codecs, the toy XOR transform, the command
//! dispatcher and the operator shell; `link` holds the raw-socket exchange.
pub mod api;
pub mod cli;
pub mod link;
pub mod utils;
