//! Core traits at the network seam.

mod transport;

pub use transport::Transport;
