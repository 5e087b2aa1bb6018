//! Port traits decoupling the domain from I/O concerns.

pub mod data_port;
