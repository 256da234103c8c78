//! External dependency boundaries.

pub mod ports;
