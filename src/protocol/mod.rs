//! Gateway wire formats.

pub mod gateway_error;
