//! API surface shared across features

pub mod response;
