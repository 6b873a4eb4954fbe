//! Adapters behind the domain ports: in-memory stores for tests and the
//! offline CLI, plus logging-backed audit and dispatch collaborators.

pub mod audit;
pub mod dispatcher;
pub mod in_memory;
