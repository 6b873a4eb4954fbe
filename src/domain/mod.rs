pub mod document;
pub mod payment;
pub mod ports;
pub mod resolved;
