//! Application services: the document state resolver, the payment ledger
//! reconciler, and the manual payment verification state machine with its
//! side-effect outbox worker.

pub mod outbox;
pub mod reconciler;
pub mod resolver;
pub mod verification;
